// libs/scheduling-cell/tests/engine_test.rs

use std::collections::HashMap;

use assert_matches::assert_matches;
use chrono::{Datelike, Duration, NaiveDate, Timelike, Weekday};

use scheduling_cell::{AssignmentEngine, AssignmentOutcome, SchedulingError, SlotSource};
use shared_config::{CalendarConfig, ConfigError};
use shared_models::{Appointment, ScheduledAppointment, Slot};
use shared_utils::test_utils::{request, scheduled, slot, TestConfig};

fn engine() -> AssignmentEngine {
    AssignmentEngine::new(&CalendarConfig::default()).unwrap()
}

fn engine_with(snapshot: &[ScheduledAppointment]) -> AssignmentEngine {
    let mut engine = engine();
    engine.seed(snapshot);
    engine
}

fn assigned(outcome: AssignmentOutcome) -> (Appointment, SlotSource) {
    match outcome {
        AssignmentOutcome::Assigned { appointment, source } => (appointment, source),
        other => panic!("expected an assignment, got {:?}", other),
    }
}

// ==============================================================================
// SCENARIOS
// ==============================================================================

#[test]
fn test_empty_schedule_books_season_anchor_with_doctor_one() {
    let mut engine = engine();

    let (appointment, source) = assigned(engine.assign(&request(1, 100, false, &[])));

    assert_eq!(source, SlotSource::ForwardScan);
    assert_eq!(appointment.slot, slot("2021-11-01T08:00:00Z"));
    assert_eq!(appointment.doctor_id, 1);
    assert_eq!(appointment.person_id, 100);
    assert_eq!(appointment.request_id, 1);
    assert!(!appointment.is_new_patient);
}

#[test]
fn test_preferred_slot_with_two_doctors_gets_the_third() {
    let mut engine = engine_with(&[
        scheduled(1, 10, "2021-11-01T08:00:00Z"),
        scheduled(2, 11, "2021-11-01T08:00:00Z"),
    ]);

    let (appointment, source) =
        assigned(engine.assign(&request(2, 300, false, &["2021-11-01T08:00:00Z"])));

    assert_eq!(source, SlotSource::PreferredDay(0));
    assert_eq!(appointment.doctor_id, 3);

    let at = slot("2021-11-01T08:00:00Z");
    assert_eq!(engine.calendar().doctor_count(&at), 3);
    assert!(!engine.calendar().is_slot_open_for(&at));
}

#[test]
fn test_full_preferred_slot_falls_through_to_next_hour() {
    let mut engine = engine_with(&[
        scheduled(1, 10, "2021-11-01T08:00:00Z"),
        scheduled(2, 11, "2021-11-01T08:00:00Z"),
        scheduled(3, 12, "2021-11-01T08:00:00Z"),
    ]);

    let (appointment, source) =
        assigned(engine.assign(&request(3, 300, false, &["2021-11-01T08:00:00Z"])));

    assert_eq!(source, SlotSource::ForwardScan);
    assert_eq!(appointment.slot, slot("2021-11-01T09:00:00Z"));
    assert_eq!(appointment.doctor_id, 1);
    assert_eq!(engine.calendar().doctor_count(&slot("2021-11-01T08:00:00Z")), 3);
}

#[test]
fn test_preferred_day_too_close_to_prior_visit_is_rejected() {
    let mut engine = engine_with(&[scheduled(1, 100, "2021-11-01T08:00:00Z")]);

    let (appointment, source) =
        assigned(engine.assign(&request(4, 100, false, &["2021-11-05T08:00:00Z"])));

    assert_eq!(source, SlotSource::ForwardScan);
    assert_eq!(appointment.slot, slot("2021-11-08T08:00:00Z"));
    assert!(!engine.calendar().is_known(&slot("2021-11-05T08:00:00Z")));
}

#[test]
fn test_calendar_day_preference_resolves_to_opening_hour() {
    let mut engine = engine_with(&[scheduled(1, 100, "2021-11-01T08:00:00Z")]);

    let (appointment, source) = assigned(engine.assign(&request(5, 100, false, &["2021-11-15"])));

    assert_eq!(source, SlotSource::PreferredDay(0));
    assert_eq!(appointment.slot, slot("2021-11-15T08:00:00Z"));
}

#[test]
fn test_exactly_seven_days_apart_is_allowed() {
    let mut engine = engine_with(&[scheduled(1, 100, "2021-11-01T08:00:00Z")]);

    let (appointment, source) =
        assigned(engine.assign(&request(6, 100, false, &["2021-11-08T08:00:00+00:00"])));

    assert_eq!(source, SlotSource::PreferredDay(0));
    assert_eq!(appointment.slot, slot("2021-11-08T08:00:00Z"));
}

#[test]
fn test_millisecond_short_of_a_week_is_rejected() {
    let mut engine = engine_with(&[scheduled(1, 100, "2021-11-01T08:00:00Z")]);

    let (_, source) =
        assigned(engine.assign(&request(7, 100, false, &["2021-11-08T07:59:59.999Z"])));

    assert_eq!(source, SlotSource::ForwardScan);
}

// ==============================================================================
// PREFERENCES
// ==============================================================================

#[test]
fn test_first_valid_preference_wins_and_later_ones_are_untouched() {
    let mut engine = engine();

    let (appointment, source) = assigned(engine.assign(&request(
        8,
        100,
        false,
        &["2021-11-10T10:00:00Z", "2021-11-20T10:00:00Z"],
    )));

    assert_eq!(source, SlotSource::PreferredDay(0));
    assert_eq!(appointment.slot, slot("2021-11-10T10:00:00Z"));
    assert!(!engine.calendar().is_known(&slot("2021-11-20T10:00:00Z")));
}

#[test]
fn test_second_preference_used_when_first_is_full() {
    let mut engine = engine_with(&[
        scheduled(1, 10, "2021-11-10T10:00:00Z"),
        scheduled(2, 11, "2021-11-10T10:00:00Z"),
        scheduled(3, 12, "2021-11-10T10:00:00Z"),
    ]);

    let (appointment, source) = assigned(engine.assign(&request(
        9,
        100,
        false,
        &["2021-11-10T10:00:00Z", "2021-11-20T10:00:00Z"],
    )));

    assert_eq!(source, SlotSource::PreferredDay(1));
    assert_eq!(appointment.slot, slot("2021-11-20T10:00:00Z"));
}

#[test]
fn test_unparseable_preference_is_skipped() {
    let mut engine = engine();

    let (appointment, source) = assigned(engine.assign(&request(
        10,
        100,
        false,
        &["sometime next week", "2021-11-12T11:00:00Z"],
    )));

    assert_eq!(source, SlotSource::PreferredDay(1));
    assert_eq!(appointment.slot, slot("2021-11-12T11:00:00Z"));
}

#[test]
fn test_resolve_preferred_day_reports_bad_input() {
    let engine = engine();

    assert_matches!(
        engine.resolve_preferred_day("2021-13-45"),
        Err(ref e @ SchedulingError::InvalidDay(_)) if !e.is_fatal()
    );
    assert_eq!(
        engine.resolve_preferred_day("2021-11-12").unwrap(),
        slot("2021-11-12T08:00:00Z")
    );
}

// ==============================================================================
// BOOKING RULES
// ==============================================================================

#[test]
fn test_one_request_books_exactly_one_doctor() {
    let mut engine = engine_with(&[scheduled(1, 10, "2021-11-02T09:00:00Z")]);

    let (appointment, _) =
        assigned(engine.assign(&request(11, 100, false, &["2021-11-02T09:00:00Z"])));

    let at = slot("2021-11-02T09:00:00Z");
    assert_eq!(appointment.doctor_id, 2);
    assert_eq!(engine.calendar().doctor_count(&at), 2);
    assert_eq!(engine.calendar().next_free_doctor(&at), Some(3));
    assert_eq!(engine.calendar().slots_for(100), &[at]);
}

#[test]
fn test_new_patient_restriction_is_off_by_default() {
    let mut engine = engine();

    let (appointment, _) = assigned(engine.assign(&request(12, 100, true, &[])));

    assert!(appointment.is_new_patient);
    assert_eq!(appointment.slot, slot("2021-11-01T08:00:00Z"));
}

#[test]
fn test_new_patient_restriction_when_enabled() {
    let config = CalendarConfig {
        restrict_new_patient_hours: true,
        ..CalendarConfig::default()
    };
    let mut engine = AssignmentEngine::new(&config).unwrap();

    let (new_patient, _) = assigned(engine.assign(&request(13, 100, true, &["2021-11-01T09:00:00Z"])));
    let (returning, _) = assigned(engine.assign(&request(14, 200, false, &[])));

    assert_eq!(new_patient.slot, slot("2021-11-01T15:00:00Z"));
    assert_eq!(returning.slot, slot("2021-11-01T08:00:00Z"));
}

#[test]
fn test_invalid_calendar_config_is_rejected() {
    let config = CalendarConfig {
        max_doctors_per_slot: 0,
        ..CalendarConfig::default()
    };

    assert_matches!(AssignmentEngine::new(&config), Err(SchedulingError::Config(_)));
}

#[test]
fn test_spacing_outside_allowed_range_is_rejected() {
    for days in [-1, i64::MAX] {
        let config = CalendarConfig {
            min_spacing_days: days,
            ..CalendarConfig::default()
        };

        assert_matches!(
            AssignmentEngine::new(&config),
            Err(SchedulingError::Config(ConfigError::SpacingOutOfRange(d))) if d == days
        );
    }
}

// ==============================================================================
// HORIZON
// ==============================================================================

#[test]
fn test_request_blocked_everywhere_by_capacity_is_dropped() {
    let mut engine = engine();
    let full: Vec<ScheduledAppointment> = engine
        .horizon()
        .candidates()
        .flat_map(|at| {
            (1..=3).map(move |doctor_id| ScheduledAppointment {
                doctor_id,
                person_id: 1,
                slot: at,
                is_new_patient: false,
            })
        })
        .collect();
    engine.seed(&full);

    let outcome = engine.assign(&request(15, 100, false, &[]));

    assert_matches!(outcome, AssignmentOutcome::Dropped { request_id: 15 });
    assert!(engine.calendar().slots_for(100).is_empty());
}

#[test]
fn test_request_blocked_everywhere_by_spacing_is_dropped() {
    let config = TestConfig::default().with_season(
        NaiveDate::from_ymd_opt(2021, 11, 1).unwrap(),
        NaiveDate::from_ymd_opt(2021, 11, 30).unwrap(),
    );
    let mut engine = AssignmentEngine::new(&config.calendar).unwrap();
    engine.seed(&[
        scheduled(1, 100, "2021-11-01T08:00:00Z"),
        scheduled(1, 100, "2021-11-08T08:00:00Z"),
        scheduled(1, 100, "2021-11-15T08:00:00Z"),
        scheduled(1, 100, "2021-11-22T08:00:00Z"),
        scheduled(1, 100, "2021-11-29T08:00:00Z"),
    ]);

    let outcome = engine.assign(&request(16, 100, false, &[]));

    assert_matches!(outcome, AssignmentOutcome::Dropped { request_id: 16 });
    assert_eq!(engine.calendar().slots_for(100).len(), 5);
}

// ==============================================================================
// INVARIANTS OVER A BUSY RUN
// ==============================================================================

#[test]
fn test_invariants_hold_over_many_requests() {
    let mut engine = engine_with(&[
        scheduled(1, 0, "2021-11-03T10:00:00Z"),
        scheduled(2, 1, "2021-11-03T10:00:00Z"),
    ]);
    let mut booked: Vec<Appointment> = Vec::new();

    for request_id in 0..400 {
        let person_id = request_id % 50;
        let preferred: &[&str] = if request_id % 3 == 0 {
            &["2021-11-03T10:00:00Z"]
        } else {
            &[]
        };

        if let AssignmentOutcome::Assigned { appointment, source } =
            engine.assign(&request(request_id, person_id, false, preferred))
        {
            if source == SlotSource::ForwardScan {
                let weekday = appointment.slot.timestamp().weekday();
                assert!(!matches!(weekday, Weekday::Sat | Weekday::Sun));
                assert!(appointment.slot.timestamp().hour() < 16);
            }
            booked.push(appointment);
        }
    }

    assert!(!booked.is_empty());

    let mut per_slot: HashMap<Slot, Vec<u32>> = HashMap::new();
    let mut per_person: HashMap<i64, Vec<Slot>> = HashMap::new();
    for appointment in &booked {
        per_slot.entry(appointment.slot).or_default().push(appointment.doctor_id);
        per_person.entry(appointment.person_id).or_default().push(appointment.slot);
    }

    for (at, doctors) in &per_slot {
        assert!(engine.calendar().doctor_count(at) <= 3);
        let mut unique = doctors.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), doctors.len(), "doctor double-booked at {}", at);
    }

    for person in per_person.keys() {
        let slots = engine.calendar().slots_for(*person);
        for (i, a) in slots.iter().enumerate() {
            for b in &slots[i + 1..] {
                assert!(
                    (a.timestamp() - b.timestamp()).abs() >= Duration::days(7),
                    "person {} booked {} and {}",
                    person,
                    a,
                    b
                );
            }
        }
    }
}
