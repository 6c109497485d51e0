// libs/scheduling-cell/src/services/engine.rs

use chrono::{NaiveDate, Timelike};
use tracing::{debug, info, warn};

use shared_config::CalendarConfig;
use shared_models::{Appointment, AppointmentRequest, ScheduledAppointment, Slot};

use crate::error::SchedulingError;
use crate::models::{AssignmentOutcome, SlotSource};
use crate::services::calendar::CalendarState;
use crate::services::horizon::ScanHorizon;

/// Hours new patients may be booked into, when the restriction is switched on.
#[derive(Debug, Clone)]
struct NewPatientRule {
    enabled: bool,
    hours: Vec<u32>,
}

impl NewPatientRule {
    fn allows(&self, is_new: bool, slot: &Slot) -> bool {
        !self.enabled || !is_new || self.hours.contains(&slot.timestamp().hour())
    }
}

/// Places one request at a time into the calendar it owns.
#[derive(Debug)]
pub struct AssignmentEngine {
    calendar: CalendarState,
    horizon: ScanHorizon,
    new_patient_rule: NewPatientRule,
}

impl AssignmentEngine {
    pub fn new(config: &CalendarConfig) -> Result<Self, SchedulingError> {
        config.validate()?;

        Ok(Self {
            calendar: CalendarState::new(config),
            horizon: ScanHorizon::new(config),
            new_patient_rule: NewPatientRule {
                enabled: config.restrict_new_patient_hours,
                hours: config.new_patient_hours.clone(),
            },
        })
    }

    pub fn seed(&mut self, snapshot: &[ScheduledAppointment]) -> usize {
        self.calendar.seed(snapshot)
    }

    pub fn calendar(&self) -> &CalendarState {
        &self.calendar
    }

    pub fn horizon(&self) -> &ScanHorizon {
        &self.horizon
    }

    /// Tries the preferred days in the order given, then scans forward from the
    /// season anchor. Exactly one doctor is booked per accepted request.
    pub fn assign(&mut self, request: &AppointmentRequest) -> AssignmentOutcome {
        debug!(
            "Assigning request {} for person {} ({} preferred days)",
            request.request_id,
            request.person_id,
            request.preferred_days.len()
        );

        for (index, day) in request.preferred_days.iter().enumerate() {
            let slot = match self.resolve_preferred_day(day) {
                Ok(slot) => slot,
                Err(e) => {
                    warn!("Skipping preferred day for request {}: {}", request.request_id, e);
                    continue;
                }
            };

            if let Some(appointment) =
                Self::try_day(&mut self.calendar, &self.new_patient_rule, slot, request)
            {
                info!(
                    "Request {} booked on preferred day {} with doctor {}",
                    request.request_id, appointment.slot, appointment.doctor_id
                );
                return AssignmentOutcome::Assigned {
                    appointment,
                    source: SlotSource::PreferredDay(index),
                };
            }
        }

        self.forward_scan(request)
    }

    /// A full timestamp is taken as the exact slot; a bare `YYYY-MM-DD` means that day's opening hour.
    pub fn resolve_preferred_day(&self, raw: &str) -> Result<Slot, SchedulingError> {
        let slot = match Slot::parse(raw) {
            Ok(slot) => slot,
            Err(err) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                Ok(date) => Slot::on_day(date, self.horizon.opening_hour())?,
                Err(_) => return Err(err.into()),
            },
        };
        Ok(slot)
    }

    fn forward_scan(&mut self, request: &AppointmentRequest) -> AssignmentOutcome {
        for slot in self.horizon.candidates() {
            if let Some(appointment) =
                Self::try_day(&mut self.calendar, &self.new_patient_rule, slot, request)
            {
                info!(
                    "Request {} booked by forward scan on {} with doctor {}",
                    request.request_id, appointment.slot, appointment.doctor_id
                );
                return AssignmentOutcome::Assigned {
                    appointment,
                    source: SlotSource::ForwardScan,
                };
            }
        }

        warn!(
            "No available appointments for request {} before {}",
            request.request_id,
            self.horizon.horizon_end()
        );
        AssignmentOutcome::Dropped {
            request_id: request.request_id,
        }
    }

    fn try_day(
        calendar: &mut CalendarState,
        new_patient_rule: &NewPatientRule,
        slot: Slot,
        request: &AppointmentRequest,
    ) -> Option<Appointment> {
        if !new_patient_rule.allows(request.is_new, &slot) {
            debug!("Slot {} is outside new patient hours", slot);
            return None;
        }
        if !calendar.is_slot_open_for(&slot) {
            debug!("Slot {} is full", slot);
            return None;
        }
        if !calendar.satisfies_spacing(request.person_id, &slot) {
            debug!("Slot {} is too close to another visit of person {}", slot, request.person_id);
            return None;
        }

        let doctor_id = calendar.next_free_doctor(&slot)?;
        calendar.commit(doctor_id, request.person_id, slot);

        Some(Appointment {
            doctor_id,
            person_id: request.person_id,
            slot,
            is_new_patient: request.is_new,
            request_id: request.request_id,
        })
    }
}
