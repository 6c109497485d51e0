// libs/scheduling-cell/src/services/calendar.rs

use std::collections::{BTreeSet, HashMap};

use chrono::Duration;
use tracing::debug;

use shared_config::{CalendarConfig, MAX_SPACING_DAYS};
use shared_models::{DoctorId, PersonId, ScheduledAppointment, Slot};

/// Who is booked where. Only grows: seeded once, then extended by `commit`.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarState {
    slot_doctors: HashMap<Slot, BTreeSet<DoctorId>>,
    person_slots: HashMap<PersonId, Vec<Slot>>,
    max_doctors_per_slot: u32,
    min_spacing: Duration,
}

impl CalendarState {
    /// Spacing is clamped to `0..=MAX_SPACING_DAYS` so an unvalidated config cannot overflow.
    pub fn new(config: &CalendarConfig) -> Self {
        Self {
            slot_doctors: HashMap::new(),
            person_slots: HashMap::new(),
            max_doctors_per_slot: config.max_doctors_per_slot,
            min_spacing: Duration::days(config.min_spacing_days.clamp(0, MAX_SPACING_DAYS)),
        }
    }

    /// Loads a trusted snapshot without re-checking capacity or spacing.
    /// Entries already present are not duplicated, so seeding twice equals seeding once.
    pub fn seed<'a, I>(&mut self, existing: I) -> usize
    where
        I: IntoIterator<Item = &'a ScheduledAppointment>,
    {
        let mut loaded = 0;
        for appointment in existing {
            let doctors = self.slot_doctors.entry(appointment.slot).or_default();
            if doctors.insert(appointment.doctor_id) {
                loaded += 1;
            }

            let slots = self.person_slots.entry(appointment.person_id).or_default();
            if !slots.contains(&appointment.slot) {
                slots.push(appointment.slot);
            }
        }

        debug!("Seeded {} bookings across {} slots", loaded, self.slot_doctors.len());
        loaded
    }

    pub fn is_slot_open_for(&self, slot: &Slot) -> bool {
        self.doctor_count(slot) < self.max_doctors_per_slot as usize
    }

    /// True when every slot the person already holds is at least the minimum spacing away.
    pub fn satisfies_spacing(&self, person_id: PersonId, slot: &Slot) -> bool {
        self.person_slots.get(&person_id).map_or(true, |booked| {
            booked.iter().all(|existing| {
                (existing.timestamp() - slot.timestamp()).abs() >= self.min_spacing
            })
        })
    }

    /// Lowest doctor id not yet booked in the slot.
    pub fn next_free_doctor(&self, slot: &Slot) -> Option<DoctorId> {
        let booked = self.slot_doctors.get(slot);
        (1..=self.max_doctors_per_slot)
            .find(|doctor_id| booked.map_or(true, |doctors| !doctors.contains(doctor_id)))
    }

    /// Records a booking. Callers must have checked capacity and spacing first.
    pub fn commit(&mut self, doctor_id: DoctorId, person_id: PersonId, slot: Slot) {
        self.slot_doctors.entry(slot).or_default().insert(doctor_id);
        self.person_slots.entry(person_id).or_default().push(slot);
    }

    pub fn is_known(&self, slot: &Slot) -> bool {
        self.slot_doctors.contains_key(slot)
    }

    pub fn doctor_count(&self, slot: &Slot) -> usize {
        self.slot_doctors.get(slot).map_or(0, BTreeSet::len)
    }

    pub fn slots_for(&self, person_id: PersonId) -> &[Slot] {
        self.person_slots.get(&person_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn booking_count(&self) -> usize {
        self.slot_doctors.values().map(BTreeSet::len).sum()
    }
}
