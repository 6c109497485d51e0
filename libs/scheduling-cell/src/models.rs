// libs/scheduling-cell/src/models.rs
use serde::{Deserialize, Serialize};

use shared_models::{Appointment, RequestId};

/// Where an accepted slot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    /// Index into the request's preferred days.
    PreferredDay(usize),
    ForwardScan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentOutcome {
    Assigned {
        appointment: Appointment,
        source: SlotSource,
    },
    /// No slot inside the horizon satisfied capacity and spacing.
    Dropped { request_id: RequestId },
}

impl AssignmentOutcome {
    pub fn appointment(&self) -> Option<&Appointment> {
        match self {
            AssignmentOutcome::Assigned { appointment, .. } => Some(appointment),
            AssignmentOutcome::Dropped { .. } => None,
        }
    }
}

/// Tally of one run, logged when the request queue is drained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Bookings loaded from the initial schedule.
    pub seeded: usize,
    pub assigned: usize,
    pub dropped: usize,
    /// Requests whose payload could not be decoded.
    pub skipped: usize,
}

impl RunReport {
    pub fn processed(&self) -> usize {
        self.assigned + self.dropped + self.skipped
    }
}
