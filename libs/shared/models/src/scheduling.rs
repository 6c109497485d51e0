// libs/shared/models/src/scheduling.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SlotParseError;

pub type DoctorId = u32;
pub type PersonId = i64;
pub type RequestId = i64;

// ==============================================================================
// SLOTS
// ==============================================================================

/// A bookable point in time. Two strings naming the same instant are the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slot(DateTime<Utc>);

impl Slot {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// The slot starting at `hour:00` UTC on `date`.
    pub fn on_day(date: NaiveDate, hour: u32) -> Result<Self, SlotParseError> {
        date.and_hms_opt(hour, 0, 0)
            .map(|naive| Self(Utc.from_utc_datetime(&naive)))
            .ok_or(SlotParseError::HourOutOfRange { date, hour })
    }

    /// Parses an RFC 3339 timestamp. A timestamp without an offset is read as UTC.
    pub fn parse(raw: &str) -> Result<Self, SlotParseError> {
        let raw = raw.trim();
        match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => Ok(Self(at.with_timezone(&Utc))),
            Err(source) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| Self(Utc.from_utc_datetime(&naive)))
                .map_err(|_| SlotParseError::Malformed {
                    value: raw.to_string(),
                    source,
                }),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl TryFrom<String> for Slot {
    type Error = SlotParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Slot::parse(&value)
    }
}

impl From<Slot> for String {
    fn from(slot: Slot) -> Self {
        slot.to_string()
    }
}

// ==============================================================================
// WIRE MODELS
// ==============================================================================

/// A pending request as served by `GET AppointmentRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub request_id: RequestId,
    pub person_id: PersonId,
    pub is_new: bool,
    /// Kept as raw strings: a bad entry only invalidates that one preference.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub preferred_days: Vec<String>,
}

/// An accepted booking, in the shape `POST Schedule` expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub doctor_id: DoctorId,
    pub person_id: PersonId,
    #[serde(rename = "appointmentTime")]
    pub slot: Slot,
    #[serde(rename = "isNewPatientAppointment")]
    pub is_new_patient: bool,
    pub request_id: RequestId,
}

/// One entry of the schedule snapshot returned by `GET Schedule`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledAppointment {
    pub doctor_id: DoctorId,
    pub person_id: PersonId,
    #[serde(rename = "appointmentTime")]
    pub slot: Slot,
    #[serde(rename = "isNewPatientAppointment", default)]
    pub is_new_patient: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
