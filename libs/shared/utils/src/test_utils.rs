use chrono::NaiveDate;
use serde_json::{json, Value};

use shared_config::{AppConfig, CalendarConfig};
use shared_models::{AppointmentRequest, DoctorId, PersonId, RequestId, ScheduledAppointment, Slot};

pub const TEST_API_TOKEN: &str = "test-run-token";

pub struct TestConfig {
    pub api_url: String,
    pub api_token: String,
    pub calendar: CalendarConfig,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api/Scheduling".to_string(),
            api_token: TEST_API_TOKEN.to_string(),
            calendar: CalendarConfig::default(),
        }
    }
}

impl TestConfig {
    /// Points the config at a mock server, e.g. `MockServer::uri()`.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// A season squeezed to the given range, handy for exhausting the horizon in tests.
    pub fn with_season(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.calendar.season_start = start;
        self.calendar.season_end = end;
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            scheduling_api_url: self.api_url.clone(),
            scheduling_api_token: self.api_token.clone(),
            calendar: self.calendar.clone(),
        }
    }
}

/// Parses a slot literal; panics on bad input since fixtures are hand-written.
pub fn slot(raw: &str) -> Slot {
    Slot::parse(raw).unwrap_or_else(|e| panic!("bad slot fixture {}: {}", raw, e))
}

pub fn request(
    request_id: RequestId,
    person_id: PersonId,
    is_new: bool,
    preferred_days: &[&str],
) -> AppointmentRequest {
    AppointmentRequest {
        request_id,
        person_id,
        is_new,
        preferred_days: preferred_days.iter().map(|day| day.to_string()).collect(),
    }
}

pub fn scheduled(doctor_id: DoctorId, person_id: PersonId, time: &str) -> ScheduledAppointment {
    ScheduledAppointment {
        doctor_id,
        person_id,
        slot: slot(time),
        is_new_patient: false,
    }
}

pub struct MockSchedulingResponses;

impl MockSchedulingResponses {
    pub fn appointment_request(
        request_id: RequestId,
        person_id: PersonId,
        is_new: bool,
        preferred_days: &[&str],
    ) -> Value {
        json!({
            "requestId": request_id,
            "personId": person_id,
            "preferredDays": preferred_days,
            "preferredDocs": [1, 2, 3],
            "isNew": is_new
        })
    }

    pub fn scheduled_appointment(doctor_id: DoctorId, person_id: PersonId, time: &str) -> Value {
        json!({
            "doctorId": doctor_id,
            "personId": person_id,
            "appointmentTime": time,
            "isNewPatientAppointment": false
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({
            "error": message
        })
    }
}
