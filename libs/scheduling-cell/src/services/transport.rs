// libs/scheduling-cell/src/services/transport.rs

use async_trait::async_trait;

use shared_api_client::{ApiError, SchedulingApiClient};
use shared_models::{Appointment, ScheduledAppointment};

/// What `fetch_next_request` hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestFetch {
    /// Undecoded request body.
    Payload(String),
    NoMoreRequests,
}

/// The system of record the runner reads requests from and commits bookings to.
#[async_trait]
pub trait SchedulingTransport: Send + Sync {
    /// Establishes a fresh run. Called once before anything is fetched.
    async fn reset_run(&self) -> Result<(), ApiError>;

    async fn fetch_initial_schedule(&self) -> Result<Vec<ScheduledAppointment>, ApiError>;

    async fn fetch_next_request(&self) -> Result<RequestFetch, ApiError>;

    async fn commit_appointment(&self, appointment: &Appointment) -> Result<(), ApiError>;
}

#[async_trait]
impl SchedulingTransport for SchedulingApiClient {
    async fn reset_run(&self) -> Result<(), ApiError> {
        self.start_run().await
    }

    async fn fetch_initial_schedule(&self) -> Result<Vec<ScheduledAppointment>, ApiError> {
        self.get_schedule().await
    }

    async fn fetch_next_request(&self) -> Result<RequestFetch, ApiError> {
        Ok(match self.next_appointment_request().await? {
            Some(body) => RequestFetch::Payload(body),
            None => RequestFetch::NoMoreRequests,
        })
    }

    async fn commit_appointment(&self, appointment: &Appointment) -> Result<(), ApiError> {
        self.post_appointment(appointment).await
    }
}
