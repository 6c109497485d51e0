// libs/scheduling-cell/src/services/runner.rs

use tracing::{error, info, instrument, warn};

use shared_models::AppointmentRequest;

use crate::error::SchedulingError;
use crate::models::{AssignmentOutcome, RunReport};
use crate::services::engine::AssignmentEngine;
use crate::services::transport::{RequestFetch, SchedulingTransport};

/// Drives one run: reset, seed from the current schedule, then drain the request queue.
/// Requests are handled strictly one after another.
pub struct SchedulingRunner<T: SchedulingTransport> {
    engine: AssignmentEngine,
    transport: T,
}

impl<T: SchedulingTransport> SchedulingRunner<T> {
    pub fn new(engine: AssignmentEngine, transport: T) -> Self {
        Self { engine, transport }
    }

    pub fn engine(&self) -> &AssignmentEngine {
        &self.engine
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<RunReport, SchedulingError> {
        let mut report = RunReport::default();

        info!("Starting scheduling run");
        self.transport
            .reset_run()
            .await
            .inspect_err(|e| error!("Could not reset the scheduling run: {}", e))?;

        let snapshot = self
            .transport
            .fetch_initial_schedule()
            .await
            .inspect_err(|e| error!("Could not fetch the initial schedule: {}", e))?;
        report.seeded = self.engine.seed(&snapshot);
        info!("Loaded {} existing appointments", report.seeded);

        loop {
            let body = match self.transport.fetch_next_request().await {
                Ok(RequestFetch::Payload(body)) => body,
                Ok(RequestFetch::NoMoreRequests) => break,
                Err(e) => {
                    error!("Could not fetch the next appointment request: {}", e);
                    return Err(e.into());
                }
            };

            match self.handle_request(&body).await {
                Ok(AssignmentOutcome::Assigned { .. }) => report.assigned += 1,
                Ok(AssignmentOutcome::Dropped { .. }) => report.dropped += 1,
                Err(e) if !e.is_fatal() => {
                    warn!("Skipping appointment request: {}", e);
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "All appointment requests handled: {} assigned, {} dropped, {} skipped",
            report.assigned, report.dropped, report.skipped
        );
        Ok(report)
    }

    /// Decodes, assigns and commits a single request. The calendar keeps the
    /// booking even when the commit fails.
    #[instrument(skip(self, body))]
    pub async fn handle_request(&mut self, body: &str) -> Result<AssignmentOutcome, SchedulingError> {
        let request: AppointmentRequest = serde_json::from_str(body)?;
        let outcome = self.engine.assign(&request);

        if let Some(appointment) = outcome.appointment() {
            if let Err(e) = self.transport.commit_appointment(appointment).await {
                error!("Failed to commit appointment for request {}: {}", request.request_id, e);
                return Err(e.into());
            }
        }

        Ok(outcome)
    }
}
