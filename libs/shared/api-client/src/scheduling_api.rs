use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE},
    Client, Method, Response, StatusCode,
};
use serde::Serialize;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::{Appointment, ScheduledAppointment};

use crate::error::ApiError;

const START_ENDPOINT: &str = "Start";
const SCHEDULE_ENDPOINT: &str = "Schedule";
const APPOINTMENT_REQUEST_ENDPOINT: &str = "AppointmentRequest";

/// Client for the scheduling REST API. Every call is authenticated with the run token.
pub struct SchedulingApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl SchedulingApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.scheduling_api_url.trim_end_matches('/').to_string(),
            token: config.scheduling_api_token.clone(),
        }
    }

    fn get_headers(&self, method: &Method, has_body: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if has_body {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
        } else if *method == Method::POST {
            // Bodyless POST needs an explicit length.
            headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
        }

        headers
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        form: Option<&B>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method.clone(), &url)
            .query(&[("token", self.token.as_str())])
            .headers(self.get_headers(&method, form.is_some()));

        if let Some(fields) = form {
            req = req.form(fields);
        }

        let response = req.send().await.map_err(|source| ApiError::Request {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}) on {} {}: {}", status, method, endpoint, error_text);

            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: error_text,
            });
        }

        Ok(response)
    }

    async fn read_body(&self, endpoint: &str, response: Response) -> Result<String, ApiError> {
        response.text().await.map_err(|source| ApiError::Request {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// Resets the server-side run so the schedule and request endpoints start fresh.
    pub async fn start_run(&self) -> Result<(), ApiError> {
        self.send::<()>(Method::POST, START_ENDPOINT, None).await?;
        Ok(())
    }

    /// The appointments already on the books when the run starts.
    pub async fn get_schedule(&self) -> Result<Vec<ScheduledAppointment>, ApiError> {
        let response = self.send::<()>(Method::GET, SCHEDULE_ENDPOINT, None).await?;
        let body = self.read_body(SCHEDULE_ENDPOINT, response).await?;

        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            endpoint: SCHEDULE_ENDPOINT.to_string(),
            source,
        })
    }

    /// Next pending request as a raw JSON body, or `None` once the queue is drained (204).
    pub async fn next_appointment_request(&self) -> Result<Option<String>, ApiError> {
        let response = self.send::<()>(Method::GET, APPOINTMENT_REQUEST_ENDPOINT, None).await?;

        if response.status() == StatusCode::NO_CONTENT {
            debug!("No more appointment requests");
            return Ok(None);
        }

        self.read_body(APPOINTMENT_REQUEST_ENDPOINT, response).await.map(Some)
    }

    /// Commits a booking as form fields (`doctorId`, `personId`, `appointmentTime`,
    /// `isNewPatientAppointment`, `requestId`).
    pub async fn post_appointment(&self, appointment: &Appointment) -> Result<(), ApiError> {
        self.send(Method::POST, SCHEDULE_ENDPOINT, Some(appointment)).await?;
        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
