use thiserror::Error;

use shared_api_client::ApiError;
use shared_models::SlotParseError;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Transport failure: {0}")]
    Transport(#[from] ApiError),

    #[error("Malformed appointment request: {0}")]
    MalformedRequest(#[from] serde_json::Error),

    #[error("Invalid preferred day: {0}")]
    InvalidDay(#[from] SlotParseError),

    #[error("Invalid calendar configuration: {0}")]
    Config(#[from] shared_config::ConfigError),
}

impl SchedulingError {
    /// Only transport and configuration failures end a run; everything else is per request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SchedulingError::Transport(_) | SchedulingError::Config(_))
    }
}
