pub mod error;
pub mod scheduling_api;

pub use error::ApiError;
pub use scheduling_api::SchedulingApiClient;
