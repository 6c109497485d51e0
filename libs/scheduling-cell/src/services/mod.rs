pub mod calendar;
pub mod engine;
pub mod horizon;
pub mod runner;
pub mod transport;

pub use calendar::CalendarState;
pub use engine::AssignmentEngine;
pub use horizon::ScanHorizon;
pub use runner::SchedulingRunner;
pub use transport::{RequestFetch, SchedulingTransport};
