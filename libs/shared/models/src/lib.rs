pub mod error;
pub mod scheduling;

pub use error::SlotParseError;
pub use scheduling::*;
