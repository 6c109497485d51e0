use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotParseError {
    #[error("'{value}' is not a valid appointment time: {source}")]
    Malformed {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Hour {hour} is out of range for {date}")]
    HourOutOfRange { date: chrono::NaiveDate, hour: u32 },
}
