use std::env;
use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/Scheduling";
pub const MAX_SPACING_DAYS: i64 = 366;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Season start {start} is after season end {end}")]
    EmptySeason { start: NaiveDate, end: NaiveDate },

    #[error("Opening hour {opening} must be before closing hour {closing}")]
    InvalidBusinessHours { opening: u32, closing: u32 },

    #[error("Closing hour {0} is not a valid hour of the day")]
    ClosingHourOutOfRange(u32),

    #[error("Slot capacity must be at least one doctor")]
    ZeroCapacity,

    #[error("Minimum spacing of {0} days is outside 1..={max}", max = MAX_SPACING_DAYS)]
    SpacingOutOfRange(i64),
}

/// Rules the assignment engine books against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub season_start: NaiveDate,
    pub season_end: NaiveDate,
    /// First bookable hour of a business day.
    pub opening_hour: u32,
    /// Hour at which the forward scan rolls over to the next day. Never booked by the scan.
    pub closing_hour: u32,
    pub max_doctors_per_slot: u32,
    pub min_spacing_days: i64,
    /// Limits new patients to `new_patient_hours`. Off until the rule is signed off.
    pub restrict_new_patient_hours: bool,
    pub new_patient_hours: Vec<u32>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            season_start: NaiveDate::from_ymd_opt(2021, 11, 1).unwrap_or_default(),
            season_end: NaiveDate::from_ymd_opt(2021, 12, 31).unwrap_or_default(),
            opening_hour: 8,
            closing_hour: 16,
            max_doctors_per_slot: 3,
            min_spacing_days: 7,
            restrict_new_patient_hours: false,
            new_patient_hours: vec![15, 16],
        }
    }
}

impl CalendarConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            season_start: parsed_var("SEASON_START", defaults.season_start),
            season_end: parsed_var("SEASON_END", defaults.season_end),
            opening_hour: parsed_var("OPENING_HOUR", defaults.opening_hour),
            closing_hour: parsed_var("CLOSING_HOUR", defaults.closing_hour),
            max_doctors_per_slot: parsed_var("MAX_DOCTORS_PER_SLOT", defaults.max_doctors_per_slot),
            min_spacing_days: parsed_var("MIN_SPACING_DAYS", defaults.min_spacing_days),
            restrict_new_patient_hours: parsed_var(
                "RESTRICT_NEW_PATIENT_HOURS",
                defaults.restrict_new_patient_hours,
            ),
            new_patient_hours: match env::var("NEW_PATIENT_HOURS") {
                Ok(raw) => parse_hour_list(&raw).unwrap_or_else(|| {
                    warn!("NEW_PATIENT_HOURS '{}' is not a list of hours, using default", raw);
                    defaults.new_patient_hours.clone()
                }),
                Err(_) => defaults.new_patient_hours.clone(),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.season_start > self.season_end {
            return Err(ConfigError::EmptySeason {
                start: self.season_start,
                end: self.season_end,
            });
        }
        if self.closing_hour > 23 {
            return Err(ConfigError::ClosingHourOutOfRange(self.closing_hour));
        }
        if self.opening_hour >= self.closing_hour {
            return Err(ConfigError::InvalidBusinessHours {
                opening: self.opening_hour,
                closing: self.closing_hour,
            });
        }
        if self.max_doctors_per_slot == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !(1..=MAX_SPACING_DAYS).contains(&self.min_spacing_days) {
            return Err(ConfigError::SpacingOutOfRange(self.min_spacing_days));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub scheduling_api_url: String,
    pub scheduling_api_token: String,
    pub calendar: CalendarConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            scheduling_api_url: env::var("SCHEDULING_API_URL")
                .unwrap_or_else(|_| {
                    warn!("SCHEDULING_API_URL not set, using default");
                    DEFAULT_API_URL.to_string()
                }),
            scheduling_api_token: env::var("SCHEDULING_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("SCHEDULING_API_TOKEN not set, using empty value");
                    String::new()
                }),
            calendar: CalendarConfig::from_env(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.scheduling_api_url.is_empty()
            && !self.scheduling_api_token.is_empty()
    }
}

fn parsed_var<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} '{}' could not be parsed, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_hour_list(raw: &str) -> Option<Vec<u32>> {
    raw.split(',')
        .map(|hour| hour.trim().parse::<u32>().ok().filter(|h| *h < 24))
        .collect()
}
