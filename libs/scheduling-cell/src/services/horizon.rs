// libs/scheduling-cell/src/services/horizon.rs

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday};

use shared_config::CalendarConfig;
use shared_models::Slot;

/// The season the forward scan walks: business hours on weekdays, from the
/// season start until the month after the season ends.
#[derive(Debug, Clone)]
pub struct ScanHorizon {
    season_start: NaiveDate,
    horizon_end: NaiveDate,
    opening_hour: u32,
    closing_hour: u32,
}

impl ScanHorizon {
    pub fn new(config: &CalendarConfig) -> Self {
        Self {
            season_start: config.season_start,
            horizon_end: first_of_following_month(config.season_end),
            opening_hour: config.opening_hour,
            closing_hour: config.closing_hour,
        }
    }

    /// Where every forward scan starts, before weekend/closing adjustments.
    pub fn anchor(&self) -> DateTime<Utc> {
        at_hour(self.season_start, self.opening_hour)
    }

    /// First day that is no longer scannable.
    pub fn horizon_end(&self) -> NaiveDate {
        self.horizon_end
    }

    pub fn opening_hour(&self) -> u32 {
        self.opening_hour
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at.date_naive() < self.horizon_end
    }

    /// Moves a candidate forward until it lands on a weekday inside business hours.
    pub fn normalize(&self, mut at: DateTime<Utc>) -> DateTime<Utc> {
        loop {
            if is_weekend(at.weekday()) {
                at += Duration::days(1);
            } else if at.hour() >= self.closing_hour {
                at = at_hour(at.date_naive() + Duration::days(1), self.opening_hour);
            } else if at.hour() < self.opening_hour {
                at = at_hour(at.date_naive(), self.opening_hour);
            } else {
                return at;
            }
        }
    }

    /// Bookable slots from the anchor, one hour apart, ending at the horizon.
    pub fn candidates(&self) -> Candidates<'_> {
        Candidates {
            horizon: self,
            next: Some(self.anchor()),
        }
    }
}

pub struct Candidates<'a> {
    horizon: &'a ScanHorizon,
    next: Option<DateTime<Utc>>,
}

impl Iterator for Candidates<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        let at = self.horizon.normalize(self.next?);

        if !self.horizon.contains(at) {
            self.next = None;
            return None;
        }

        self.next = Some(at + Duration::hours(1));
        Some(Slot::new(at))
    }
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

fn at_hour(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default())) + Duration::hours(hour as i64)
}

fn first_of_following_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizon() -> ScanHorizon {
        ScanHorizon::new(&CalendarConfig::default())
    }

    fn utc(raw: &str) -> DateTime<Utc> {
        Slot::parse(raw).unwrap().timestamp()
    }

    #[test]
    fn test_first_candidate_is_season_anchor() {
        let first = horizon().candidates().next().unwrap();
        assert_eq!(first.to_string(), "2021-11-01T08:00:00Z");
    }

    #[test]
    fn test_closing_hour_rolls_to_next_opening() {
        let h = horizon();
        assert_eq!(h.normalize(utc("2021-11-01T16:00:00Z")), utc("2021-11-02T08:00:00Z"));
        assert_eq!(h.normalize(utc("2021-11-01T15:00:00Z")), utc("2021-11-01T15:00:00Z"));
    }

    #[test]
    fn test_weekend_is_skipped_keeping_the_hour() {
        let h = horizon();
        // 2021-11-06 is a Saturday.
        assert_eq!(h.normalize(utc("2021-11-06T10:00:00Z")), utc("2021-11-08T10:00:00Z"));
    }

    #[test]
    fn test_friday_close_lands_on_monday() {
        let h = horizon();
        assert_eq!(h.normalize(utc("2021-11-05T16:00:00Z")), utc("2021-11-08T08:00:00Z"));
    }

    #[test]
    fn test_anchor_on_weekend_moves_to_monday() {
        let config = CalendarConfig {
            season_start: NaiveDate::from_ymd_opt(2021, 10, 31).unwrap(),
            ..CalendarConfig::default()
        };
        let first = ScanHorizon::new(&config).candidates().next().unwrap();

        assert_eq!(first.to_string(), "2021-11-01T08:00:00Z");
    }

    #[test]
    fn test_candidates_cover_each_business_hour_once() {
        let day: Vec<String> = horizon()
            .candidates()
            .take(9)
            .map(|slot| slot.to_string())
            .collect();

        assert_eq!(day.first().unwrap(), "2021-11-01T08:00:00Z");
        assert_eq!(day[7], "2021-11-01T15:00:00Z");
        assert_eq!(day[8], "2021-11-02T08:00:00Z");
    }

    #[test]
    fn test_candidates_stop_at_horizon() {
        let h = horizon();
        let all: Vec<Slot> = h.candidates().collect();

        // 45 weekdays in Nov/Dec 2021, 8 bookable hours each.
        assert_eq!(all.len(), 45 * 8);
        assert_eq!(all.last().unwrap().to_string(), "2021-12-31T15:00:00Z");
        assert_eq!(h.horizon_end(), NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert!(all.iter().all(|slot| !is_weekend(slot.timestamp().weekday())));
        assert!(all.iter().all(|slot| slot.timestamp().hour() < 16));
    }
}
