//! Timing windows for deferred jobs.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;
use crate::error::ValidationError;

/// Which of the date/time fields of a [`Timing`] are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingType {
    /// A single window from one date+time to another.
    FixedDateTime,
    /// Whole days between two dates.
    DateFixedOnly,
    /// A daily recurring time-of-day window.
    TimeFixedOnly,
    /// A daily time-of-day window, only on days between two dates.
    DateFixedTimeInterval,
}

impl TimingType {
    pub fn as_str(self) -> &'static str {
        match self {
            TimingType::FixedDateTime => "FixedDateTime",
            TimingType::DateFixedOnly => "DateFixedOnly",
            TimingType::TimeFixedOnly => "TimeFixedOnly",
            TimingType::DateFixedTimeInterval => "DateFixedTimeInterval",
        }
    }
}

impl fmt::Display for TimingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TimingType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FixedDateTime" => Ok(TimingType::FixedDateTime),
            "DateFixedOnly" => Ok(TimingType::DateFixedOnly),
            "TimeFixedOnly" => Ok(TimingType::TimeFixedOnly),
            "DateFixedTimeInterval" => Ok(TimingType::DateFixedTimeInterval),
            other => Err(UnknownVariant {
                kind: "timing type",
                value: other.to_string(),
            }),
        }
    }
}

/// The window during which a scheduled job may run.
///
/// Built only through the four `for_*` constructors; fields not used by a
/// variant are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    #[serde(rename = "type")]
    timing_type: TimingType,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    start_time: Option<NaiveTime>,
    #[serde(default)]
    end_time: Option<NaiveTime>,
}

impl Timing {
    pub fn for_fixed_date_time(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            timing_type: TimingType::FixedDateTime,
            start_date: Some(start.date()),
            end_date: Some(end.date()),
            start_time: Some(start.time()),
            end_time: Some(end.time()),
        }
    }

    pub fn for_date_fixed_only(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            timing_type: TimingType::DateFixedOnly,
            start_date: Some(start_date),
            end_date: Some(end_date),
            start_time: None,
            end_time: None,
        }
    }

    pub fn for_time_fixed_only(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            timing_type: TimingType::TimeFixedOnly,
            start_date: None,
            end_date: None,
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }

    pub fn for_date_fixed_time_interval(
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timing_type: TimingType::DateFixedTimeInterval,
            start_date: Some(start_date),
            end_date: Some(end_date),
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }

    /// Rebuilds a stored timing. The field shape must match `timing_type`.
    pub(crate) fn from_stored(
        id: Uuid,
        timing_type: TimingType,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
    ) -> Result<Self, ValidationError> {
        let timing = Self {
            id,
            timing_type,
            start_date,
            end_date,
            start_time,
            end_time,
        };
        timing.validate()?;
        Ok(timing)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timing_type(&self) -> TimingType {
        self.timing_type
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<NaiveTime> {
        self.end_time
    }

    /// Checks that exactly the fields of this variant are populated.
    /// Deserialized timings go through here before they are used.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let dates = self.start_date.is_some() && self.end_date.is_some();
        let no_dates = self.start_date.is_none() && self.end_date.is_none();
        let times = self.start_time.is_some() && self.end_time.is_some();
        let no_times = self.start_time.is_none() && self.end_time.is_none();
        let ok = match self.timing_type {
            TimingType::FixedDateTime | TimingType::DateFixedTimeInterval => dates && times,
            TimingType::DateFixedOnly => dates && no_times,
            TimingType::TimeFixedOnly => no_dates && times,
        };
        if ok {
            Ok(())
        } else {
            Err(ValidationError::TimingShape(self.timing_type.as_str()))
        }
    }

    /// Whether `at` falls inside this window. Bounds are inclusive.
    ///
    /// Time-of-day windows recur daily; an end time earlier than the start
    /// time wraps past midnight.
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        match self.timing_type {
            TimingType::FixedDateTime => {
                match (self.start_date, self.start_time, self.end_date, self.end_time) {
                    (Some(sd), Some(st), Some(ed), Some(et)) => {
                        sd.and_time(st) <= at && at <= ed.and_time(et)
                    }
                    _ => false,
                }
            }
            TimingType::DateFixedOnly => self.date_in_range(at.date()),
            TimingType::TimeFixedOnly => self.time_in_window(at.time()),
            TimingType::DateFixedTimeInterval => {
                self.date_in_range(at.date()) && self.time_in_window(at.time())
            }
        }
    }

    fn date_in_range(&self, date: NaiveDate) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => false,
        }
    }

    fn time_in_window(&self, time: NaiveTime) -> bool {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if start <= end => start <= time && time <= end,
            (Some(start), Some(end)) => time >= start || time <= end,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn date_fixed_only_has_dates_but_no_times() {
        let t = Timing::for_date_fixed_only(date(2024, 5, 1), date(2024, 5, 3));
        assert_eq!(t.timing_type(), TimingType::DateFixedOnly);
        assert_eq!(t.start_date(), Some(date(2024, 5, 1)));
        assert_eq!(t.end_date(), Some(date(2024, 5, 3)));
        assert!(t.start_time().is_none());
        assert!(t.end_time().is_none());
    }

    #[test]
    fn time_fixed_only_has_times_but_no_dates() {
        let t = Timing::for_time_fixed_only(time(1, 0), time(5, 0));
        assert_eq!(t.timing_type(), TimingType::TimeFixedOnly);
        assert!(t.start_date().is_none());
        assert!(t.end_date().is_none());
        assert_eq!(t.start_time(), Some(time(1, 0)));
        assert_eq!(t.end_time(), Some(time(5, 0)));
    }

    #[test]
    fn fixed_date_time_splits_date_and_time() {
        let start = date(2024, 5, 1).and_time(time(22, 30));
        let end = date(2024, 5, 2).and_time(time(6, 15));
        let t = Timing::for_fixed_date_time(start, end);
        assert_eq!(t.start_date(), Some(date(2024, 5, 1)));
        assert_eq!(t.end_date(), Some(date(2024, 5, 2)));
        assert_eq!(t.start_time(), Some(time(22, 30)));
        assert_eq!(t.end_time(), Some(time(6, 15)));
        assert!(t.validate().is_ok());
    }

    #[test]
    fn each_constructor_gets_a_fresh_id() {
        let a = Timing::for_time_fixed_only(time(1, 0), time(2, 0));
        let b = Timing::for_time_fixed_only(time(1, 0), time(2, 0));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn contains_fixed_date_time_window() {
        let t = Timing::for_fixed_date_time(
            date(2024, 5, 1).and_time(time(22, 0)),
            date(2024, 5, 2).and_time(time(6, 0)),
        );
        assert!(t.contains(date(2024, 5, 1).and_time(time(22, 0))));
        assert!(t.contains(date(2024, 5, 2).and_time(time(3, 0))));
        assert!(!t.contains(date(2024, 5, 1).and_time(time(21, 59))));
        assert!(!t.contains(date(2024, 5, 2).and_time(time(6, 1))));
    }

    #[test]
    fn contains_daily_window_wrapping_midnight() {
        let t = Timing::for_time_fixed_only(time(23, 0), time(2, 0));
        assert!(t.contains(date(2024, 1, 1).and_time(time(23, 30))));
        assert!(t.contains(date(2024, 1, 2).and_time(time(1, 0))));
        assert!(!t.contains(date(2024, 1, 2).and_time(time(12, 0))));
    }

    #[test]
    fn contains_date_bounded_daily_window() {
        let t = Timing::for_date_fixed_time_interval(
            date(2024, 3, 1),
            date(2024, 3, 10),
            time(1, 0),
            time(4, 0),
        );
        assert!(t.contains(date(2024, 3, 5).and_time(time(2, 0))));
        assert!(!t.contains(date(2024, 3, 5).and_time(time(5, 0))));
        assert!(!t.contains(date(2024, 3, 11).and_time(time(2, 0))));
    }

    #[test]
    fn validate_rejects_mismatched_shape() {
        let json = r#"{"type":"DateFixedOnly","start_time":"01:00:00","end_time":"02:00:00"}"#;
        let t: Timing = serde_json::from_str(json).unwrap();
        assert_eq!(
            t.validate(),
            Err(ValidationError::TimingShape("DateFixedOnly"))
        );
    }

    #[test]
    fn timing_type_string_roundtrip_and_unknown() {
        for t in [
            TimingType::FixedDateTime,
            TimingType::DateFixedOnly,
            TimingType::TimeFixedOnly,
            TimingType::DateFixedTimeInterval,
        ] {
            assert_eq!(t.as_str().parse::<TimingType>().unwrap(), t);
        }
        assert!("Weekly".parse::<TimingType>().is_err());
    }
}
