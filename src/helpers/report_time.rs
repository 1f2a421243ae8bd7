use chrono::prelude::*;
use chrono_tz::Tz;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %I:%M:%S %p",
    "%d %B %Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// Parses a reported device time leniently.
///
/// Values that carry an offset are converted to wall-clock time in `tz`,
/// values without one are taken to already be in `tz`. A bare date means
/// midnight.
pub fn parse_report_time(raw: &str, tz: Tz) -> Option<NaiveDateTime> {
    let time = raw.trim();
    if time.is_empty() {
        return None;
    }

    let with_offset = DateTime::parse_from_rfc3339(time)
        .or_else(|_| DateTime::parse_from_rfc2822(time))
        .ok()
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(time, fmt).ok())
        });
    if let Some(parsed) = with_offset {
        return Some(parsed.with_timezone(&tz).naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(time, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(time, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Parses a bare time of day, such as `10:15:30` or `10:15 PM`.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let time = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())
}

/// The time a report is filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportTime {
    Reported(NaiveDateTime),
    /// The reported value could not be parsed and the handling time is used instead.
    Fallback { now: NaiveDateTime, raw: String },
}

impl ReportTime {
    /// A bare time of day is placed on today's date in `tz`.
    pub fn resolve(raw: &str, tz: Tz, now: DateTime<Utc>) -> Self {
        let now = now.with_timezone(&tz).naive_local();
        let reported = parse_report_time(raw, tz)
            .or_else(|| parse_time_of_day(raw).map(|time| now.date().and_time(time)));

        match reported {
            Some(reported) => ReportTime::Reported(reported),
            None => ReportTime::Fallback {
                now,
                raw: raw.to_string(),
            },
        }
    }

    pub fn local(&self) -> NaiveDateTime {
        match self {
            ReportTime::Reported(time) => *time,
            ReportTime::Fallback { now, .. } => *now,
        }
    }
}
