//! Range clause
//!
//! Queries always carry a relative range start such as `-1h`. Selects use
//! [`RelativeRange::default`] (one hour back) unless the caller overrides it.

use chrono::Duration;

use super::error::{QueryError, QueryResult};

/// Unit of a relative duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl DurationUnit {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "us",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
            Self::Days => "d",
            Self::Weeks => "w",
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "ns" => Some(Self::Nanoseconds),
            "us" => Some(Self::Microseconds),
            "ms" => Some(Self::Milliseconds),
            "s" => Some(Self::Seconds),
            "m" => Some(Self::Minutes),
            "h" => Some(Self::Hours),
            "d" => Some(Self::Days),
            "w" => Some(Self::Weeks),
            _ => None,
        }
    }
}

/// A range start relative to now, e.g. `-1h`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeRange {
    amount: i64,
    unit: DurationUnit,
}

impl Default for RelativeRange {
    fn default() -> Self {
        Self {
            amount: 1,
            unit: DurationUnit::Hours,
        }
    }
}

impl RelativeRange {
    pub fn new(amount: i64, unit: DurationUnit) -> Self {
        Self { amount, unit }
    }

    /// Parse a range start of the form `-<n><unit>`
    pub fn parse(s: &str) -> QueryResult<Self> {
        let re = regex::Regex::new(r"^-(\d+)(ns|us|ms|s|m|h|d|w)$")
            .map_err(|e| QueryError::InvalidRange(e.to_string()))?;

        let caps = re
            .captures(s.trim())
            .ok_or_else(|| QueryError::InvalidRange(s.to_string()))?;

        let amount: i64 = caps[1]
            .parse()
            .map_err(|_| QueryError::InvalidRange(s.to_string()))?;
        let unit = DurationUnit::from_suffix(&caps[2])
            .ok_or_else(|| QueryError::InvalidRange(s.to_string()))?;

        Ok(Self { amount, unit })
    }

    /// How far back the range reaches
    pub fn duration(&self) -> Duration {
        let duration = match self.unit {
            DurationUnit::Nanoseconds => Some(Duration::nanoseconds(self.amount)),
            DurationUnit::Microseconds => Some(Duration::microseconds(self.amount)),
            DurationUnit::Milliseconds => Duration::try_milliseconds(self.amount),
            DurationUnit::Seconds => Duration::try_seconds(self.amount),
            DurationUnit::Minutes => Duration::try_minutes(self.amount),
            DurationUnit::Hours => Duration::try_hours(self.amount),
            DurationUnit::Days => Duration::try_days(self.amount),
            DurationUnit::Weeks => Duration::try_weeks(self.amount),
        };
        duration.unwrap_or(Duration::MAX)
    }

    /// Earliest timestamp (unix nanoseconds) inside the range for the given now
    pub fn start_nanos(&self, now_nanos: i64) -> i64 {
        let back = self.duration().num_nanoseconds().unwrap_or(i64::MAX);
        now_nanos.saturating_sub(back)
    }
}

impl std::fmt::Display for RelativeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "-{}{}", self.amount, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_one_hour() {
        assert_eq!(RelativeRange::default().to_string(), "-1h");
        assert_eq!(RelativeRange::default().duration(), Duration::hours(1));
    }

    #[test]
    fn test_parse() {
        let r = RelativeRange::parse("-30m").unwrap();
        assert_eq!(r, RelativeRange::new(30, DurationUnit::Minutes));
        assert_eq!(r.to_string(), "-30m");

        let r = RelativeRange::parse("-250ms").unwrap();
        assert_eq!(r.duration(), Duration::milliseconds(250));

        assert!(RelativeRange::parse("1h").is_err());
        assert!(RelativeRange::parse("-1y").is_err());
        assert!(RelativeRange::parse("now").is_err());
    }

    #[test]
    fn test_start_nanos() {
        let r = RelativeRange::new(1, DurationUnit::Seconds);
        assert_eq!(r.start_nanos(5_000_000_000), 4_000_000_000);

        let r = RelativeRange::new(1_000_000, DurationUnit::Weeks);
        assert_eq!(r.start_nanos(0), -i64::MAX);

        let r = RelativeRange::new(i64::MAX, DurationUnit::Weeks);
        assert_eq!(r.duration(), Duration::MAX);
    }
}
