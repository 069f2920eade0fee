//! Pool expiration settings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use crowdrun_core::CoreError;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// When a pool should close on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiration {
    /// That many days after the call.
    Days(i64),
    /// An absolute date-time: RFC 3339 (converted to UTC), a naive ISO-8601
    /// date-time taken as UTC, or a date meaning its midnight.
    Timestamp(String),
}

impl Expiration {
    /// The UTC deadline this setting stands for at `now`.
    pub fn deadline(&self, now: DateTime<Utc>) -> Result<NaiveDateTime, CoreError> {
        match self {
            Self::Days(days) => TimeDelta::try_days(*days)
                .and_then(|delta| now.checked_add_signed(delta))
                .map(|deadline| deadline.naive_utc())
                .ok_or_else(|| {
                    CoreError::InvalidConfiguration(format!("expiration of {days} days is out of range"))
                }),
            Self::Timestamp(text) => parse_timestamp(text),
        }
    }
}

fn parse_timestamp(text: &str) -> Result<NaiveDateTime, CoreError> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.naive_utc());
    }
    for format in NAIVE_FORMATS {
        if let Ok(instant) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(instant);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| CoreError::InvalidConfiguration(format!("cannot parse expiration '{text}'")))
}

impl From<i64> for Expiration {
    fn from(days: i64) -> Self {
        Self::Days(days)
    }
}

impl From<String> for Expiration {
    fn from(text: String) -> Self {
        Self::Timestamp(text)
    }
}

impl From<&str> for Expiration {
    fn from(text: &str) -> Self {
        Self::Timestamp(text.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_days_from_now() {
        let deadline = Expiration::Days(7).deadline(now()).unwrap();
        assert_eq!(deadline, at(2024, 5, 8, 10, 0, 0));
    }

    #[test]
    fn test_timestamp_formats() {
        let cases = [
            ("2024-06-01T12:30:00", at(2024, 6, 1, 12, 30, 0)),
            ("2024-06-01 12:30:00", at(2024, 6, 1, 12, 30, 0)),
            ("2024-06-01T12:30", at(2024, 6, 1, 12, 30, 0)),
            ("2024-06-01T12:30:00+02:00", at(2024, 6, 1, 10, 30, 0)),
            ("2024-06-01", at(2024, 6, 1, 0, 0, 0)),
        ];
        for (text, expected) in cases {
            assert_eq!(
                Expiration::from(text).deadline(now()).unwrap(),
                expected,
                "{text}"
            );
        }
    }

    #[test]
    fn test_fractional_seconds() {
        let deadline = Expiration::from("2024-06-01T12:30:00.250")
            .deadline(now())
            .unwrap();
        assert_eq!(deadline.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_unparseable_timestamp() {
        assert!(matches!(
            Expiration::from("next week").deadline(now()),
            Err(CoreError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Expiration::Days(i64::MAX).deadline(now()),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }
}
