use std::fmt;
use std::ops::{Add, Sub};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// UTC timestamp persisted as an RFC 3339 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrappedChronoDateTime(DateTime<Utc>);

impl WrappedChronoDateTime {
    pub fn get_inner(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn new(value: DateTime<Utc>) -> Self {
        Self(value)
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl TryFrom<&str> for WrappedChronoDateTime {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // SQLite datetime format first, then RFC 3339
        let parsed = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)))
            .map_err(|_e| anyhow::anyhow!("invalid datetime value: {value}"))?;

        Ok(WrappedChronoDateTime::new(parsed))
    }
}

impl TryFrom<String> for WrappedChronoDateTime {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        WrappedChronoDateTime::try_from(value.as_str())
    }
}

impl fmt::Display for WrappedChronoDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<DateTime<Utc>> for WrappedChronoDateTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl From<WrappedChronoDateTime> for DateTime<Utc> {
    fn from(value: WrappedChronoDateTime) -> Self {
        value.0
    }
}

impl Sub<Duration> for WrappedChronoDateTime {
    type Output = WrappedChronoDateTime;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self(self.0 - rhs)
    }
}

impl Add<Duration> for WrappedChronoDateTime {
    type Output = WrappedChronoDateTime;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs)
    }
}
