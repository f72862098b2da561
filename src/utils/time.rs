use std::{fmt::Display, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ElapsedTimeError {
    #[error("expected HH:MM:SS, got {0:?}")]
    Shape(String),
    #[error("invalid {component} component {value:?}")]
    Component { component: &'static str, value: String },
}

/// Tracked time as shown by the timer, i.e. `HH:MM:SS`. Hours are not limited to 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElapsedTime {
    seconds: u64,
}

impl ElapsedTime {
    pub const ZERO: ElapsedTime = ElapsedTime { seconds: 0 };

    pub fn from_secs(seconds: u64) -> Self {
        Self { seconds }
    }

    pub fn from_hms(hours: u64, minutes: u64, seconds: u64) -> Self {
        Self {
            seconds: hours
                .saturating_mul(3600)
                .saturating_add(minutes.saturating_mul(60))
                .saturating_add(seconds),
        }
    }

    pub fn as_secs(&self) -> u64 {
        self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0
    }

    /// Parses a timer string without ever failing. Components that are missing or don't parse
    /// count as 0, so `"00:xx:10"` is ten seconds.
    pub fn parse_lenient(value: &str) -> Self {
        let mut parts = value.trim().split(':');
        let mut next = |component: &'static str| {
            let part = parts.next().unwrap_or_default();
            part.trim().parse::<u64>().unwrap_or_else(|_| {
                warn!("Treating {component} component {part:?} of {value:?} as 0");
                0
            })
        };
        let hours = next("hours");
        let minutes = next("minutes");
        let seconds = next("seconds");
        Self::from_hms(hours, minutes, seconds)
    }
}

impl From<Duration> for ElapsedTime {
    fn from(value: Duration) -> Self {
        Self::from_secs(value.as_secs())
    }
}

impl From<ElapsedTime> for Duration {
    fn from(value: ElapsedTime) -> Self {
        Duration::from_secs(value.seconds)
    }
}

impl From<ElapsedTime> for String {
    fn from(value: ElapsedTime) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ElapsedTime {
    type Error = ElapsedTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for ElapsedTime {
    type Err = ElapsedTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.trim().split(':').collect::<Vec<_>>();
        let [hours, minutes, seconds] = parts.as_slice() else {
            return Err(ElapsedTimeError::Shape(s.to_string()));
        };

        fn component(
            component: &'static str,
            value: &str,
            limit: Option<u64>,
        ) -> Result<u64, ElapsedTimeError> {
            let invalid = || ElapsedTimeError::Component {
                component,
                value: value.to_string(),
            };
            let parsed = value.parse::<u64>().map_err(|_| invalid())?;
            match limit {
                Some(limit) if parsed >= limit => Err(invalid()),
                _ => Ok(parsed),
            }
        }

        Ok(Self::from_hms(
            component("hours", hours, None)?,
            component("minutes", minutes, Some(60))?,
            component("seconds", seconds, Some(60))?,
        ))
    }
}

impl Display for ElapsedTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hours = self.seconds / 3600;
        let minutes = (self.seconds % 3600) / 60;
        let seconds = self.seconds % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}
