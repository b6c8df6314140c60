use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Local wall-clock format used for `timestamp` in partition files
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One OCR pass over a captured screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Recognized fragments joined in recognition order
    pub text: String,
    #[serde(rename = "timestamp", with = "timestamp")]
    pub captured_at: NaiveDateTime,
    /// Only ever set on the last record of a partition
    #[serde(
        rename = "elapsedSinceFirst",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub elapsed_since_first: Option<Elapsed>,
}

impl AnalysisRecord {
    /// Build a record, dropping sub-second precision from `captured_at`
    pub fn new(text: impl Into<String>, captured_at: NaiveDateTime) -> Self {
        Self {
            text: text.into(),
            captured_at: captured_at.with_nanosecond(0).unwrap_or(captured_at),
            elapsed_since_first: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.captured_at.date()
    }
}

/// All records captured on one local calendar date, in capture order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub records: Vec<AnalysisRecord>,
}

impl DailyReport {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&AnalysisRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&AnalysisRecord> {
        self.records.last()
    }

    /// Elapsed time carried by the last record, if the day has more than one capture
    pub fn elapsed(&self) -> Option<Elapsed> {
        self.last().and_then(|r| r.elapsed_since_first)
    }
}

/// Whole-second duration rendered as `HH:MM:SS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Elapsed {
    seconds: u64,
}

impl Elapsed {
    pub fn from_secs(seconds: u64) -> Self {
        Self { seconds }
    }

    /// `None` when `to` is earlier than `from`
    pub fn between(from: NaiveDateTime, to: NaiveDateTime) -> Option<Self> {
        let seconds = (to - from).num_seconds();
        u64::try_from(seconds).ok().map(Self::from_secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.seconds
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.seconds / 3600;
        let minutes = (self.seconds % 3600) / 60;
        let seconds = self.seconds % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid elapsed duration '{0}', expected H:MM:SS")]
pub struct ParseElapsedError(pub String);

impl FromStr for Elapsed {
    type Err = ParseElapsedError;

    /// Accepts zero-padded `HH:MM:SS` and the unpadded `H:MM:SS` form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseElapsedError(s.to_string());

        let mut parts = s.trim().split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let hours: u64 = h.parse().map_err(|_| invalid())?;
        let minutes: u64 = m.parse().map_err(|_| invalid())?;
        let seconds: u64 = sec.parse().map_err(|_| invalid())?;

        if m.len() != 2 || sec.len() != 2 || minutes > 59 || seconds > 59 {
            return Err(invalid());
        }

        Ok(Self::from_secs(hours * 3600 + minutes * 60 + seconds))
    }
}

impl Serialize for Elapsed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Elapsed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
