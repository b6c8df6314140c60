use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no report for {0}")]
    NotFound(NaiveDate),

    #[error("failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed report partition {}: {source}", path.display())]
    MalformedStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("record captured at {captured_at} is earlier than the last record at {last}")]
    OutOfOrder {
        captured_at: NaiveDateTime,
        last: NaiveDateTime,
    },

    #[error("failed to encode report: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
