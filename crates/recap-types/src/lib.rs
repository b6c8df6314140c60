pub mod types;

pub use types::{AnalysisRecord, DailyReport, Elapsed, ParseElapsedError, TIMESTAMP_FORMAT};
