use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};
use recap_types::{AnalysisRecord, DailyReport, Elapsed};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::StoreError;

const PARTITION_PREFIX: &str = "combined_report_";
const PARTITION_SUFFIX: &str = ".json";
const READABLE_PREFIX: &str = "readable_report_";
const READABLE_SUFFIX: &str = ".txt";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-partitioned, append-only store of analysis records
///
/// Each local calendar date has one `combined_report_<date>.json` holding the
/// records in capture order. Only the last record of a partition carries
/// `elapsedSinceFirst`. Writers hold the partition's write lock for the whole
/// load, modify and atomic replace sequence; readers take the read lock.
pub struct ReportStore {
    dir: PathBuf,
    locks: Mutex<HashMap<NaiveDate, Arc<RwLock<()>>>>,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn partition_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{PARTITION_PREFIX}{}{PARTITION_SUFFIX}",
            date.format(DATE_FORMAT)
        ))
    }

    pub fn readable_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{READABLE_PREFIX}{}{READABLE_SUFFIX}",
            date.format(DATE_FORMAT)
        ))
    }

    fn lock_for(&self, date: NaiveDate) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(date).or_default().clone()
    }

    /// Append `record` to its date's partition and persist the whole sequence
    ///
    /// Rejects records older than the partition's last record. A partition that
    /// fails to parse is left untouched and every append to it fails until the
    /// file is repaired.
    pub async fn append(&self, mut record: AnalysisRecord) -> Result<DailyReport, StoreError> {
        let date = record.date();
        let lock = self.lock_for(date);
        let _guard = lock.write().await;

        let mut report = match self.read_partition(date).await {
            Ok(Some(report)) => report,
            Ok(None) => DailyReport::new(date),
            Err(e @ StoreError::MalformedStore { .. }) => {
                tracing::error!(alert = true, %date, "report partition is malformed, writes halted: {e}");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if let Some(last) = report.last()
            && record.captured_at < last.captured_at
        {
            return Err(StoreError::OutOfOrder {
                captured_at: record.captured_at,
                last: last.captured_at,
            });
        }

        for earlier in &mut report.records {
            earlier.elapsed_since_first = None;
        }
        record.elapsed_since_first = report
            .first()
            .and_then(|first| Elapsed::between(first.captured_at, record.captured_at));
        report.records.push(record);

        self.write_partition(&report).await?;

        tracing::info!(
            %date,
            records = report.len(),
            elapsed = ?report.elapsed().map(|e| e.to_string()),
            "appended analysis record"
        );
        Ok(report)
    }

    /// Read one date's partition
    pub async fn load(&self, date: NaiveDate) -> Result<DailyReport, StoreError> {
        let lock = self.lock_for(date);
        let _guard = lock.read().await;

        self.read_partition(date)
            .await?
            .ok_or(StoreError::NotFound(date))
    }

    /// Today's partition (local date)
    pub async fn latest(&self) -> Result<DailyReport, StoreError> {
        self.load(Local::now().date_naive()).await
    }

    /// Every date that has a partition file, oldest first
    pub async fn dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Persistence {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut dates = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|source| StoreError::Persistence {
                path: self.dir.clone(),
                source,
            })?;
            let Some(entry) = entry else { break };

            let name = entry.file_name();
            if let Some(date) = name
                .to_str()
                .and_then(|n| n.strip_prefix(PARTITION_PREFIX))
                .and_then(|n| n.strip_suffix(PARTITION_SUFFIX))
                .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
            {
                dates.push(date);
            }
        }

        dates.sort();
        Ok(dates)
    }

    /// Read one date's readable narrative
    pub async fn readable(&self, date: NaiveDate) -> Result<String, StoreError> {
        let path = self.readable_path(date);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(date)),
            Err(source) => Err(StoreError::Persistence { path, source }),
        }
    }

    /// Replace one date's readable narrative
    pub async fn write_readable(&self, date: NaiveDate, body: &str) -> Result<PathBuf, StoreError> {
        let path = self.readable_path(date);
        write_atomic(&path, body.as_bytes()).await?;
        Ok(path)
    }

    async fn read_partition(&self, date: NaiveDate) -> Result<Option<DailyReport>, StoreError> {
        let path = self.partition_path(date);

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Persistence { path, source }),
        };

        let records: Vec<AnalysisRecord> = serde_json::from_str(&raw)
            .map_err(|source| StoreError::MalformedStore { path, source })?;

        Ok(Some(DailyReport { date, records }))
    }

    async fn write_partition(&self, report: &DailyReport) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&report.records).map_err(StoreError::Encode)?;
        write_atomic(&self.partition_path(report.date), &json).await
    }
}

/// Write to `<path>.tmp`, fsync, then rename over `path`
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let persistence = |source| StoreError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(persistence)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(persistence(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use recap_types::TIMESTAMP_FORMAT;

    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[tokio::test]
    async fn test_first_append_has_no_elapsed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());

        let report = store
            .append(AnalysisRecord::new("first", at("2024-05-01 10:00:00")))
            .await
            .unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report.records[0].elapsed_since_first, None);

        let raw = std::fs::read_to_string(store.partition_path(day())).unwrap();
        assert!(!raw.contains("elapsedSinceFirst"));
    }

    #[tokio::test]
    async fn test_second_append_moves_elapsed_to_last() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());

        store
            .append(AnalysisRecord::new("first", at("2024-05-01 10:00:00")))
            .await
            .unwrap();
        let report = store
            .append(AnalysisRecord::new("second", at("2024-05-01 10:04:30")))
            .await
            .unwrap();

        assert_eq!(report.records[0].elapsed_since_first, None);
        assert_eq!(
            report.records[1].elapsed_since_first.map(|e| e.to_string()),
            Some("00:04:30".to_string())
        );
    }

    #[tokio::test]
    async fn test_n_appends_keep_order_and_single_elapsed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let start = at("2024-05-01 08:00:00");

        for n in 1..=6u32 {
            let captured = start + chrono::Duration::seconds(i64::from(n - 1) * 245);
            let report = store
                .append(AnalysisRecord::new(format!("capture {n}"), captured))
                .await
                .unwrap();

            assert_eq!(report.len(), n as usize);
            let texts: Vec<_> = report.records.iter().map(|r| r.text.as_str()).collect();
            let expected: Vec<_> = (1..=n).map(|i| format!("capture {i}")).collect();
            assert_eq!(texts, expected);

            let carriers = report
                .records
                .iter()
                .filter(|r| r.elapsed_since_first.is_some())
                .count();
            if n == 1 {
                assert_eq!(carriers, 0);
            } else {
                assert_eq!(carriers, 1);
                let last = report.last().unwrap();
                assert_eq!(
                    last.elapsed_since_first.unwrap().as_secs(),
                    (last.captured_at - start).num_seconds() as u64
                );
            }
        }
    }

    #[tokio::test]
    async fn test_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let written = {
            let store = ReportStore::new(dir.path());
            store
                .append(AnalysisRecord::new("alpha", at("2024-05-01 09:00:00")))
                .await
                .unwrap();
            store
                .append(AnalysisRecord::new("", at("2024-05-01 09:04:00")))
                .await
                .unwrap();
            store
                .append(AnalysisRecord::new("gamma \"quoted\"", at("2024-05-01 09:08:01")))
                .await
                .unwrap()
        };

        let reopened = ReportStore::new(dir.path());
        let loaded = reopened.load(day()).await.unwrap();
        assert_eq!(loaded, written);
    }

    #[tokio::test]
    async fn test_partitions_split_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());

        store
            .append(AnalysisRecord::new("late", at("2024-05-01 23:59:00")))
            .await
            .unwrap();
        let next_day = store
            .append(AnalysisRecord::new("early", at("2024-05-02 00:03:00")))
            .await
            .unwrap();

        assert_eq!(next_day.len(), 1);
        assert_eq!(next_day.records[0].elapsed_since_first, None);
        assert_eq!(
            store.dates().await.unwrap(),
            vec![day(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()]
        );
    }

    #[tokio::test]
    async fn test_out_of_order_rejected_and_partition_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());

        store
            .append(AnalysisRecord::new("a", at("2024-05-01 10:00:00")))
            .await
            .unwrap();
        let before = std::fs::read(store.partition_path(day())).unwrap();

        let err = store
            .append(AnalysisRecord::new("b", at("2024-05-01 09:59:59")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::OutOfOrder { .. }));
        assert_eq!(std::fs::read(store.partition_path(day())).unwrap(), before);
    }

    #[tokio::test]
    async fn test_equal_timestamps_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());

        store
            .append(AnalysisRecord::new("a", at("2024-05-01 10:00:00")))
            .await
            .unwrap();
        let report = store
            .append(AnalysisRecord::new("b", at("2024-05-01 10:00:00")))
            .await
            .unwrap();
        assert_eq!(report.elapsed().unwrap().to_string(), "00:00:00");
    }

    #[tokio::test]
    async fn test_malformed_partition_halts_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let path = store.partition_path(day());
        std::fs::write(&path, b"[{\"text\": \"trunc").unwrap();

        let err = store
            .append(AnalysisRecord::new("new", at("2024-05-01 10:00:00")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MalformedStore { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"[{\"text\": \"trunc");

        assert!(matches!(
            store.load(day()).await,
            Err(StoreError::MalformedStore { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        store
            .append(AnalysisRecord::new("a", at("2024-05-01 10:00:00")))
            .await
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["combined_report_2024-05-01.json".to_string()]);
    }

    #[tokio::test]
    async fn test_unwritable_dir_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let store = ReportStore::new(&blocker);

        let err = store
            .append(AnalysisRecord::new("a", at("2024-05-01 10:00:00")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
    }

    #[tokio::test]
    async fn test_missing_partition_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("never-created"));

        assert!(store.latest().await.unwrap_err().is_not_found());
        assert!(store.load(day()).await.unwrap_err().is_not_found());
        assert!(store.readable(day()).await.unwrap_err().is_not_found());
        assert!(store.dates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_unpadded_elapsed_from_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        std::fs::write(
            store.partition_path(day()),
            r#"[
                {"text": "a", "timestamp": "2024-05-01 10:00:00"},
                {"text": "b", "timestamp": "2024-05-01 10:04:30", "elapsedSinceFirst": "0:04:30"}
            ]"#,
        )
        .unwrap();

        let report = store
            .append(AnalysisRecord::new("c", at("2024-05-01 11:00:00")))
            .await
            .unwrap();
        assert_eq!(report.records[1].elapsed_since_first, None);
        assert_eq!(report.elapsed().unwrap().to_string(), "01:00:00");
    }
}
