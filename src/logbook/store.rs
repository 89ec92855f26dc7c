use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::classifier::adapter::ClassProbability;
use crate::error::LogError;
use crate::logbook::stats::{LogStats, StatsAccumulator};
use crate::pipeline::result::PredictionResult;
use crate::texture::features::FeatureVector;

/// Default number of entries returned by [`LogStore::recent`].
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// One stored prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub prediction_class: String,
    pub prediction_label: String,
    pub confidence: f64,
    pub glcm_features: FeatureVector,
    pub image_name: Option<String>,
    pub probabilities: Vec<ClassProbability>,
}

/// Most entries kept in memory for [`LogStore::recent`]; older ones live only in the file.
pub const RECENT_CAPACITY: usize = 500;

/// Prediction log: the latest entries and running statistics in memory,
/// optionally mirrored to a JSON-lines file holding the full history.
///
/// The file is append-only: one `LogEntry` per line. Opening an existing file
/// replays it into the statistics, so totals survive restarts.
pub struct LogStore {
    inner: Mutex<Inner>,
    path: Option<PathBuf>,
}

#[derive(Default)]
struct Inner {
    recent: VecDeque<LogEntry>,
    stats: StatsAccumulator,
}

impl Inner {
    fn push(&mut self, entry: LogEntry) {
        self.stats.add(&entry);
        if self.recent.len() == RECENT_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(entry);
    }
}

impl LogStore {
    pub fn in_memory() -> LogStore {
        LogStore { inner: Mutex::new(Inner::default()), path: None }
    }

    /// Opens (or creates on first write) a JSON-lines log at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<LogStore, LogError> {
        let path = path.as_ref().to_path_buf();
        let mut inner = Inner::default();

        if path.exists() {
            let reader = BufReader::new(std::fs::File::open(&path)?);
            for (idx, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry: LogEntry = serde_json::from_str(&line)
                    .map_err(|source| LogError::Corrupt { line: idx + 1, source })?;
                inner.push(entry);
            }
            info!(path = %path.display(), entries = inner.stats.total(), "loaded prediction log");
        }

        Ok(LogStore { inner: Mutex::new(inner), path: Some(path) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stores `result` under a fresh id and the current time.
    pub fn record(&self, result: &PredictionResult, image_name: Option<String>) -> Result<LogEntry, LogError> {
        let entry = LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            prediction_class: result.prediction.clone(),
            prediction_label: result.prediction_label.clone(),
            confidence: result.confidence,
            glcm_features: result.glcm_features,
            image_name,
            probabilities: result.probabilities.clone(),
        };

        let mut inner = self.lock();
        if let Some(path) = &self.path {
            let line = serde_json::to_string(&entry)?;
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}", line)?;
        }
        inner.push(entry.clone());
        debug!(id = %entry.id, label = %entry.prediction_label, "recorded prediction");
        Ok(entry)
    }

    /// Up to `limit` entries, newest first. At most [`RECENT_CAPACITY`] are held.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.lock().recent.iter().rev().take(limit).cloned().collect()
    }

    pub fn stats(&self) -> LogStats {
        self.lock().stats.snapshot()
    }

    /// Number of predictions recorded over the log's whole history.
    pub fn len(&self) -> usize {
        self.lock().stats.total()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Entries are pushed whole, so a poisoned lock still holds valid data.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: &str, confidence: f64) -> PredictionResult {
        PredictionResult {
            prediction: label.into(),
            prediction_label: label.into(),
            confidence,
            probabilities: vec![ClassProbability { label: label.into(), probability: confidence }],
            glcm_features: FeatureVector { contrast: 1.0, correlation: 0.5, energy: 0.2, homogeneity: 0.7 },
        }
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let store = LogStore::in_memory();
        for label in ["a", "b", "c"] {
            store.record(&result(label, 0.9), None).unwrap();
        }
        let recent = store.recent(2);
        let labels: Vec<_> = recent.iter().map(|e| e.prediction_label.as_str()).collect();
        assert_eq!(labels, ["c", "b"]);
    }

    #[test]
    fn entries_get_unique_ids() {
        let store = LogStore::in_memory();
        let a = store.record(&result("a", 0.9), None).unwrap();
        let b = store.record(&result("a", 0.9), None).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn file_backed_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        {
            let store = LogStore::open(&path).unwrap();
            store.record(&result("sehat", 0.8), Some("leaf.jpg".into())).unwrap();
            store.record(&result("hama_kutu", 0.6), None).unwrap();
        }
        let store = LogStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        let newest = &store.recent(1)[0];
        assert_eq!(newest.prediction_label, "hama_kutu");
        assert_eq!(store.recent(2)[1].image_name.as_deref(), Some("leaf.jpg"));
    }

    #[test]
    fn memory_is_bounded_but_stats_cover_everything() {
        let store = LogStore::in_memory();
        let total = RECENT_CAPACITY + 5;
        for i in 0..total {
            let label = if i < 5 { "hama_keong" } else { "sehat" };
            store.record(&result(label, 0.5), None).unwrap();
        }

        let recent = store.recent(usize::MAX);
        assert_eq!(recent.len(), RECENT_CAPACITY);
        assert!(recent.iter().all(|e| e.prediction_label == "sehat"));

        assert_eq!(store.len(), total);
        let stats = store.stats();
        assert_eq!(stats.total_predictions, total);
        assert_eq!(stats.class_distribution[1].label, "hama_keong");
        assert_eq!(stats.class_distribution[1].count, 5);
    }

    #[test]
    fn reopened_file_restores_full_totals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        {
            let store = LogStore::open(&path).unwrap();
            for _ in 0..RECENT_CAPACITY + 3 {
                store.record(&result("hama_kutu", 0.75), None).unwrap();
            }
        }
        let store = LogStore::open(&path).unwrap();
        assert_eq!(store.len(), RECENT_CAPACITY + 3);
        assert_eq!(store.recent(usize::MAX).len(), RECENT_CAPACITY);
        assert_eq!(store.stats().average_confidence, 0.75);
    }

    #[test]
    fn corrupt_line_is_reported_with_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        std::fs::write(&path, "{not json}\n").unwrap();
        assert!(matches!(LogStore::open(&path), Err(LogError::Corrupt { line: 1, .. })));
    }
}
