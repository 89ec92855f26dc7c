use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::logbook::store::LogEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCount {
    #[serde(rename = "class")]
    pub label: String,
    pub count: usize,
    /// Share of all predictions, 0–100.
    pub percentage: f64,
}

/// Aggregate view over the prediction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStats {
    pub total_predictions: usize,
    /// Mean confidence; 0 when the log is empty.
    pub average_confidence: f64,
    /// Sorted by count descending, then label.
    pub class_distribution: Vec<ClassCount>,
}

/// Running totals over every prediction ever recorded.
///
/// Updated once per entry, so statistics never need the full history in memory.
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    total: usize,
    confidence_sum: f64,
    counts: HashMap<String, usize>,
}

impl StatsAccumulator {
    pub fn add(&mut self, entry: &LogEntry) {
        self.total += 1;
        self.confidence_sum += entry.confidence;
        *self.counts.entry(entry.prediction_label.clone()).or_insert(0) += 1;
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn snapshot(&self) -> LogStats {
        let total = self.total;
        let average_confidence = if total == 0 { 0.0 } else { self.confidence_sum / total as f64 };

        let mut class_distribution: Vec<ClassCount> = self.counts
            .iter()
            .map(|(label, &count)| ClassCount {
                label: label.clone(),
                count,
                percentage: count as f64 / total as f64 * 100.0,
            })
            .collect();
        class_distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        LogStats { total_predictions: total, average_confidence, class_distribution }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::features::FeatureVector;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(label: &str, confidence: f64) -> LogEntry {
        LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            prediction_class: label.into(),
            prediction_label: label.into(),
            confidence,
            glcm_features: FeatureVector { contrast: 0.0, correlation: 1.0, energy: 1.0, homogeneity: 1.0 },
            image_name: None,
            probabilities: vec![],
        }
    }

    fn summarize(entries: &[LogEntry]) -> LogStats {
        let mut acc = StatsAccumulator::default();
        for e in entries {
            acc.add(e);
        }
        acc.snapshot()
    }

    #[test]
    fn empty_log_has_zero_average() {
        let s = summarize(&[]);
        assert_eq!(s.total_predictions, 0);
        assert_eq!(s.average_confidence, 0.0);
        assert!(s.class_distribution.is_empty());
    }

    #[test]
    fn distribution_is_sorted_by_count_then_label() {
        let entries = vec![
            entry("hama_ulat", 0.5),
            entry("sehat", 1.0),
            entry("sehat", 0.75),
            entry("hama_keong", 0.75),
        ];
        let s = summarize(&entries);
        assert_eq!(s.total_predictions, 4);
        assert_eq!(s.average_confidence, 0.75);
        let order: Vec<_> = s.class_distribution.iter().map(|c| (c.label.as_str(), c.count)).collect();
        assert_eq!(order, [("sehat", 2), ("hama_keong", 1), ("hama_ulat", 1)]);
        assert_eq!(s.class_distribution[0].percentage, 50.0);
    }
}
