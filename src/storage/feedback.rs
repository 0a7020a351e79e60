//! Feedback ledger
//!
//! Appends user feedback to `feedback.json` and rewrites the summary from the
//! full record list on every submission.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::document::{DocumentInfo, DocumentStore};
use super::metrics::MetricsLedger;
use crate::error::{CareerError, Result};
use crate::types::{
    round2, FeedbackCategory, FeedbackDocument, FeedbackRecord, FeedbackSummary, NewFeedback,
    MAX_RATING, MIN_RATING,
};

/// Type label used when a submission leaves the type blank
pub const DEFAULT_FEEDBACK_TYPE: &str = "general_feedback";

/// Ordered classification rules; the first category with a matching keyword wins.
pub const CATEGORY_RULES: &[(FeedbackCategory, &[&str])] = &[
    (
        FeedbackCategory::UsageFeedback,
        &["体验", "使用", "agent", "experience", "usage"],
    ),
    (
        FeedbackCategory::Suggestion,
        &["建议", "功能", "suggest", "feature", "request"],
    ),
    (
        FeedbackCategory::BugReport,
        &["bug", "问题", "错误", "故障", "error", "issue"],
    ),
];

/// Classify a feedback type label into exactly one category
pub fn classify_feedback_type(feedback_type: &str) -> FeedbackCategory {
    let lower = feedback_type.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(FeedbackCategory::Other)
}

/// Clamp a raw rating into [1, 5]
pub fn clamp_rating(raw: i64) -> u8 {
    raw.clamp(MIN_RATING as i64, MAX_RATING as i64) as u8
}

/// Recompute the summary over every record
pub fn summarize(records: &[FeedbackRecord]) -> FeedbackSummary {
    let mut summary = FeedbackSummary {
        total_feedbacks: records.len(),
        ..Default::default()
    };

    for record in records {
        match classify_feedback_type(&record.feedback_type) {
            FeedbackCategory::UsageFeedback => summary.usage_feedback += 1,
            FeedbackCategory::Suggestion => summary.suggestion += 1,
            FeedbackCategory::BugReport => summary.bug_report += 1,
            FeedbackCategory::Other => summary.other += 1,
        }
    }

    let ratings: Vec<f64> = records
        .iter()
        .filter_map(|r| r.rating)
        .map(f64::from)
        .collect();
    if !ratings.is_empty() {
        summary.average_rating = round2(ratings.iter().sum::<f64>() / ratings.len() as f64);
    }

    summary
}

fn normalize_type(feedback_type: &str) -> String {
    feedback_type.trim().to_lowercase()
}

/// Most recent first; equal timestamps keep later submissions first.
fn newest_first(mut records: Vec<FeedbackRecord>) -> Vec<FeedbackRecord> {
    records.reverse();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records
}

/// Persisted feedback records plus their summary
pub struct FeedbackLedger {
    store: DocumentStore<FeedbackDocument>,
    metrics: Option<Arc<MetricsLedger>>,
}

impl FeedbackLedger {
    /// Open the ledger at `path`, creating the document if needed
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = DocumentStore::new(path);
        if let Err(e) = store.ensure() {
            warn!("Feedback document not initialized: {}", e);
        }
        Self {
            store,
            metrics: None,
        }
    }

    /// Echo every accepted submission into the metrics ledger
    pub fn with_metrics(mut self, metrics: Arc<MetricsLedger>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate, append and persist a submission. Returns the new id.
    pub fn submit(&self, input: NewFeedback) -> Result<String> {
        self.submit_at(input, Utc::now())
    }

    pub(crate) fn submit_at(&self, input: NewFeedback, now: DateTime<Utc>) -> Result<String> {
        let content = input.content.trim();
        if content.is_empty() {
            return Err(CareerError::InvalidInput(
                "Feedback content cannot be empty".to_string(),
            ));
        }

        let feedback_type = match input.feedback_type.trim() {
            "" => DEFAULT_FEEDBACK_TYPE.to_string(),
            t => t.to_string(),
        };
        let contact = input
            .contact
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let record = FeedbackRecord {
            id: Uuid::new_v4().simple().to_string()[..8].to_string(),
            timestamp: now,
            feedback_type,
            rating: input.rating.map(clamp_rating),
            content: content.to_string(),
            contact,
        };

        let mut doc = self.store.load();
        doc.feedbacks.push(record.clone());
        doc.summary = summarize(&doc.feedbacks);
        self.store.save(&doc)?;

        info!(
            "Feedback {} recorded ({})",
            record.id,
            classify_feedback_type(&record.feedback_type)
        );

        if let Some(metrics) = &self.metrics {
            if let Err(e) = metrics.record_feedback(&record) {
                warn!("Feedback {} not echoed to metrics: {}", record.id, e);
            }
        }

        Ok(record.id)
    }

    /// Current summary, derived from the stored records
    pub fn stats(&self) -> FeedbackSummary {
        summarize(&self.store.load().feedbacks)
    }

    /// Up to `limit` records, most recent first
    pub fn recent(&self, limit: usize) -> Vec<FeedbackRecord> {
        let mut records = self.all();
        records.truncate(limit);
        records
    }

    /// Every record, most recent first
    pub fn all(&self) -> Vec<FeedbackRecord> {
        newest_first(self.store.load().feedbacks)
    }

    /// Records whose type matches case-insensitively after trimming
    pub fn by_type(&self, feedback_type: &str) -> Vec<FeedbackRecord> {
        let wanted = normalize_type(feedback_type);
        self.all()
            .into_iter()
            .filter(|r| normalize_type(&r.feedback_type) == wanted)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<FeedbackRecord> {
        self.store
            .load()
            .feedbacks
            .into_iter()
            .find(|r| r.id == id)
    }

    /// Number of records per rating value 1..=5
    pub fn rating_distribution(&self) -> BTreeMap<u8, usize> {
        let mut distribution: BTreeMap<u8, usize> =
            (MIN_RATING..=MAX_RATING).map(|r| (r, 0)).collect();
        for rating in self.store.load().feedbacks.iter().filter_map(|r| r.rating) {
            if let Some(count) = distribution.get_mut(&rating) {
                *count += 1;
            }
        }
        distribution
    }

    /// The whole document as pretty-printed JSON, summary recomputed
    pub fn export(&self) -> Result<String> {
        let mut doc = self.store.load();
        doc.summary = summarize(&doc.feedbacks);
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Back up the document, then reset it to empty. Returns the backup path.
    pub fn clear(&self) -> Result<Option<PathBuf>> {
        let backup = self.store.backup()?;
        self.store.save(&FeedbackDocument::default())?;
        info!("Feedback ledger cleared (backup: {:?})", backup);
        Ok(backup)
    }

    pub fn info(&self) -> Option<DocumentInfo> {
        self.store.info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn ledger(dir: &TempDir) -> FeedbackLedger {
        FeedbackLedger::open(dir.path().join("feedback.json"))
    }

    fn feedback(feedback_type: &str, rating: Option<i64>, content: &str) -> NewFeedback {
        NewFeedback {
            feedback_type: feedback_type.to_string(),
            rating,
            content: content.to_string(),
            contact: None,
        }
    }

    #[test]
    fn test_classify_feedback_type() {
        assert_eq!(
            classify_feedback_type("Agent使用体验"),
            FeedbackCategory::UsageFeedback
        );
        assert_eq!(classify_feedback_type("功能建议"), FeedbackCategory::Suggestion);
        assert_eq!(classify_feedback_type("Bug报告"), FeedbackCategory::BugReport);
        assert_eq!(classify_feedback_type("其他反馈"), FeedbackCategory::Other);
        assert_eq!(classify_feedback_type(""), FeedbackCategory::Other);
    }

    #[test]
    fn test_usage_keywords_take_priority() {
        // Contains both a usage and a bug keyword.
        assert_eq!(
            classify_feedback_type("使用中遇到的问题"),
            FeedbackCategory::UsageFeedback
        );
    }

    #[test]
    fn test_bug_report_scenario() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        ledger
            .submit(feedback("Bug报告", Some(2), "timeout"))
            .unwrap();

        let stats = ledger.stats();
        assert_eq!(stats.bug_report, 1);
        assert_eq!(stats.average_rating, 2.0);
        assert_eq!(stats.total_feedbacks, 1);
    }

    #[test]
    fn test_average_rating_rounding_and_missing() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        ledger.submit(feedback("其他反馈", None, "no rating")).unwrap();
        assert_eq!(ledger.stats().average_rating, 0.0);

        ledger.submit(feedback("其他反馈", Some(5), "a")).unwrap();
        ledger.submit(feedback("其他反馈", Some(4), "b")).unwrap();
        ledger.submit(feedback("其他反馈", Some(4), "c")).unwrap();
        assert_eq!(ledger.stats().average_rating, 4.33);
    }

    #[test]
    fn test_rating_is_clamped() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        let high = ledger.submit(feedback("x", Some(9), "high")).unwrap();
        let low = ledger.submit(feedback("x", Some(-3), "low")).unwrap();
        assert_eq!(ledger.get(&high).unwrap().rating, Some(5));
        assert_eq!(ledger.get(&low).unwrap().rating, Some(1));
    }

    #[test]
    fn test_empty_content_rejected_before_write() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        let err = ledger.submit(feedback("Bug报告", Some(1), "   ")).unwrap_err();
        assert!(matches!(err, CareerError::InvalidInput(_)));
        assert_eq!(ledger.stats().total_feedbacks, 0);
    }

    #[test]
    fn test_recent_orders_newest_first_with_ties() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        let t0 = Utc::now();
        let a = ledger
            .submit_at(feedback("x", None, "a"), t0)
            .unwrap();
        let b = ledger
            .submit_at(feedback("x", None, "b"), t0 + Duration::seconds(10))
            .unwrap();
        let c = ledger
            .submit_at(feedback("x", None, "c"), t0)
            .unwrap();

        let ids: Vec<String> = ledger.all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b.clone(), c.clone(), a]);

        let recent: Vec<String> = ledger.recent(2).into_iter().map(|r| r.id).collect();
        assert_eq!(recent, vec![b, c]);
        assert_eq!(ledger.recent(10).len(), 3);
    }

    #[test]
    fn test_by_type_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        ledger.submit(feedback("Bug报告", Some(2), "one")).unwrap();
        ledger.submit(feedback("功能建议", Some(4), "two")).unwrap();
        assert_eq!(ledger.by_type("  bug报告 ").len(), 1);
        assert_eq!(ledger.by_type("BUG报告").len(), 1);
        assert!(ledger.by_type("bug").is_empty());
    }

    #[test]
    fn test_rating_distribution() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        ledger.submit(feedback("x", Some(5), "a")).unwrap();
        ledger.submit(feedback("x", Some(5), "b")).unwrap();
        ledger.submit(feedback("x", Some(2), "c")).unwrap();
        let dist = ledger.rating_distribution();
        assert_eq!(dist[&5], 2);
        assert_eq!(dist[&2], 1);
        assert_eq!(dist[&1], 0);
        assert_eq!(dist.len(), 5);
    }

    #[test]
    fn test_submit_echoes_to_metrics() {
        let dir = TempDir::new().unwrap();
        let metrics = Arc::new(MetricsLedger::open(dir.path().join("metrics.json")));
        let ledger = ledger(&dir).with_metrics(metrics.clone());
        ledger
            .submit(feedback("功能建议", Some(4), "add dark mode"))
            .unwrap();
        assert_eq!(metrics.performance_metrics().total_feedback, 1);
    }

    #[test]
    fn test_clear_keeps_backup() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        ledger.submit(feedback("x", Some(3), "keep me")).unwrap();
        let backup = ledger.clear().unwrap().unwrap();
        assert_eq!(ledger.stats().total_feedbacks, 0);
        let raw = std::fs::read_to_string(backup).unwrap();
        assert!(raw.contains("keep me"));
    }

    #[test]
    fn test_export_is_full_document() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        ledger.submit(feedback("功能建议", Some(4), "export me")).unwrap();
        let exported: FeedbackDocument = serde_json::from_str(&ledger.export().unwrap()).unwrap();
        assert_eq!(exported.feedbacks.len(), 1);
        assert_eq!(exported.summary.suggestion, 1);
    }

    #[test]
    fn test_summary_is_persisted() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        ledger.submit(feedback("Agent使用体验", Some(5), "great")).unwrap();
        let raw = std::fs::read_to_string(dir.path().join("feedback.json")).unwrap();
        let doc: FeedbackDocument = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc.summary.usage_feedback, 1);
        assert_eq!(doc.summary.total_feedbacks, 1);
    }
}
