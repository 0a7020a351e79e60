//! Core types for the career advisor
//!
//! Every persisted record is a fixed-shape struct; the two ledger documents
//! are plain serde structs so a missing top-level key fails to parse.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Maximum characters kept from a user input preview
pub const INPUT_PREVIEW_CHARS: usize = 100;

/// Maximum characters kept from an assistant response preview
pub const RESPONSE_PREVIEW_CHARS: usize = 200;

/// Maximum characters kept from a feedback content echo
pub const FEEDBACK_PREVIEW_CHARS: usize = 100;

/// Lowest accepted feedback rating
pub const MIN_RATING: u8 = 1;

/// Highest accepted feedback rating
pub const MAX_RATING: u8 = 5;

// =============================================================================
// Timestamps
// =============================================================================

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 (what this crate writes) and naive ISO-8601 timestamps
/// without an offset, which are read as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = raw.parse::<NaiveDateTime>().ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

/// Take at most `max` characters of `text`
pub fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Feedback ledger
// =============================================================================

/// Mutually exclusive bucket a feedback `type` string is counted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    UsageFeedback,
    Suggestion,
    BugReport,
    Other,
}

impl FeedbackCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackCategory::UsageFeedback => "usage_feedback",
            FeedbackCategory::Suggestion => "suggestion",
            FeedbackCategory::BugReport => "bug_report",
            FeedbackCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One submitted piece of user feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Short random identifier
    pub id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Free-form type label as chosen in the UI (e.g. "Bug报告")
    #[serde(rename = "type")]
    pub feedback_type: String,
    /// Rating in [1, 5]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// Input for a feedback submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFeedback {
    #[serde(rename = "type", default)]
    pub feedback_type: String,
    /// Raw rating; clamped into [1, 5] on submit
    #[serde(default)]
    pub rating: Option<i64>,
    pub content: String,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Aggregates derived from the full feedback list.
///
/// Always rebuilt from the records, so a stored summary with missing or
/// unknown counters still loads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackSummary {
    pub total_feedbacks: usize,
    pub average_rating: f64,
    pub usage_feedback: usize,
    pub suggestion: usize,
    pub bug_report: usize,
    pub other: usize,
}

impl FeedbackSummary {
    /// Count stored for one category
    pub fn count(&self, category: FeedbackCategory) -> usize {
        match category {
            FeedbackCategory::UsageFeedback => self.usage_feedback,
            FeedbackCategory::Suggestion => self.suggestion,
            FeedbackCategory::BugReport => self.bug_report,
            FeedbackCategory::Other => self.other,
        }
    }
}

/// On-disk feedback document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedbackDocument {
    pub feedbacks: Vec<FeedbackRecord>,
    pub summary: FeedbackSummary,
}

// =============================================================================
// Metrics ledger
// =============================================================================

/// One call to the remote completion API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCallRecord {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// Seconds
    #[serde(default)]
    pub response_time: Option<f64>,
    #[serde(default)]
    pub user_input_preview: Option<String>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

/// Outcome of a remote call, as handed to the metrics ledger
#[derive(Debug, Clone, Default)]
pub struct ApiCallOutcome {
    pub success: bool,
    pub response_time: Option<f64>,
    pub input_preview: Option<String>,
    pub error_msg: Option<String>,
}

/// One completed chat exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user_input_preview: Option<String>,
    #[serde(default)]
    pub response_preview: Option<String>,
}

/// Lightweight copy of a feedback submission kept for dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEcho {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(rename = "type", default)]
    pub feedback_type: Option<String>,
    #[serde(default)]
    pub content_preview: String,
}

/// Lifetime counters stored in the metrics document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceCounters {
    pub total_api_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub total_response_time: f64,
    pub average_response_time: f64,
}

/// Per-calendar-day bucket
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyStat {
    pub api_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub total_response_time: f64,
    pub sessions: u64,
}

/// On-disk metrics document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsDocument {
    pub api_calls: Vec<ApiCallRecord>,
    pub sessions: Vec<SessionRecord>,
    pub user_feedback: Vec<FeedbackEcho>,
    pub performance_metrics: PerformanceCounters,
    /// Keyed by local `YYYY-MM-DD`
    pub daily_stats: BTreeMap<String, DailyStat>,
}

/// Lifetime performance report
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_api_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub total_response_time: f64,
    pub average_response_time: f64,
    /// Percentage, 0 when no calls were made
    pub success_rate: f64,
    pub total_sessions: usize,
    pub total_feedback: usize,
}

/// Activity inside a trailing time window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecentActivity {
    pub recent_api_calls: usize,
    pub recent_sessions: usize,
    pub recent_success_rate: f64,
}

/// One row of the daily series; days without a bucket are all zeros
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyStatRow {
    pub date: String,
    pub api_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub total_response_time: f64,
    pub sessions: u64,
    pub success_rate: f64,
    pub average_response_time: f64,
}

// =============================================================================
// Conversation
// =============================================================================

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A role/content pair as exchanged with the completion API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Remote chat-completion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub api_key: String,
    /// API base URL; requests go to `{base_url}/chat/completions`
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl CompletionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

/// Where the ledgers keep their documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn feedback_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("feedback.json")
    }

    pub fn metrics_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("metrics.json")
    }
}
