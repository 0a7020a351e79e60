//! Storage engine for the career advisor
//!
//! Each ledger owns one JSON document that is read and rewritten whole on
//! every operation.

mod document;
mod feedback;
mod metrics;

pub use document::{DocumentInfo, DocumentStore};
pub use feedback::{
    clamp_rating, classify_feedback_type, summarize, FeedbackLedger, CATEGORY_RULES,
    DEFAULT_FEEDBACK_TYPE,
};
pub use metrics::{day_key, MetricsLedger, MAX_DAILY_DAYS};
