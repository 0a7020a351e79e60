//! Career Advisor - career-advice chat assistant
//!
//! A keyword-driven conversation agent in front of an OpenAI-compatible chat
//! API, with persisted user feedback and usage metrics for the admin views.

pub mod agent;
pub mod api;
pub mod completion;
pub mod config;
pub mod error;
pub mod intelligence;
pub mod storage;
pub mod types;

pub use error::{CareerError, Result};
pub use storage::{FeedbackLedger, MetricsLedger};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
