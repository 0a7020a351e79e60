//! Metrics ledger
//!
//! Records every remote completion call, every finished chat exchange and a
//! preview of every feedback submission in `metrics.json`, keeping lifetime
//! counters and per-day buckets up to date on each write.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use std::path::PathBuf;
use tracing::{debug, warn};

use super::document::{DocumentInfo, DocumentStore};
use crate::error::Result;
use crate::types::{
    preview, round2, ApiCallOutcome, ApiCallRecord, DailyStat, DailyStatRow, FeedbackEcho,
    FeedbackRecord, MetricsDocument, PerformanceMetrics, RecentActivity, SessionRecord,
    FEEDBACK_PREVIEW_CHARS, INPUT_PREVIEW_CHARS, RESPONSE_PREVIEW_CHARS,
};

/// Daily bucket key for a local calendar date
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Upper bound on the daily series length
pub const MAX_DAILY_DAYS: u32 = 366;

fn local_day(ts: DateTime<Utc>) -> String {
    day_key(ts.with_timezone(&Local).date_naive())
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Persisted usage metrics
pub struct MetricsLedger {
    store: DocumentStore<MetricsDocument>,
}

impl MetricsLedger {
    /// Open the ledger at `path`, creating the document if needed
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = DocumentStore::new(path);
        if let Err(e) = store.ensure() {
            warn!("Metrics document not initialized: {}", e);
        }
        Self { store }
    }

    /// Append an API call and update lifetime and daily counters
    pub fn record_api_call(&self, outcome: ApiCallOutcome) -> Result<()> {
        self.record_api_call_at(outcome, Utc::now())
    }

    pub(crate) fn record_api_call_at(
        &self,
        outcome: ApiCallOutcome,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut doc = self.store.load();

        // Failed calls never contribute a response time.
        let response_time = outcome.response_time.filter(|_| outcome.success);

        doc.api_calls.push(ApiCallRecord {
            timestamp: now,
            success: outcome.success,
            response_time: outcome.response_time,
            user_input_preview: outcome
                .input_preview
                .as_deref()
                .map(|s| preview(s, INPUT_PREVIEW_CHARS)),
            error_msg: outcome.error_msg,
        });

        let perf = &mut doc.performance_metrics;
        perf.total_api_calls += 1;
        if outcome.success {
            perf.successful_calls += 1;
            perf.total_response_time += response_time.unwrap_or(0.0);
            perf.average_response_time = perf.total_response_time / perf.successful_calls as f64;
        } else {
            perf.failed_calls += 1;
        }

        let day = doc.daily_stats.entry(local_day(now)).or_default();
        day.api_calls += 1;
        if outcome.success {
            day.successful_calls += 1;
            day.total_response_time += response_time.unwrap_or(0.0);
        } else {
            day.failed_calls += 1;
        }

        debug!(
            "API call recorded (success={}, total={})",
            outcome.success, doc.performance_metrics.total_api_calls
        );
        self.store.save(&doc)
    }

    /// Append a finished chat exchange
    pub fn record_session(
        &self,
        input_preview: Option<&str>,
        response_preview: Option<&str>,
    ) -> Result<()> {
        self.record_session_at(input_preview, response_preview, Utc::now())
    }

    pub(crate) fn record_session_at(
        &self,
        input_preview: Option<&str>,
        response_preview: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut doc = self.store.load();
        doc.sessions.push(SessionRecord {
            timestamp: now,
            user_input_preview: input_preview.map(|s| preview(s, INPUT_PREVIEW_CHARS)),
            response_preview: response_preview.map(|s| preview(s, RESPONSE_PREVIEW_CHARS)),
        });
        // The bucket is created here too, so sessions on a day without API
        // calls are still counted.
        doc.daily_stats.entry(local_day(now)).or_default().sessions += 1;
        self.store.save(&doc)
    }

    /// Append a dashboard preview of a feedback submission
    pub fn record_feedback(&self, feedback: &FeedbackRecord) -> Result<()> {
        let mut doc = self.store.load();
        doc.user_feedback.push(FeedbackEcho {
            timestamp: Utc::now(),
            rating: feedback.rating,
            feedback_type: Some(feedback.feedback_type.clone()),
            content_preview: preview(&feedback.content, FEEDBACK_PREVIEW_CHARS),
        });
        self.store.save(&doc)
    }

    /// Lifetime performance figures
    pub fn performance_metrics(&self) -> PerformanceMetrics {
        let doc = self.store.load();
        let perf = &doc.performance_metrics;
        PerformanceMetrics {
            total_api_calls: perf.total_api_calls,
            successful_calls: perf.successful_calls,
            failed_calls: perf.failed_calls,
            total_response_time: perf.total_response_time,
            average_response_time: round2(perf.average_response_time),
            success_rate: round2(percentage(perf.successful_calls, perf.total_api_calls)),
            total_sessions: doc.sessions.len(),
            total_feedback: doc.user_feedback.len(),
        }
    }

    /// Calls and sessions newer than `window_hours` ago. A window reaching
    /// past the representable range covers everything.
    pub fn recent_activity(&self, window_hours: i64) -> RecentActivity {
        self.recent_activity_at(window_hours, Utc::now())
    }

    pub(crate) fn recent_activity_at(&self, window_hours: i64, now: DateTime<Utc>) -> RecentActivity {
        let doc = self.store.load();
        let cutoff = Duration::try_hours(window_hours.max(0))
            .and_then(|window| now.checked_sub_signed(window));
        let inside = |ts: DateTime<Utc>| cutoff.map_or(true, |cutoff| ts > cutoff);

        let calls: Vec<&ApiCallRecord> = doc
            .api_calls
            .iter()
            .filter(|c| inside(c.timestamp))
            .collect();
        let successes = calls.iter().filter(|c| c.success).count();
        let sessions = doc.sessions.iter().filter(|s| inside(s.timestamp)).count();

        RecentActivity {
            recent_api_calls: calls.len(),
            recent_sessions: sessions,
            recent_success_rate: round2(percentage(successes as u64, calls.len() as u64)),
        }
    }

    /// One row per day for the last `days` days ending today, oldest first.
    /// At most [`MAX_DAILY_DAYS`] rows are returned.
    pub fn daily_stats(&self, days: u32) -> Vec<DailyStatRow> {
        self.daily_stats_ending(days, Local::now().date_naive())
    }

    pub(crate) fn daily_stats_ending(&self, days: u32, today: NaiveDate) -> Vec<DailyStatRow> {
        let doc = self.store.load();
        (0..days.min(MAX_DAILY_DAYS) as i64)
            .rev()
            .filter_map(|offset| today.checked_sub_signed(Duration::days(offset)))
            .map(|date| {
                let date = day_key(date);
                let stat = doc.daily_stats.get(&date).cloned().unwrap_or_default();
                daily_row(date, &stat)
            })
            .collect()
    }

    pub fn info(&self) -> Option<DocumentInfo> {
        self.store.info()
    }
}

fn daily_row(date: String, stat: &DailyStat) -> DailyStatRow {
    let average_response_time = if stat.successful_calls > 0 {
        round2(stat.total_response_time / stat.successful_calls as f64)
    } else {
        0.0
    };
    DailyStatRow {
        date,
        api_calls: stat.api_calls,
        successful_calls: stat.successful_calls,
        failed_calls: stat.failed_calls,
        total_response_time: stat.total_response_time,
        sessions: stat.sessions,
        success_rate: round2(percentage(stat.successful_calls, stat.api_calls)),
        average_response_time,
    }
}
