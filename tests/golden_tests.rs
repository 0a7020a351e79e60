//! Golden tests - fixture-based tests that lock expected behavior
//!
//! These tests use JSON fixtures to verify that the classification tables
//! and the on-disk document formats keep producing the same results. Any
//! change in behavior will cause these tests to fail, signaling a potential
//! breaking change for existing data directories.
//!
//! Run with: cargo test --test golden_tests

use serde::Deserialize;
use std::fs;

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e))
}

#[derive(Debug, Deserialize)]
struct TestCase<T> {
    name: String,
    input: String,
    expected: T,
}

#[derive(Debug, Deserialize)]
struct Fixture<T> {
    test_cases: Vec<TestCase<T>>,
}

// ============================================================================
// FEEDBACK CLASSIFICATION GOLDEN TESTS
// ============================================================================

mod feedback_golden {
    use super::*;
    use career_advisor::storage::classify_feedback_type;
    use career_advisor::types::FeedbackCategory;

    #[test]
    fn test_feedback_classification_golden() {
        let fixture: Fixture<FeedbackCategory> =
            serde_json::from_str(&fixture("feedback_classification.json"))
                .expect("Failed to parse fixture JSON");

        for case in fixture.test_cases {
            let result = classify_feedback_type(&case.input);
            assert_eq!(
                result, case.expected,
                "Case '{}': input={:?}, expected={:?}, got={:?}",
                case.name, case.input, case.expected, result
            );
        }
    }
}

// ============================================================================
// INTENT CLASSIFICATION GOLDEN TESTS
// ============================================================================

mod intent_golden {
    use super::*;
    use career_advisor::intelligence::{classify_intent, ConversationMode};

    #[test]
    fn test_intent_classification_golden() {
        let fixture: Fixture<ConversationMode> =
            serde_json::from_str(&fixture("intent_classification.json"))
                .expect("Failed to parse fixture JSON");

        for case in fixture.test_cases {
            let result = classify_intent(&case.input);
            assert_eq!(
                result, case.expected,
                "Case '{}': input={:?}, expected={}, got={}",
                case.name, case.input, case.expected, result
            );
        }
    }
}

// ============================================================================
// PROFILE EXTRACTION GOLDEN TESTS
// ============================================================================

mod profile_golden {
    use super::*;
    use career_advisor::intelligence::{detect_profile_attribute, ProfileAttribute};

    #[test]
    fn test_profile_extraction_golden() {
        let fixture: Fixture<Option<ProfileAttribute>> =
            serde_json::from_str(&fixture("profile_extraction.json"))
                .expect("Failed to parse fixture JSON");

        for case in fixture.test_cases {
            let result = detect_profile_attribute(&case.input);
            assert_eq!(
                result, case.expected,
                "Case '{}': input={:?}, expected={:?}, got={:?}",
                case.name, case.input, case.expected, result
            );
        }
    }
}

// ============================================================================
// LEGACY DOCUMENT GOLDEN TESTS
// ============================================================================

mod legacy_documents {
    use super::*;
    use career_advisor::storage::{FeedbackLedger, MetricsLedger};
    use career_advisor::types::{ApiCallOutcome, NewFeedback};
    use tempfile::TempDir;

    fn install(dir: &TempDir, fixture_name: &str, target: &str) -> std::path::PathBuf {
        let path = dir.path().join(target);
        fs::write(&path, fixture(fixture_name)).unwrap();
        path
    }

    fn no_quarantine(dir: &TempDir) -> bool {
        fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .all(|e| !e.file_name().to_string_lossy().contains(".corrupt-"))
    }

    #[test]
    fn test_legacy_feedback_document_loads() {
        let dir = TempDir::new().unwrap();
        let path = install(&dir, "legacy_feedback.json", "feedback.json");
        let ledger = FeedbackLedger::open(&path);

        // The stored summary is stale; stats come from the records.
        let stats = ledger.stats();
        assert_eq!(stats.total_feedbacks, 3);
        assert_eq!(stats.bug_report, 1);
        assert_eq!(stats.suggestion, 1);
        assert_eq!(stats.other, 1);
        assert_eq!(stats.usage_feedback, 0);
        assert_eq!(stats.average_rating, 3.5);

        let ids: Vec<String> = ledger.recent(10).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c9d0e1f2", "e5f6a7b8", "a1b2c3d4"]);

        let bug = ledger.get("a1b2c3d4").unwrap();
        assert_eq!(bug.contact.as_deref(), Some("user@example.com"));
        assert!(no_quarantine(&dir));

        // Reading never rewrites the file.
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            fixture("legacy_feedback.json")
        );
    }

    #[test]
    fn test_fresh_legacy_feedback_document_loads() {
        let dir = TempDir::new().unwrap();
        let path = install(&dir, "legacy_feedback_empty.json", "feedback.json");
        let ledger = FeedbackLedger::open(&path);

        assert_eq!(ledger.stats().total_feedbacks, 0);
        ledger
            .submit(NewFeedback {
                feedback_type: "Bug报告".to_string(),
                rating: Some(1),
                content: "页面打不开".to_string(),
                contact: None,
            })
            .unwrap();

        let stats = ledger.stats();
        assert_eq!(stats.total_feedbacks, 1);
        assert_eq!(stats.bug_report, 1);
        assert!(no_quarantine(&dir));
    }

    #[test]
    fn test_legacy_feedback_document_accepts_new_records() {
        let dir = TempDir::new().unwrap();
        let path = install(&dir, "legacy_feedback.json", "feedback.json");
        let ledger = FeedbackLedger::open(&path);
        ledger
            .submit(NewFeedback {
                feedback_type: "Agent使用体验".to_string(),
                rating: Some(4),
                content: "回答很专业".to_string(),
                contact: None,
            })
            .unwrap();

        let stats = ledger.stats();
        assert_eq!(stats.total_feedbacks, 4);
        assert_eq!(stats.usage_feedback, 1);
        assert_eq!(stats.average_rating, 3.67);
        assert!(no_quarantine(&dir));

        // The rewritten summary uses the current counters.
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["feedbacks"].as_array().unwrap().len(), 4);
        assert_eq!(raw["summary"]["usage_feedback"], 1);
        assert!(raw["summary"].get("agent_feedback").is_none());
    }

    #[test]
    fn test_legacy_metrics_document_loads() {
        let dir = TempDir::new().unwrap();
        let path = install(&dir, "legacy_metrics.json", "metrics.json");
        let ledger = MetricsLedger::open(&path);

        let perf = ledger.performance_metrics();
        assert_eq!(perf.total_api_calls, 3);
        assert_eq!(perf.successful_calls, 2);
        assert_eq!(perf.failed_calls, 1);
        assert_eq!(perf.average_response_time, 2.0);
        assert_eq!(perf.success_rate, 66.67);
        assert_eq!(perf.total_sessions, 1);
        assert_eq!(perf.total_feedback, 1);

        ledger
            .record_api_call(ApiCallOutcome {
                success: true,
                response_time: Some(3.0),
                ..Default::default()
            })
            .unwrap();
        let perf = ledger.performance_metrics();
        assert_eq!(perf.total_api_calls, 4);
        assert_eq!(perf.total_response_time, 7.0);
        assert_eq!(perf.average_response_time, 2.33);
        assert_eq!(perf.success_rate, 75.0);
        assert!(no_quarantine(&dir));
    }
}
