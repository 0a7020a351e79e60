//! Turn handling: classify, extract, prompt, call, record.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::session::ChatSession;
use crate::completion::{CompletionBackend, CompletionError};
use crate::error::{CareerError, Result};
use crate::intelligence::{relevant_knowledge, ConversationMode, UserProfile};
use crate::storage::MetricsLedger;
use crate::types::{round2, ApiCallOutcome, ChatMessage};

/// Buffered entries sent to the model along with the new message
pub const CONTEXT_MESSAGES: usize = 4;

/// Reply shown when the API answered with an error status
pub const HTTP_FAILURE_REPLY: &str =
    "Sorry, the advisor service rejected the request. Please check the API key and try again.";

/// Reply shown when the API could not be reached
pub const NETWORK_FAILURE_REPLY: &str =
    "Sorry, the advisor service could not be reached. Please try again in a moment.";

/// Result of one chat turn
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub content: String,
    pub mode: ConversationMode,
    pub success: bool,
    /// Seconds spent waiting for the remote API
    pub response_time: f64,
}

/// System prompt for the current mode, profile and topic notes
pub fn system_prompt(mode: ConversationMode, profile: &UserProfile, knowledge: Option<&str>) -> String {
    let profile_json = serde_json::to_string(profile).unwrap_or_else(|_| "{}".to_string());
    let mut prompt = format!(
        "You are an experienced career advisor. Listen to the user and answer their question.\n\
         \n\
         Current conversation mode: {mode}\n\
         What the user has told you about themselves: {profile_json}\n\
         \n\
         Guidelines:\n\
         1. Answer directly and professionally; do not interrogate the user for personal details.\n\
         2. Use numbered points and short headings, and bold the key terms.\n\
         3. Do not decide for the user; lay out the options with their pros and cons, all lawful.\n\
         4. Avoid any gendered, discriminatory or biased language.\n\
         5. Structure the answer as: what is known so far, concrete recommendations, \
         what makes the path hard and what level is required, and immediate next steps.\n\
         6. Be warm and encouraging; during a mock interview, be appropriately strict.\n\
         7. Reply in the language the user writes in.",
    );
    if let Some(notes) = knowledge {
        prompt.push_str("\n\nReference notes for this topic:\n");
        prompt.push_str(notes);
    }
    prompt
}

/// Full message list for a turn: system prompt, recent context, new input
pub fn build_messages(session: &ChatSession, input: &str) -> Vec<ChatMessage> {
    let knowledge = relevant_knowledge(input);
    let mut messages = Vec::with_capacity(CONTEXT_MESSAGES + 2);
    messages.push(ChatMessage::system(system_prompt(
        session.mode(),
        session.profile(),
        knowledge.as_deref(),
    )));
    messages.extend(session.history().recent(CONTEXT_MESSAGES));
    messages.push(ChatMessage::user(input));
    messages
}

fn failure_reply(error: &CompletionError) -> &'static str {
    if error.is_transport() {
        NETWORK_FAILURE_REPLY
    } else {
        HTTP_FAILURE_REPLY
    }
}

/// Drives chat turns against a completion backend and records usage
pub struct ChatOrchestrator {
    backend: Arc<dyn CompletionBackend>,
    metrics: Arc<MetricsLedger>,
}

impl ChatOrchestrator {
    pub fn new(backend: Arc<dyn CompletionBackend>, metrics: Arc<MetricsLedger>) -> Self {
        Self { backend, metrics }
    }

    pub fn metrics(&self) -> &Arc<MetricsLedger> {
        &self.metrics
    }

    /// Handle one user message.
    ///
    /// Remote failures are recorded and turned into an apologetic reply;
    /// only empty input is returned as an error.
    pub async fn respond(&self, session: &mut ChatSession, input: &str) -> Result<ChatReply> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CareerError::InvalidInput("Message cannot be empty".to_string()));
        }

        let (mode, attr) = session.observe(input);
        debug!("Turn classified as {} (profile update: {:?})", mode, attr);

        let messages = build_messages(session, input);
        let started = Instant::now();
        let result = self.backend.complete(&messages).await;
        let elapsed = started.elapsed().as_secs_f64();

        let (content, outcome) = match result {
            Ok(content) => {
                info!(
                    "Completion from {} in {:.2}s",
                    self.backend.model_name(),
                    elapsed
                );
                let outcome = ApiCallOutcome {
                    success: true,
                    response_time: Some(elapsed),
                    input_preview: Some(input.to_string()),
                    error_msg: None,
                };
                (content, outcome)
            }
            Err(e) => {
                warn!("Completion failed after {:.2}s: {}", elapsed, e);
                let outcome = ApiCallOutcome {
                    success: false,
                    response_time: Some(elapsed),
                    input_preview: Some(input.to_string()),
                    error_msg: Some(e.to_string()),
                };
                (failure_reply(&e).to_string(), outcome)
            }
        };
        let success = outcome.success;

        if let Err(e) = self.metrics.record_api_call(outcome) {
            warn!("API call not recorded: {}", e);
        }

        session.history_mut().record_exchange(input, &content);

        if let Err(e) = self.metrics.record_session(Some(input), Some(&content)) {
            warn!("Session not recorded: {}", e);
        }

        Ok(ChatReply {
            content,
            mode,
            success,
            response_time: round2(elapsed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatRole;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    /// Replies from a script and remembers what it was sent
    struct ScriptedBackend {
        replies: Mutex<Vec<std::result::Result<String, CompletionError>>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<std::result::Result<String, CompletionError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn echo() -> Self {
            Self::new(Vec::new())
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(
            &self,
            messages: &[ChatMessage],
        ) -> std::result::Result<String, CompletionError> {
            self.seen.lock().push(messages.to_vec());
            let mut replies = self.replies.lock();
            if replies.is_empty() {
                let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
                Ok(format!("re: {}", last))
            } else {
                replies.remove(0)
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn setup(backend: ScriptedBackend) -> (TempDir, Arc<ScriptedBackend>, ChatOrchestrator) {
        let dir = TempDir::new().unwrap();
        let metrics = Arc::new(MetricsLedger::open(dir.path().join("metrics.json")));
        let backend = Arc::new(backend);
        let orchestrator = ChatOrchestrator::new(backend.clone(), metrics);
        (dir, backend, orchestrator)
    }

    #[tokio::test]
    async fn test_successful_turn_records_metrics() {
        let (_dir, _backend, orchestrator) = setup(ScriptedBackend::echo());
        let mut session = ChatSession::new();

        let reply = orchestrator
            .respond(&mut session, "如何准备产品经理面试？")
            .await
            .unwrap();
        assert!(reply.success);
        assert_eq!(reply.mode, ConversationMode::Interview);
        assert_eq!(reply.content, "re: 如何准备产品经理面试？");

        let perf = orchestrator.metrics().performance_metrics();
        assert_eq!(perf.total_api_calls, 1);
        assert_eq!(perf.successful_calls, 1);
        assert_eq!(perf.total_sessions, 1);
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_http_failure_becomes_apology() {
        let (_dir, _backend, orchestrator) = setup(ScriptedBackend::new(vec![Err(
            CompletionError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        )]));
        let mut session = ChatSession::new();

        let reply = orchestrator.respond(&mut session, "hello").await.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.content, HTTP_FAILURE_REPLY);

        let perf = orchestrator.metrics().performance_metrics();
        assert_eq!(perf.failed_calls, 1);
        assert_eq!(perf.success_rate, 0.0);
        assert_eq!(perf.average_response_time, 0.0);
    }

    #[tokio::test]
    async fn test_timeout_becomes_network_apology() {
        let (_dir, _backend, orchestrator) = setup(ScriptedBackend::new(vec![Err(
            CompletionError::Transport("operation timed out".to_string()),
        )]));
        let mut session = ChatSession::new();
        let reply = orchestrator.respond(&mut session, "hello").await.unwrap();
        assert_eq!(reply.content, NETWORK_FAILURE_REPLY);
        assert_eq!(orchestrator.metrics().recent_activity(1).recent_api_calls, 1);
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let (_dir, backend, orchestrator) = setup(ScriptedBackend::echo());
        let mut session = ChatSession::new();
        let err = orchestrator.respond(&mut session, "   ").await.unwrap_err();
        assert!(matches!(err, CareerError::InvalidInput(_)));
        assert!(backend.seen.lock().is_empty());
        assert_eq!(orchestrator.metrics().performance_metrics().total_api_calls, 0);
    }

    #[tokio::test]
    async fn test_prompt_carries_recent_context() {
        let (_dir, backend, orchestrator) = setup(ScriptedBackend::echo());
        let mut session = ChatSession::new();
        for i in 0..5 {
            orchestrator
                .respond(&mut session, &format!("question {}", i))
                .await
                .unwrap();
        }
        assert_eq!(session.history().len(), 8);

        let seen = backend.seen.lock();
        let last = seen.last().unwrap();
        // system + 4 buffered + new input
        assert_eq!(last.len(), 6);
        assert_eq!(last[0].role, ChatRole::System);
        assert_eq!(last[1].content, "question 2");
        assert_eq!(last[5].content, "question 4");
    }

    #[tokio::test]
    async fn test_profile_and_knowledge_in_system_prompt() {
        let (_dir, backend, orchestrator) = setup(ScriptedBackend::echo());
        let mut session = ChatSession::new();
        orchestrator
            .respond(&mut session, "我今年25岁，想优化简历")
            .await
            .unwrap();

        let seen = backend.seen.lock();
        let system = &seen[0][0].content;
        assert!(system.contains("Current conversation mode: resume"));
        assert!(system.contains("我今年25岁"));
        assert!(system.contains("Resume writing"));
    }
}
