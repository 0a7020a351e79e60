//! Per-user chat session state
//!
//! A session is owned by whoever drives the conversation (a CLI loop or one
//! slot in the HTTP session registry) and is never shared between users.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

use crate::intelligence::{classify_intent, ConversationMode, ProfileAttribute, UserProfile};
use crate::types::{ChatMessage, ChatRole};

/// Entries kept in the conversation buffer (four exchanges)
pub const HISTORY_LIMIT: usize = 8;

/// FIFO window over the most recent chat messages
#[derive(Debug, Clone)]
pub struct ConversationBuffer {
    messages: VecDeque<ChatMessage>,
    limit: usize,
}

impl Default for ConversationBuffer {
    fn default() -> Self {
        Self::new(HISTORY_LIMIT)
    }
}

impl ConversationBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(limit + 1),
            limit,
        }
    }

    /// Append a message, dropping the oldest entries beyond the limit
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
    }

    /// Append a user message and the assistant reply to it
    pub fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.push(ChatMessage::user(user));
        self.push(ChatMessage::assistant(assistant));
    }

    /// The last `n` entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<ChatMessage> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Snapshot for status displays
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub state: ConversationMode,
    pub profile_items: usize,
    pub conversation_count: usize,
    pub user_profile: UserProfile,
}

/// Counts over the buffered conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    pub total_turns: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub last_user_input: Option<String>,
    pub current_state: ConversationMode,
}

/// One user's conversation: buffer, inferred profile and current mode
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: String,
    created_at: DateTime<Utc>,
    mode: ConversationMode,
    profile: UserProfile,
    history: ConversationBuffer,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            mode: ConversationMode::General,
            profile: UserProfile::new(),
            history: ConversationBuffer::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn mode(&self) -> ConversationMode {
        self.mode
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn history(&self) -> &ConversationBuffer {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut ConversationBuffer {
        &mut self.history
    }

    /// Update mode and profile from a new user message
    pub fn observe(&mut self, input: &str) -> (ConversationMode, Option<ProfileAttribute>) {
        self.mode = classify_intent(input);
        let attr = self.profile.observe(input);
        (self.mode, attr)
    }

    /// Forget the conversation, the profile and the mode
    pub fn clear(&mut self) {
        self.history.clear();
        self.profile.clear();
        self.mode = ConversationMode::General;
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.id.clone(),
            state: self.mode,
            profile_items: self.profile.len(),
            conversation_count: self.history.len(),
            user_profile: self.profile.clone(),
        }
    }

    pub fn summary(&self) -> ConversationSummary {
        let user: Vec<&ChatMessage> = self
            .history
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .collect();
        let assistant = self
            .history
            .iter()
            .filter(|m| m.role == ChatRole::Assistant)
            .count();
        ConversationSummary {
            total_turns: self.history.len(),
            user_messages: user.len(),
            assistant_messages: assistant,
            last_user_input: user.last().map(|m| m.content.clone()),
            current_state: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_buffer_keeps_last_four_exchanges() {
        let mut buffer = ConversationBuffer::default();
        for i in 0..5 {
            buffer.record_exchange(&format!("q{}", i), &format!("a{}", i));
        }
        assert_eq!(buffer.len(), 8);
        let contents: Vec<String> = buffer.iter().map(|m| m.content.clone()).collect();
        assert_eq!(
            contents,
            vec!["q1", "a1", "q2", "a2", "q3", "a3", "q4", "a4"]
        );
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let mut buffer = ConversationBuffer::new(8);
        buffer.record_exchange("q0", "a0");
        buffer.record_exchange("q1", "a1");
        let tail: Vec<String> = buffer.recent(3).into_iter().map(|m| m.content).collect();
        assert_eq!(tail, vec!["a0", "q1", "a1"]);
        assert_eq!(buffer.recent(10).len(), 4);
    }

    #[test]
    fn test_observe_and_clear() {
        let mut session = ChatSession::with_id("s1");
        let (mode, attr) = session.observe("我今年25岁，想改简历");
        assert_eq!(mode, ConversationMode::Resume);
        assert_eq!(attr, Some(ProfileAttribute::Age));
        session.history_mut().record_exchange("hi", "hello");

        let status = session.status();
        assert_eq!(status.session_id, "s1");
        assert_eq!(status.profile_items, 1);
        assert_eq!(status.conversation_count, 2);

        session.clear();
        assert_eq!(session.mode(), ConversationMode::General);
        assert!(session.profile().is_empty());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_summary() {
        let mut session = ChatSession::new();
        assert_eq!(session.summary().last_user_input, None);
        session.history_mut().record_exchange("first", "one");
        session.history_mut().record_exchange("second", "two");
        let summary = session.summary();
        assert_eq!(summary.total_turns, 4);
        assert_eq!(summary.user_messages, 2);
        assert_eq!(summary.assistant_messages, 2);
        assert_eq!(summary.last_user_input.as_deref(), Some("second"));
    }
}
