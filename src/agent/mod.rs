//! Career advice agent
//!
//! [`ChatSession`] holds one user's conversation; [`ChatOrchestrator`] runs a
//! turn against a completion backend and feeds the metrics ledger.

mod orchestrator;
mod session;

pub use orchestrator::{
    build_messages, system_prompt, ChatOrchestrator, ChatReply, CONTEXT_MESSAGES,
    HTTP_FAILURE_REPLY, NETWORK_FAILURE_REPLY,
};
pub use session::{
    ChatSession, ConversationBuffer, ConversationSummary, SessionStatus, HISTORY_LIMIT,
};
