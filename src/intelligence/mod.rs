//! Lightweight message understanding
//!
//! Provides:
//! - Conversation mode detection from keyword rules
//! - Profile attribute extraction
//! - Topic-specific guidance snippets for prompts

pub mod intent;
pub mod knowledge;
pub mod profile;

pub use intent::{classify_intent, matching_modes, ConversationMode, MODE_RULES};
pub use knowledge::{relevant_knowledge, KnowledgeTopic, KNOWLEDGE_BASE};
pub use profile::{detect_profile_attribute, ProfileAttribute, UserProfile, PROFILE_RULES};
