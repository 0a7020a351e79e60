//! Conversation mode detection
//!
//! Keyword substring rules, checked in order against the lowercased input.
//! The first rule with a hit decides the mode.

use serde::{Deserialize, Serialize};

/// Topic the current user message is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConversationMode {
    Resume,
    Interview,
    Career,
    Skills,
    Salary,
    #[default]
    General,
}

impl ConversationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationMode::Resume => "resume",
            ConversationMode::Interview => "interview",
            ConversationMode::Career => "career",
            ConversationMode::Skills => "skills",
            ConversationMode::Salary => "salary",
            ConversationMode::General => "general",
        }
    }
}

impl std::fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConversationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resume" => Ok(ConversationMode::Resume),
            "interview" => Ok(ConversationMode::Interview),
            "career" => Ok(ConversationMode::Career),
            "skills" => Ok(ConversationMode::Skills),
            "salary" => Ok(ConversationMode::Salary),
            "general" => Ok(ConversationMode::General),
            _ => Err(format!("Unknown conversation mode: {}", s)),
        }
    }
}

/// Ordered mode rules. `General` has no rule; it is the fallback.
pub const MODE_RULES: &[(ConversationMode, &[&str])] = &[
    (
        ConversationMode::Resume,
        &["简历", "cv", "resume", "求职信", "cover letter"],
    ),
    (
        ConversationMode::Interview,
        &["面试", "interview", "面经", "面试题"],
    ),
    (
        ConversationMode::Career,
        &["职业", "规划", "发展", "方向", "转行", "career"],
    ),
    (
        ConversationMode::Skills,
        &["技能", "学习", "提升", "课程", "培训", "skill", "learn", "course"],
    ),
    (
        ConversationMode::Salary,
        &["薪资", "工资", "薪水", "谈薪", "待遇", "salary"],
    ),
];

/// Mode for a single user message
pub fn classify_intent(input: &str) -> ConversationMode {
    let lower = input.to_lowercase();
    MODE_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(mode, _)| *mode)
        .unwrap_or_default()
}

/// Every mode with at least one keyword hit, in rule order
pub fn matching_modes(input: &str) -> Vec<ConversationMode> {
    let lower = input.to_lowercase();
    MODE_RULES
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(mode, _)| *mode)
        .collect()
}
