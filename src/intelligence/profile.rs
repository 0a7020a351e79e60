//! User profile extraction
//!
//! A profile maps an attribute to the last raw message that mentioned it.
//! At most one attribute is updated per message: the first matching rule.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Profile attribute inferred from a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileAttribute {
    Age,
    Education,
    Experience,
    Skills,
    Goals,
}

impl ProfileAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileAttribute::Age => "age",
            ProfileAttribute::Education => "education",
            ProfileAttribute::Experience => "experience",
            ProfileAttribute::Skills => "skills",
            ProfileAttribute::Goals => "goals",
        }
    }
}

/// Ordered extraction rules
pub const PROFILE_RULES: &[(ProfileAttribute, &[&str])] = &[
    (
        ProfileAttribute::Age,
        &["我今年", "年龄", "岁", "years old"],
    ),
    (
        ProfileAttribute::Education,
        &["我学", "学历", "专业", "毕业", "degree", "major", "graduated"],
    ),
    (
        ProfileAttribute::Experience,
        &["我工作", "经验", "从业", "在职", "i work", "experience"],
    ),
    (
        ProfileAttribute::Skills,
        &["我会", "技能", "擅长", "熟悉", "i can", "skilled"],
    ),
    (
        ProfileAttribute::Goals,
        &["我想", "目标", "希望", "打算", "i want", "goal"],
    ),
];

/// Attribute a message talks about, if any
pub fn detect_profile_attribute(input: &str) -> Option<ProfileAttribute> {
    let lower = input.to_lowercase();
    PROFILE_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(attr, _)| *attr)
}

/// What the user has said about themselves in this session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile {
    entries: BTreeMap<ProfileAttribute, String>,
}

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `input` under the detected attribute, replacing any previous value
    pub fn observe(&mut self, input: &str) -> Option<ProfileAttribute> {
        let attr = detect_profile_attribute(input)?;
        self.entries.insert(attr, input.to_string());
        Some(attr)
    }

    pub fn get(&self, attr: ProfileAttribute) -> Option<&str> {
        self.entries.get(&attr).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
