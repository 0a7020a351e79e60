//! Built-in career guidance snippets
//!
//! Short reference notes appended to the system prompt when a message touches
//! one of the topics below.

use super::intent::{matching_modes, ConversationMode};

/// A titled group of guidance notes for one topic
pub struct KnowledgeTopic {
    pub mode: ConversationMode,
    pub title: &'static str,
    pub notes: &'static [(&'static str, &'static str)],
}

pub const KNOWLEDGE_BASE: &[KnowledgeTopic] = &[
    KnowledgeTopic {
        mode: ConversationMode::Resume,
        title: "Resume writing",
        notes: &[
            ("STAR", "describe each achievement as situation, task, action and a measurable result"),
            ("Quantify", "replace vague claims with numbers, e.g. latency cut from 500ms to 200ms"),
            ("Stack", "for technical roles list the tools used and the problem each one solved"),
            ("Keywords", "mirror the wording of the job posting so applicant tracking systems match it"),
        ],
    },
    KnowledgeTopic {
        mode: ConversationMode::Interview,
        title: "Interview preparation",
        notes: &[
            ("Stories", "prepare three to five detailed cases: context, your role, actions, results, lessons"),
            ("Company research", "know the product, business model, competitors and recent news"),
            ("Behavioural answers", "spend most of the answer on your own actions and the outcome"),
            ("Technical rounds", "practice problems, system design and a deep dive into one past project"),
        ],
    },
    KnowledgeTopic {
        mode: ConversationMode::Career,
        title: "Career planning",
        notes: &[
            ("Goals", "make goals specific, measurable, achievable, relevant and time-bound"),
            ("Skill gap", "compare the target role's requirements with current skills and close the gap"),
            ("Paths", "individual contributor, management and product tracks progress differently"),
        ],
    },
    KnowledgeTopic {
        mode: ConversationMode::Skills,
        title: "Skill building",
        notes: &[
            ("Milestones", "split a broad goal into monthly milestones that each end in a small project"),
            ("Evidence", "publish projects or write-ups so new skills are visible to employers"),
        ],
    },
    KnowledgeTopic {
        mode: ConversationMode::Salary,
        title: "Salary negotiation",
        notes: &[
            ("Market data", "check salary ranges on job boards for the role, city and company size"),
            ("Value", "list concrete contributions before naming a number"),
            ("Timing", "negotiate after the employer has decided they want you"),
            ("Total package", "weigh bonus, equity, benefits, training and work-life balance with base pay"),
        ],
    },
];

/// Notes for every topic the input mentions, or `None`
pub fn relevant_knowledge(input: &str) -> Option<String> {
    let modes = matching_modes(input);
    let sections: Vec<String> = KNOWLEDGE_BASE
        .iter()
        .filter(|topic| modes.contains(&topic.mode))
        .map(|topic| {
            let mut section = format!("{}:", topic.title);
            for (name, note) in topic.notes {
                section.push_str(&format!("\n- {}: {}", name, note));
            }
            section
        })
        .collect();

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}
