use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;

use super::Message;
use super::Role;

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumVariantNames,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatType {
    Unified,
    Syllabus,
}

impl ChatType {
    pub fn parse(text: String) -> Option<ChatType> {
        return text.parse::<ChatType>().ok();
    }

    /// Route on the course assistant API that answers this chat type.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ChatType::Unified => return "/api/chat",
            ChatType::Syllabus => return "/api/syllabus",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ChatType::Unified => return "Study Assistant",
            ChatType::Syllabus => return "Syllabus Assistant",
        }
    }

    pub fn welcome_text(&self) -> &'static str {
        match self {
            ChatType::Unified => {
                return r#"Hello! I'm your AI study assistant for WPC300 - Problem Solving and Actionable Analytics.

I can help you with:
• Course concepts and problem-solving frameworks
• Excel functions (VLOOKUP, INDEX-MATCH, Pivot Tables)
• Syllabus questions, deadlines, and grading policies
• Exam preparation and study tips

What would you like to know?"#;
            }
            ChatType::Syllabus => {
                return "Hi! I'm your course assistant for WPC300 - Problem Solving and Actionable Analytics. Ask me about deadlines, assignments, grading policies, or anything else about the course syllabus!";
            }
        }
    }

    /// Every session starts with this message. It always carries id 1.
    pub fn welcome_message(&self) -> Message {
        return Message::new(1, Role::Assistant, self.welcome_text());
    }
}
