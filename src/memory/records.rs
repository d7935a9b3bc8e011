//! Typed shapes for the documents each namespace stores.
//!
//! The store itself only sees JSON values; these types give extractors and
//! prompt assembly a schema to agree on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What is known about the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// A subject the user has shown interest in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTopic {
    pub topic: String,
    pub when: DateTime<Utc>,
    /// 1 (mentioned in passing) to 10 (keeps coming back to it).
    pub interest_level: u8,
}

/// A correction made to the user's text, kept for later teaching.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarCorrection {
    pub original_text: String,
    pub corrected_text: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement: Option<String>,
    pub when: DateTime<Utc>,
}

/// Knowledge gathered from web search, annotated for tutoring use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebKnowledge {
    pub query: String,
    pub information: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teaching_notes: Option<String>,
    pub when: DateTime<Utc>,
}
