//! Review mention structures

use serde::{Deserialize, Serialize};

/// A dish mentioned positively in reviews, with a supporting excerpt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishMention {
    pub dish: String,
    pub quote: String,
}

/// Review mention payload, cached per (run, URL hash).
///
/// Soft failures (unsupported URL, no reviews found) are expressed as a
/// successful result with empty mentions and a descriptive message, never
/// as an error status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewMentionResult {
    #[serde(default)]
    pub mentions: Vec<DishMention>,
    pub review_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReviewMentionResult {
    /// Empty result with a descriptive message ("nothing to show")
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            mentions: Vec::new(),
            review_count: 0,
            error: None,
            message: Some(message.into()),
        }
    }

    /// Soft rejection of a malformed or unsupported URL
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self {
            mentions: Vec::new(),
            review_count: 0,
            error: Some("invalid_url".to_string()),
            message: Some(message.into()),
        }
    }
}
