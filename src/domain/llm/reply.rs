//! Structured reply contracts for the conversation and validation modes.
//!
//! Model output is schema-checked at this boundary: a reply that does not
//! deserialize into the expected shape is a recoverable parse error, never a
//! set of guessed field values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::session::Intent;
use crate::domain::DomainError;

/// Phrases that claim a booking/order is finalized. Replies produced before
/// the side-effecting step must never contain one, since persistence may
/// still fail downstream.
static COMMIT_PHRASES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(is|has been|was|successfully)\s+(booked|confirmed|scheduled|placed)\b")
        .unwrap()
});

/// Check whether an assistant reply contains a commit phrase.
pub fn contains_commit_phrase(text: &str) -> bool {
    COMMIT_PHRASES.is_match(text)
}

/// Envelope returned by the conversation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationReply {
    pub reply: String,
    pub intent: Intent,
    #[serde(default)]
    pub entities: Map<String, Value>,
    pub ready_for_routing: bool,
}

/// Envelope returned by the appointment validation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationReply {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub day: Option<String>,
    pub confirmed_by_user: bool,
}

impl ConversationReply {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        parse_json_reply(raw)
    }
}

impl ConfirmationReply {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        parse_json_reply(raw)
    }
}

fn parse_json_reply<T: for<'de> Deserialize<'de>>(raw: &str) -> Result<T, DomainError> {
    let stripped = strip_code_fences(raw);
    serde_json::from_str(stripped)
        .map_err(|e| DomainError::validation(format!("Malformed structured reply: {}", e)))
}

/// Models occasionally wrap JSON in a markdown fence; tolerate that, nothing
/// more.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Validation models return doctor ids as numbers or strings; accept both.
fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
