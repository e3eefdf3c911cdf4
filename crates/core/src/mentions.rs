//! Mention parsing over conversation history.
//!
//! Users reference attached files (`@image-1`) and reusable assets
//! (`@stacy`) inline in free text. This module is pure parsing: it scans an
//! immutable, typed conversation history and produces label registries and
//! ordered mention lists. Resolution against the database happens in the
//! pipeline crate.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::types::DbId;

/// Inline reference token pattern (`@label`).
fn mention_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@([A-Za-z0-9-]+)").expect("valid mention pattern"))
}

/// One part of a conversation message, as sent by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    /// Free text, possibly containing `@label` tokens.
    Text { text: String },
    /// An attached upload. `label` is the token the user refers to it by.
    File {
        label: Option<String>,
        upload_id: Option<DbId>,
        mime_type: Option<String>,
    },
    /// A tagged reusable asset (element).
    Asset {
        label: Option<String>,
        element_id: DbId,
    },
}

/// One message in the conversation history.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationMessage {
    pub role: String,
    pub parts: Vec<MessagePart>,
}

/// A labelled upload discovered in the history.
#[derive(Debug, Clone)]
pub struct UploadRef {
    pub label: String,
    pub upload_id: DbId,
    pub mime_type: Option<String>,
}

/// A labelled element discovered in the history.
#[derive(Debug, Clone)]
pub struct AssetRef {
    pub label: String,
    pub element_id: DbId,
}

/// Extract `@label` tokens from free text in first-seen order, deduplicated.
///
/// Incidental `@word` patterns that do not correspond to a real reference
/// are returned too; callers skip labels absent from the registries.
pub fn extract_mentions_in_order(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for cap in mention_pattern().captures_iter(text) {
        let label = cap[1].to_string();
        if seen.insert(label.clone()) {
            out.push(label);
        }
    }
    out
}

/// True if `text` is exactly one `@label` token (used as a caption for the
/// part that follows it).
fn sole_label(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let caps = mention_pattern().captures(trimmed)?;
    if caps.get(0).map(|m| m.as_str()) == Some(trimmed) {
        Some(caps[1].to_string())
    } else {
        None
    }
}

/// Map labels to attached uploads.
///
/// A file part is labelled either by its own `label` field or by an
/// immediately preceding text part consisting solely of `@label`. Later
/// attachments with the same label win, matching how users re-attach files.
pub fn build_upload_registry(messages: &[ConversationMessage]) -> HashMap<String, UploadRef> {
    let mut registry = HashMap::new();
    for message in messages {
        let mut last_label: Option<String> = None;
        for part in &message.parts {
            match part {
                MessagePart::Text { text } => {
                    last_label = sole_label(text);
                }
                MessagePart::File {
                    label,
                    upload_id,
                    mime_type,
                } => {
                    let label = label.clone().or(last_label.take());
                    if let (Some(label), Some(upload_id)) = (label, *upload_id) {
                        registry.insert(
                            label.clone(),
                            UploadRef {
                                label,
                                upload_id,
                                mime_type: mime_type.clone(),
                            },
                        );
                    }
                    last_label = None;
                }
                MessagePart::Asset { .. } => {
                    last_label = None;
                }
            }
        }
    }
    registry
}

/// Map labels to tagged elements.
pub fn build_asset_registry(messages: &[ConversationMessage]) -> HashMap<String, AssetRef> {
    let mut registry = HashMap::new();
    for message in messages {
        let mut last_label: Option<String> = None;
        for part in &message.parts {
            match part {
                MessagePart::Text { text } => {
                    last_label = sole_label(text);
                }
                MessagePart::Asset { label, element_id } => {
                    let label = label.clone().or(last_label.take());
                    if let Some(label) = label {
                        registry.insert(
                            label.clone(),
                            AssetRef {
                                label,
                                element_id: *element_id,
                            },
                        );
                    }
                    last_label = None;
                }
                MessagePart::File { .. } => {
                    last_label = None;
                }
            }
        }
    }
    registry
}

/// Concatenated text of the most recent user message, used for mention
/// mining alongside the prompt itself.
pub fn last_user_text(messages: &[ConversationMessage]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| {
            m.parts
                .iter()
                .filter_map(|p| match p {
                    MessagePart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}
