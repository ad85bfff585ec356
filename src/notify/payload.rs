//! Webhook message model
//!
//! One coloured attachment per notification. The first section carries
//! the message and call site with service metadata as side fields; the
//! rendered log fields follow after a divider.

use super::render::RenderedFields;
use crate::core::log_entry::LogEntry;
use crate::stackdriver::schema::ServiceContext;
use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Most fields a single section block accepts
pub const SECTION_FIELD_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub color: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
    },
    Divider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            kind: "mrkdwn".to_string(),
            text: text.into(),
        }
    }
}

impl WebhookMessage {
    /// Assemble the notification for one entry
    pub fn build(
        entry: &LogEntry,
        service: &ServiceContext,
        fields: RenderedFields,
        color: &str,
    ) -> Self {
        let caller = entry
            .call_site
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "undefined".to_string());

        let mut meta = vec![
            TextObject::mrkdwn(format!("*Service*\n{}", service.service)),
            TextObject::mrkdwn(format!("*Version*\n{}", service.version)),
            TextObject::mrkdwn(format!(
                "*Time*\n{}",
                entry
                    .timestamp
                    .with_timezone(&Local)
                    .to_rfc3339_opts(SecondsFormat::Secs, true)
            )),
        ];
        if let Some(error) = &fields.error {
            meta.push(TextObject::mrkdwn(error.to_mrkdwn()));
        }

        let mut blocks = vec![Block::Section {
            text: Some(TextObject::mrkdwn(format!(
                "*{}*\n{}",
                entry.message, caller
            ))),
            fields: meta,
        }];

        if !fields.body.is_empty() {
            blocks.push(Block::Divider);
            for chunk in fields.body.chunks(SECTION_FIELD_LIMIT) {
                blocks.push(Block::Section {
                    text: None,
                    fields: chunk
                        .iter()
                        .map(|f| TextObject::mrkdwn(f.to_mrkdwn()))
                        .collect(),
                });
            }
        }

        Self {
            attachments: vec![Attachment {
                color: color.to_string(),
                blocks,
            }],
        }
    }

    /// Every mrkdwn text in the message, in block order
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for attachment in &self.attachments {
            for block in &attachment.blocks {
                if let Block::Section { text, fields } = block {
                    if let Some(t) = text {
                        out.push(t.text.as_str());
                    }
                    out.extend(fields.iter().map(|f| f.text.as_str()));
                }
            }
        }
        out
    }
}
