//! Command implementations for the atl CLI.
//!
//! Commands are organized by resource:
//! - `design` - sections, comments, assets
//! - `feed` - notifications and the project update feed
//! - `stages` - stages and checklists
//! - `procurement` - deliveries and supplier quote requests
//! - `offline` - thread building and mention resolution on local files
//! - `config` - showing and changing configuration
//!
//! Every command returns a value implementing [`Output`]; the binary decides
//! whether to print it as JSON or for humans.

mod config;
mod design;
mod feed;
mod offline;
mod procurement;
mod stages;

pub use config::{ConfigSetResult, ConfigShow, config_set, config_show};
pub use design::{
    CommentThread, asset_caption, asset_delete, asset_upload, comment_add, comment_delete,
    comment_edit, comment_like, comment_list, comment_pin, comment_watch, section_complete,
    section_ensure, section_list, section_notes, section_status, team_list,
};
pub use feed::{
    notification_list, notification_read, notification_watch, update_list, update_post,
};
pub use offline::{MentionReport, TokenMatch, mentions, thread};
pub use procurement::{
    delivery_create, delivery_list, delivery_patch, delivery_update, rfq_list, rfq_send,
};
pub use stages::{Checklist, checklist_list, checklist_move, checklist_toggle, stage_show, stage_status};

use serde::Serialize;

use crate::batch::BatchSummary;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Serialize a command result, falling back to an error object.
pub(crate) fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

/// One-line description of an item in human output.
pub trait HumanLine {
    fn human_line(&self) -> String;
}

impl<T: Output + Serialize> Output for Vec<T> {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.is_empty() {
            return "(none)".to_string();
        }
        self.iter()
            .map(|item| item.to_human())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Acknowledgement for commands whose endpoint returns no body.
#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    pub ok: bool,
    pub action: &'static str,
    pub kind: &'static str,
    pub id: String,
}

impl Ack {
    pub fn new(action: &'static str, kind: &'static str, id: impl Into<String>) -> Self {
        Self {
            ok: true,
            action,
            kind,
            id: id.into(),
        }
    }
}

impl Output for Ack {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut action = self.action.to_string();
        if let Some(first) = action.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        format!("{} {} {}", action, self.kind, self.id)
    }
}

impl<R: Serialize + HumanLine> Output for BatchSummary<R> {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines: Vec<String> = self
            .succeeded
            .iter()
            .map(|r| format!("  ✓ {}", r.human_line()))
            .collect();
        lines.extend(
            self.failed
                .iter()
                .map(|f| format!("  ✗ {}: {}", f.item, f.error)),
        );
        lines.join("\n")
    }
}

impl HumanLine for String {
    fn human_line(&self) -> String {
        self.clone()
    }
}

/// Truncate text to `max` characters for one-line listings.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        single_line
    } else {
        let cut: String = single_line.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
