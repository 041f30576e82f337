//! Stage and checklist commands.
//!
//! Checklist edits are optimistic: the local list changes first, and a failed
//! request restores it before the error is reported.

use serde::Serialize;

use super::{Output, json};
use crate::client::ApiClient;
use crate::models::{ChecklistItem, DesignStatus, Stage};
use crate::optimistic::{ReorderCommand, ToggleCommand, item_ids, run_optimistic};
use crate::toast::ToastCenter;
use crate::{Error, Result};

impl Output for Stage {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("{} ({}) {}", self.name, self.status, self.id)];
        for section in &self.sections {
            let done = if section.completed { "✓" } else { " " };
            lines.push(format!(
                "  [{}] {} ({})",
                done,
                section.section_type.label(),
                section.status
            ));
        }
        lines.join("\n")
    }
}

/// A stage's checklist in display order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub stage_id: String,
    pub items: Vec<ChecklistItem>,
}

impl Output for Checklist {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.items.is_empty() {
            return format!("Checklist for {} is empty.", self.stage_id);
        }
        let done = self.items.iter().filter(|i| i.completed).count();
        let mut lines = vec![format!("{}/{} complete", done, self.items.len())];
        for item in &self.items {
            let mark = if item.completed { "x" } else { " " };
            lines.push(format!("{:>3}. [{}] {} ({})", item.position.saturating_add(1), mark, item.title, item.id));
        }
        lines.join("\n")
    }
}

pub async fn stage_show(client: &ApiClient, stage_id: &str) -> Result<Stage> {
    Ok(client.get_stage(stage_id).await?)
}

pub async fn stage_status(client: &ApiClient, stage_id: &str, status: DesignStatus) -> Result<Stage> {
    Ok(client.update_stage_status(stage_id, status).await?)
}

pub async fn checklist_list(client: &ApiClient, stage_id: &str) -> Result<Checklist> {
    let mut items = client.list_checklist(stage_id).await?;
    items.sort_by_key(|i| i.position);
    Ok(Checklist {
        stage_id: stage_id.to_string(),
        items,
    })
}

/// Flip an item's completion, reverting locally if the server refuses.
pub async fn checklist_toggle(
    client: &ApiClient,
    stage_id: &str,
    item_id: &str,
    toasts: &mut ToastCenter,
) -> Result<Checklist> {
    let mut checklist = checklist_list(client, stage_id).await?;
    let command = ToggleCommand::new(item_id);

    let completed = run_optimistic(&mut checklist.items, command, |items| {
        let completed = items
            .iter()
            .find(|i| i.id == item_id)
            .is_some_and(|i| i.completed);
        async move {
            client
                .set_checklist_item(stage_id, item_id, completed)
                .await
                .map(|()| completed)
        }
    })
    .await?;

    toasts.success(if completed {
        format!("Checked off {}", item_id)
    } else {
        format!("Unchecked {}", item_id)
    });
    Ok(checklist)
}

/// Move an item to `position`, reverting locally if the new order is rejected.
pub async fn checklist_move(
    client: &ApiClient,
    stage_id: &str,
    item_id: &str,
    position: usize,
    toasts: &mut ToastCenter,
) -> Result<Checklist> {
    let mut checklist = checklist_list(client, stage_id).await?;
    let from = checklist
        .items
        .iter()
        .position(|i| i.id == item_id)
        .ok_or_else(|| Error::NotFound(format!("Checklist item not found: {}", item_id)))?;

    run_optimistic(&mut checklist.items, ReorderCommand::new(from, position), |items| {
        let ids = item_ids(items);
        async move { client.reorder_checklist(stage_id, &ids).await }
    })
    .await?;

    toasts.success("Checklist order saved");
    Ok(checklist)
}
