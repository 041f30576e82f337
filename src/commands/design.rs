//! Section, comment, asset and roster commands.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use super::{Ack, HumanLine, Output, json, truncate};
use crate::batch::{BatchSummary, run_batch};
use crate::client::{ApiClient, ApiError, UploadTarget};
use crate::mentions::{extract_tags, mentions_for_content};
use crate::models::{
    Asset, Comment, CommentNode, DesignSection, DesignStatus, NewComment, SectionPatch,
    SectionType, TeamMember, build_comment_tree, count_replies,
};
use crate::poller::SectionWatcher;
use crate::toast::ToastCenter;
use crate::Result;

// === Output ===

impl Output for DesignSection {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let done = if self.completed { "✓" } else { " " };
        let mut out = format!(
            "[{}] {} ({}) {}",
            done,
            self.section_type.label(),
            self.status,
            self.id
        );
        if let Some(notes) = self.notes.as_deref().filter(|n| !n.is_empty()) {
            out.push_str(&format!("\n    notes: {}", truncate(notes, 72)));
        }
        if !self.assets.is_empty() {
            out.push_str(&format!("\n    {} asset(s)", self.assets.len()));
        }
        out
    }
}

impl Output for Comment {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{} {}: {}", self.id, author(self), self.content);
        if !self.mentions.is_empty() {
            out.push_str(&format!("\n  mentions: {}", self.mentions.join(", ")));
        }
        if !self.tags.is_empty() {
            out.push_str(&format!("\n  tags: #{}", self.tags.join(" #")));
        }
        out
    }
}

impl Output for Asset {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        self.human_line()
    }
}

impl HumanLine for Asset {
    fn human_line(&self) -> String {
        match self.caption.as_deref() {
            Some(caption) if !caption.is_empty() => {
                format!("{} {} \"{}\"", self.id, self.filename, caption)
            }
            _ => format!("{} {}", self.id, self.filename),
        }
    }
}

impl Output for TeamMember {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{} ({})", self.name, self.id);
        if let Some(ref role) = self.role {
            out.push_str(&format!(" - {}", role));
        }
        if let Some(ref email) = self.email {
            out.push_str(&format!(" <{}>", email));
        }
        out
    }
}

fn author(comment: &Comment) -> &str {
    comment
        .author_name
        .as_deref()
        .unwrap_or(comment.author_id.as_str())
}

/// A section's comments arranged as threads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    /// Comments received, including any dropped for a missing parent
    pub total: usize,
    pub threads: Vec<CommentNode>,
}

impl CommentThread {
    pub fn new(section_id: Option<String>, comments: &[Comment]) -> Self {
        Self {
            section_id,
            total: comments.len(),
            threads: build_comment_tree(comments),
        }
    }
}

fn render_line(c: &Comment, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    let pin = if c.is_pinned { "📌 " } else { "" };
    let mut line = format!(
        "{}{}{} ({}): {}",
        indent,
        pin,
        author(c),
        c.created_at.format("%Y-%m-%d %H:%M"),
        c.content
    );
    if c.likes > 0 {
        line.push_str(&format!(" ♥{}", c.likes));
    }
    line.push_str(&format!(" [{}]", c.id));
    line
}

fn render_thread(root: &CommentNode, lines: &mut Vec<String>) {
    lines.push(render_line(&root.comment, 0));
    if !root.replies.is_empty() {
        let n = count_replies(root);
        lines.push(format!(
            "  {} {}",
            n,
            if n == 1 { "reply" } else { "replies" }
        ));
    }

    let mut stack: Vec<(&CommentNode, usize)> = root.replies.iter().rev().map(|r| (r, 1)).collect();
    while let Some((node, depth)) = stack.pop() {
        lines.push(render_line(&node.comment, depth));
        stack.extend(node.replies.iter().rev().map(|r| (r, depth + 1)));
    }
}

impl Output for CommentThread {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.threads.is_empty() {
            return "No comments.".to_string();
        }
        let mut lines = Vec::new();
        for node in &self.threads {
            render_thread(node, &mut lines);
        }
        lines.join("\n")
    }
}

// === Sections ===

pub async fn section_list(client: &ApiClient, stage_id: &str) -> Result<Vec<DesignSection>> {
    Ok(client.list_sections(stage_id).await?)
}

pub async fn section_ensure(
    client: &ApiClient,
    stage_id: &str,
    section_type: SectionType,
) -> Result<DesignSection> {
    Ok(client.ensure_section(stage_id, section_type).await?)
}

pub async fn section_notes(client: &ApiClient, section_id: &str, notes: &str) -> Result<DesignSection> {
    let patch = SectionPatch {
        notes: Some(notes.to_string()),
        status: None,
    };
    Ok(client.update_section(section_id, &patch).await?)
}

pub async fn section_status(
    client: &ApiClient,
    section_id: &str,
    status: DesignStatus,
) -> Result<DesignSection> {
    let patch = SectionPatch {
        notes: None,
        status: Some(status),
    };
    Ok(client.update_section(section_id, &patch).await?)
}

pub async fn section_complete(client: &ApiClient, section_id: &str, completed: bool) -> Result<DesignSection> {
    Ok(client.complete_section(section_id, completed).await?)
}

// === Comments ===

pub async fn comment_list(client: &ApiClient, section_id: &str) -> Result<CommentThread> {
    let comments = client.list_comments(section_id).await?;
    Ok(CommentThread::new(Some(section_id.to_string()), &comments))
}

/// Re-print a section's comment thread whenever it changes, until Ctrl+C.
/// Returns the number of refreshes shown.
pub async fn comment_watch<F>(
    client: &ApiClient,
    section_id: &str,
    interval: Duration,
    mut on_change: F,
) -> Result<usize>
where
    F: FnMut(&CommentThread),
{
    let mut watcher = SectionWatcher::start(client.clone(), section_id, interval);
    let mut shown = 0;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::debug!(section_id, "interrupted, stopping comment watch");
                break;
            }
            next = watcher.recv() => match next {
                Some(comments) => {
                    on_change(&CommentThread::new(Some(section_id.to_string()), &comments));
                    shown += 1;
                }
                None => break,
            },
        }
    }

    watcher.stop().await;
    Ok(shown)
}

/// Roster for mention resolution; an unavailable roster means no mentions.
async fn roster(client: &ApiClient) -> Vec<TeamMember> {
    match client.team_members().await {
        Ok(members) => members,
        Err(e) => {
            tracing::warn!(error = %e, "team roster unavailable, posting without mentions");
            Vec::new()
        }
    }
}

/// Post a comment, resolving `@mentions` and `#tags` from its text first.
pub async fn comment_add(
    client: &ApiClient,
    section_id: &str,
    content: &str,
    parent_id: Option<String>,
) -> Result<Comment> {
    let roster = roster(client).await;
    let comment = NewComment {
        section_id: section_id.to_string(),
        content: content.to_string(),
        parent_id,
        mentions: mentions_for_content(content, &roster),
        tags: extract_tags(content),
    };
    Ok(client.create_comment(&comment).await?)
}

pub async fn comment_edit(client: &ApiClient, comment_id: &str, content: &str) -> Result<Comment> {
    let roster = roster(client).await;
    let mentions = mentions_for_content(content, &roster);
    let tags = extract_tags(content);
    Ok(client.edit_comment(comment_id, content, &mentions, &tags).await?)
}

pub async fn comment_like(client: &ApiClient, comment_id: &str) -> Result<Comment> {
    Ok(client.like_comment(comment_id).await?)
}

pub async fn comment_pin(client: &ApiClient, comment_id: &str) -> Result<Comment> {
    Ok(client.pin_comment(comment_id).await?)
}

pub async fn comment_delete(client: &ApiClient, comment_id: &str) -> Result<Ack> {
    client.delete_comment(comment_id).await?;
    Ok(Ack::new("deleted", "comment", comment_id))
}

// === Assets ===

/// Upload each file separately; failures are collected, not fatal.
pub async fn asset_upload(
    client: &ApiClient,
    section_id: &str,
    files: Vec<PathBuf>,
    target: UploadTarget,
    toasts: &mut ToastCenter,
) -> BatchSummary<Asset> {
    let summary = run_batch(
        files,
        |path| path.display().to_string(),
        move |path| async move { client.upload_asset(section_id, &path, target).await },
    )
    .await;

    let id = toasts.next_id();
    toasts.push(summary.to_toast(id, "Uploaded", "file"));
    summary
}

pub async fn asset_caption(client: &ApiClient, asset_id: &str, caption: &str) -> Result<Asset> {
    Ok(client.update_asset_caption(asset_id, caption).await?)
}

/// Delete each asset separately; returns the IDs that were deleted.
pub async fn asset_delete(
    client: &ApiClient,
    asset_ids: Vec<String>,
    toasts: &mut ToastCenter,
) -> BatchSummary<String> {
    let summary = run_batch(asset_ids, String::clone, move |id| async move {
        client.delete_asset(&id).await?;
        Ok::<_, ApiError>(id)
    })
    .await;

    let id = toasts.next_id();
    toasts.push(summary.to_toast(id, "Deleted", "asset"));
    summary
}

// === Team ===

pub async fn team_list(client: &ApiClient) -> Result<Vec<TeamMember>> {
    Ok(client.team_members().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn comment(id: &str, parent: Option<&str>, minute: u32) -> Comment {
        let mut c = Comment::new(id, "u1", format!("text {}", id));
        c.author_name = Some("Ana".to_string());
        c.parent_id = parent.map(str::to_string);
        c.created_at = Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap();
        c
    }

    #[test]
    fn test_thread_human_indents_replies() {
        let comments = vec![
            comment("c1", None, 0),
            comment("c2", Some("c1"), 1),
            comment("c3", Some("c2"), 2),
        ];
        let thread = CommentThread::new(Some("s1".to_string()), &comments);
        let human = thread.to_human();
        let lines: Vec<&str> = human.lines().collect();

        assert!(lines[0].starts_with("Ana (2024-05-01 09:00): text c1"));
        assert_eq!(lines[1], "  2 replies");
        assert!(lines[2].starts_with("  Ana"));
        assert!(lines[3].starts_with("    Ana"));
    }

    #[test]
    fn test_thread_human_renders_long_chain() {
        let comments: Vec<Comment> = (0..2_000)
            .map(|i| {
                let parent = (i > 0).then(|| format!("c{}", i - 1));
                comment(&format!("c{}", i), parent.as_deref(), 0)
            })
            .collect();
        let human = CommentThread::new(None, &comments).to_human();
        let lines: Vec<&str> = human.lines().collect();

        assert_eq!(lines.len(), 2_001);
        assert_eq!(lines[1], "  1999 replies");
        assert!(lines[2_000].ends_with("text c1999 [c1999]"));
        assert!(lines[2_000].starts_with(&"  ".repeat(1_999)));
    }

    #[test]
    fn test_thread_json_counts_dropped_comments() {
        let comments = vec![comment("c1", None, 0), comment("orphan", Some("gone"), 1)];
        let thread = CommentThread::new(None, &comments);
        let value: serde_json::Value = serde_json::from_str(&thread.to_json()).unwrap();

        assert_eq!(value["total"], 2);
        assert_eq!(value["threads"].as_array().unwrap().len(), 1);
        assert!(value.get("sectionId").is_none());
    }

    #[test]
    fn test_empty_thread_human() {
        let thread = CommentThread::new(None, &[]);
        assert_eq!(thread.to_human(), "No comments.");
    }

    #[test]
    fn test_team_member_human() {
        let mut member = TeamMember::new("u1", "Ana Silva");
        member.role = Some("Designer".to_string());
        assert_eq!(member.to_human(), "Ana Silva (u1) - Designer");
    }
}
