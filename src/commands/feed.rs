//! Notification and project update feed commands.

use std::time::Duration;

use super::{Ack, Output, json, truncate};
use crate::client::ApiClient;
use crate::models::{Notification, NotificationKind, ProjectUpdate};
use crate::poller::NotificationWatcher;
use crate::Result;

fn kind_label(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Mention => "mention",
        NotificationKind::Comment => "comment",
        NotificationKind::Reply => "reply",
        NotificationKind::StatusChange => "status",
        NotificationKind::Delivery => "delivery",
        NotificationKind::Other => "other",
    }
}

impl Output for Notification {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let marker = if self.is_read { " " } else { "•" };
        let mut out = format!(
            "{} [{}] {} ({})",
            marker,
            kind_label(self.kind),
            self.message,
            self.id
        );
        if let Some(ref link) = self.link {
            out.push_str(&format!("\n    {}", link));
        }
        out
    }
}

impl Output for ProjectUpdate {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!(
            "{} {}: {}",
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.author_id,
            truncate(&self.content, 100)
        );
        if !self.attachments.is_empty() {
            out.push_str(&format!(" (+{} attachment(s))", self.attachments.len()));
        }
        out
    }
}

pub async fn notification_list(client: &ApiClient, unread_only: bool) -> Result<Vec<Notification>> {
    let mut notifications = client.list_notifications().await?;
    if unread_only {
        notifications.retain(|n| !n.is_read);
    }
    Ok(notifications)
}

pub async fn notification_read(client: &ApiClient, notification_id: &str) -> Result<Ack> {
    client.mark_notification_read(notification_id).await?;
    Ok(Ack::new("read", "notification", notification_id))
}

/// Poll for new notifications and hand each to `on_notification` until
/// Ctrl+C. Returns the number delivered.
pub async fn notification_watch<F>(client: &ApiClient, interval: Duration, mut on_notification: F) -> Result<usize>
where
    F: FnMut(&Notification),
{
    let mut watcher = NotificationWatcher::start(client.clone(), interval);
    let mut delivered = 0;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::debug!("interrupted, stopping notification watch");
                break;
            }
            next = watcher.recv() => match next {
                Some(notification) => {
                    on_notification(&notification);
                    delivered += 1;
                }
                None => break,
            },
        }
    }

    watcher.stop().await;
    Ok(delivered)
}

pub async fn update_list(client: &ApiClient, project_id: &str) -> Result<Vec<ProjectUpdate>> {
    Ok(client.list_updates(project_id).await?)
}

pub async fn update_post(client: &ApiClient, project_id: &str, content: &str) -> Result<ProjectUpdate> {
    if content.trim().is_empty() {
        return Err(crate::Error::InvalidInput("Update text cannot be empty".to_string()));
    }
    Ok(client.post_update(project_id, content).await?)
}
