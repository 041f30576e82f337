//! Fixed-interval background polling.
//!
//! A [`Poller`] owns a tokio task and its timer. It is started explicitly,
//! stopped explicitly with [`Poller::stop`], and aborted if dropped, so no
//! timer outlives the view or command that needed it. Ticks run on a fixed
//! interval with no backoff or jitter; the first tick fires immediately.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::ApiClient;
use crate::models::{Comment, Notification};

/// Default notification poll interval in seconds
pub const DEFAULT_NOTIFICATION_INTERVAL_SECS: u64 = 15;

/// Default workspace refresh interval in seconds
pub const DEFAULT_WORKSPACE_INTERVAL_SECS: u64 = 30;

/// Buffered notifications before the watcher waits on the consumer
const NOTIFICATION_CHANNEL_CAPACITY: usize = 64;

/// A cancellable fixed-interval task.
pub struct Poller {
    name: String,
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Spawn a task that calls `tick` every `interval` until stopped.
    ///
    /// A tick in flight when the poller is stopped is cancelled. Ticks that
    /// overrun the interval delay the next one rather than bunching up.
    pub fn start<F, Fut>(name: impl Into<String>, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let interval = interval.max(Duration::from_millis(1));
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task_name = name.clone();
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = timer.tick() => {
                        tokio::select! {
                            _ = &mut stop_rx => break,
                            _ = tick() => {}
                        }
                    }
                }
            }
            tracing::debug!(poller = %task_name, "poller stopped");
        });

        tracing::debug!(poller = %name, ?interval, "poller started");
        Self {
            name,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the polling task is still alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop polling and wait for the task to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Polls the notification feed and yields each unread notification once.
///
/// Poll failures are logged and skipped; the next tick tries again.
pub struct NotificationWatcher {
    poller: Poller,
    rx: mpsc::Receiver<Notification>,
}

impl NotificationWatcher {
    pub fn start(client: ApiClient, interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(NOTIFICATION_CHANNEL_CAPACITY);
        let seen: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));

        let poller = Poller::start("notifications", interval, move || {
            let client = client.clone();
            let tx = tx.clone();
            let seen = Arc::clone(&seen);
            async move {
                let notifications = match client.list_notifications().await {
                    Ok(list) => list,
                    Err(e) => {
                        tracing::warn!(error = %e, "notification poll failed");
                        return;
                    }
                };

                let fresh = take_fresh(&mut *seen.lock().await, notifications);
                for notification in fresh {
                    if tx.send(notification).await.is_err() {
                        // Receiver gone; nothing left to deliver to
                        return;
                    }
                }
            }
        });

        Self { poller, rx }
    }

    /// Next new notification, or `None` once the watcher has shut down.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    pub async fn stop(self) {
        self.poller.stop().await;
    }
}

/// Unread notifications not yielded before, in feed order.
///
/// `seen` is narrowed to the IDs still unread in `latest`, so it never grows
/// past the size of one poll.
fn take_fresh(seen: &mut HashSet<String>, latest: Vec<Notification>) -> Vec<Notification> {
    let unread: Vec<Notification> = latest.into_iter().filter(|n| !n.is_read).collect();
    seen.retain(|id| unread.iter().any(|n| &n.id == id));

    unread
        .into_iter()
        .filter(|n| seen.insert(n.id.clone()))
        .collect()
}

/// Re-fetches a section's comments and yields the list whenever it changes.
///
/// The first successful poll always yields. Like the notification watcher,
/// failed polls are logged and retried on the next tick.
pub struct SectionWatcher {
    poller: Poller,
    rx: mpsc::Receiver<Vec<Comment>>,
}

impl SectionWatcher {
    pub fn start(client: ApiClient, section_id: impl Into<String>, interval: Duration) -> Self {
        let section_id = section_id.into();
        let (tx, rx) = mpsc::channel(1);
        let last: Arc<Mutex<Option<Vec<Comment>>>> = Arc::new(Mutex::new(None));

        let name = format!("section:{}", section_id);
        let poller = Poller::start(name, interval, move || {
            let client = client.clone();
            let section_id = section_id.clone();
            let tx = tx.clone();
            let last = Arc::clone(&last);
            async move {
                let comments = match client.list_comments(&section_id).await {
                    Ok(comments) => comments,
                    Err(e) => {
                        tracing::warn!(section_id = %section_id, error = %e, "comment poll failed");
                        return;
                    }
                };

                let mut last = last.lock().await;
                if last.as_ref() == Some(&comments) {
                    return;
                }
                *last = Some(comments.clone());
                let _ = tx.send(comments).await;
            }
        });

        Self { poller, rx }
    }

    /// Next changed comment list, or `None` once the watcher has shut down.
    pub async fn recv(&mut self) -> Option<Vec<Comment>> {
        self.rx.recv().await
    }

    pub async fn stop(self) {
        self.poller.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_poller(interval_ms: u64) -> (Poller, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let poller = Poller::start("test", Duration::from_millis(interval_ms), move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        (poller, count)
    }

    #[tokio::test]
    async fn test_first_tick_is_immediate() {
        let (poller, count) = counting_poller(10_000);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        poller.stop().await;
    }

    #[tokio::test]
    async fn test_ticks_repeat_on_interval() {
        let (poller, count) = counting_poller(10);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(count.load(Ordering::SeqCst) >= 3);
        assert!(poller.is_running());
        poller.stop().await;
    }

    #[tokio::test]
    async fn test_no_ticks_after_stop() {
        let (poller, count) = counting_poller(5);
        tokio::time::sleep(Duration::from_millis(30)).await;
        poller.stop().await;

        let after_stop = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn test_stop_cancels_tick_in_flight() {
        let poller = Poller::start("slow", Duration::from_millis(10), || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(1), poller.stop())
            .await
            .expect("stop should not wait for the slow tick");
    }

    #[tokio::test]
    async fn test_drop_aborts_task() {
        let (poller, count) = counting_poller(5);
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(poller);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let after_drop = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_drop);
    }

    #[tokio::test]
    async fn test_zero_interval_is_clamped() {
        let (poller, count) = counting_poller(0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(count.load(Ordering::SeqCst) >= 1);
        assert_eq!(poller.name(), "test");
        poller.stop().await;
    }

    fn notification(id: &str, is_read: bool) -> Notification {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": "MENTION",
            "message": format!("note {}", id),
            "isRead": is_read,
            "createdAt": "2026-03-01T09:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn test_take_fresh_yields_each_unread_once() {
        let mut seen = HashSet::new();
        let first = take_fresh(&mut seen, vec![notification("n1", false), notification("n2", true)]);
        assert_eq!(first.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(), vec!["n1"]);

        let second = take_fresh(&mut seen, vec![notification("n1", false), notification("n3", false)]);
        assert_eq!(second.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(), vec!["n3"]);
    }

    #[test]
    fn test_take_fresh_forgets_read_and_vanished_ids() {
        let mut seen = HashSet::new();
        take_fresh(&mut seen, vec![notification("n1", false), notification("n2", false)]);
        assert_eq!(seen.len(), 2);

        take_fresh(&mut seen, vec![notification("n1", true)]);
        assert!(seen.is_empty());

        take_fresh(&mut seen, vec![notification("n4", false)]);
        assert_eq!(seen, HashSet::from(["n4".to_string()]));
    }
}
