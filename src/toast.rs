//! Transient feedback toasts.
//!
//! Every user-facing operation reports its outcome as a toast: failures carry
//! the server-supplied message (or a generic one), batch operations an
//! aggregate count. [`ToastCenter`] keeps a short visible queue and a bounded
//! history; the CLI prints drained toasts to stderr.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Error;

/// Toasts shown at once; the rest wait in the queue
pub const VISIBLE_LIMIT: usize = 3;

/// Entries kept in the history
pub const HISTORY_LIMIT: usize = 100;

const AUTO_DISMISS: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastLevel::Info => "ℹ",
            ToastLevel::Success => "✓",
            ToastLevel::Warning => "⚠",
            ToastLevel::Error => "✗",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
    pub raised_at: Instant,
    /// `None` keeps the toast until it is dismissed
    pub lifetime: Option<Duration>,
    pub dismissed: bool,
}

impl Toast {
    pub fn new(id: u64, level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            id,
            level,
            message: message.into(),
            raised_at: Instant::now(),
            lifetime: Some(AUTO_DISMISS),
            dismissed: false,
        }
    }

    pub fn with_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Error toast for a failed operation.
    pub fn from_error(id: u64, error: &Error) -> Self {
        Self::new(id, ToastLevel::Error, error.to_string())
    }

    pub fn is_expired(&self) -> bool {
        match self.lifetime {
            Some(lifetime) => self.raised_at.elapsed() >= lifetime,
            None => false,
        }
    }

    fn is_live(&self) -> bool {
        !self.dismissed && !self.is_expired()
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level.icon(), self.message)
    }
}

/// What a toast said, kept after it leaves the queue.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub level: ToastLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ToastCenter {
    /// Oldest first
    queue: VecDeque<Toast>,
    /// Newest first
    history: VecDeque<HistoryEntry>,
    next_id: u64,
}

impl Default for ToastCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastCenter {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            history: VecDeque::new(),
            next_id: 1,
        }
    }

    /// Reserve an ID for a toast built elsewhere (e.g. a batch summary).
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn push(&mut self, toast: Toast) -> u64 {
        tracing::debug!(level = ?toast.level, message = %toast.message, "toast");
        self.history.push_front(HistoryEntry {
            level: toast.level,
            message: toast.message.clone(),
            raised_at: Utc::now(),
        });
        self.history.truncate(HISTORY_LIMIT);

        let id = toast.id;
        self.queue.push_back(toast);
        id
    }

    pub fn notify(&mut self, level: ToastLevel, message: impl Into<String>) -> u64 {
        let id = self.next_id();
        self.push(Toast::new(id, level, message))
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.notify(ToastLevel::Info, message)
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.notify(ToastLevel::Success, message)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> u64 {
        self.notify(ToastLevel::Warning, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.notify(ToastLevel::Error, message)
    }

    pub fn report(&mut self, error: &Error) -> u64 {
        let id = self.next_id();
        self.push(Toast::from_error(id, error))
    }

    pub fn dismiss(&mut self, id: u64) {
        if let Some(toast) = self.queue.iter_mut().find(|t| t.id == id) {
            toast.dismissed = true;
        }
        self.sweep();
    }

    /// Drop dismissed and expired toasts.
    pub fn sweep(&mut self) {
        self.queue.retain(Toast::is_live);
    }

    /// The toasts on screen: the oldest live ones, at most [`VISIBLE_LIMIT`].
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.queue.iter().filter(|t| t.is_live()).take(VISIBLE_LIMIT)
    }

    /// Live toasts waiting behind the visible ones.
    pub fn queued(&self) -> usize {
        self.queue
            .iter()
            .filter(|t| t.is_live())
            .count()
            .saturating_sub(VISIBLE_LIMIT)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take every undismissed toast, oldest first. Expiry is ignored: a
    /// one-shot CLI run prints everything it raised.
    pub fn drain(&mut self) -> Vec<Toast> {
        self.queue.drain(..).filter(|t| !t.dismissed).collect()
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }
}
