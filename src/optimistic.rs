//! Optimistic local updates with atomic rollback.
//!
//! A command is applied to local state before the server has confirmed it.
//! The command captures whatever it needs to undo itself while applying, so a
//! failed request restores the exact pre-state in one step.
//!
//! ```ignore
//! let mut items = client.list_checklist("stage-1").await?;
//! let client2 = client.clone();
//! run_optimistic(&mut items, ReorderCommand::new(3, 0), move |items| {
//!     let ids = item_ids(items);
//!     async move { client2.reorder_checklist("stage-1", &ids).await }
//! })
//! .await?;
//! ```

use std::future::Future;

use crate::models::ChecklistItem;
use crate::{Error, Result};

/// A speculative change that can be undone.
pub trait OptimisticCommand<S> {
    /// Mutate `state`, capturing what is needed to undo the change.
    ///
    /// On error `state` must be left untouched.
    fn apply(&mut self, state: &mut S) -> Result<()>;

    /// Restore the state captured by `apply`.
    fn rollback(self, state: &mut S);
}

/// Items that carry an explicit display position.
pub trait Positioned {
    fn set_position(&mut self, position: u32);
}

impl Positioned for ChecklistItem {
    fn set_position(&mut self, position: u32) {
        self.position = position;
    }
}

/// Move one list element from `from` to `to`, renumbering positions.
#[derive(Debug, Clone)]
pub struct ReorderCommand<T> {
    from: usize,
    to: usize,
    snapshot: Option<Vec<T>>,
}

impl<T> ReorderCommand<T> {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            snapshot: None,
        }
    }
}

impl<T: Clone + Positioned> OptimisticCommand<Vec<T>> for ReorderCommand<T> {
    fn apply(&mut self, items: &mut Vec<T>) -> Result<()> {
        let len = items.len();
        if self.from >= len || self.to >= len {
            return Err(Error::InvalidInput(format!(
                "Cannot move item {} to {}: list has {} item(s)",
                self.from, self.to, len
            )));
        }

        self.snapshot = Some(items.clone());
        let item = items.remove(self.from);
        items.insert(self.to, item);
        for (i, item) in items.iter_mut().enumerate() {
            item.set_position(i as u32);
        }
        Ok(())
    }

    fn rollback(self, items: &mut Vec<T>) {
        if let Some(snapshot) = self.snapshot {
            *items = snapshot;
        }
    }
}

/// Flip the completion flag of one checklist item.
#[derive(Debug, Clone)]
pub struct ToggleCommand {
    item_id: String,
    previous: Option<bool>,
}

impl ToggleCommand {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            previous: None,
        }
    }

    /// Completion state after applying, if applied.
    pub fn completed(&self) -> Option<bool> {
        self.previous.map(|p| !p)
    }
}

impl OptimisticCommand<Vec<ChecklistItem>> for ToggleCommand {
    fn apply(&mut self, items: &mut Vec<ChecklistItem>) -> Result<()> {
        let item = items
            .iter_mut()
            .find(|i| i.id == self.item_id)
            .ok_or_else(|| Error::NotFound(format!("Checklist item not found: {}", self.item_id)))?;

        self.previous = Some(item.completed);
        item.completed = !item.completed;
        Ok(())
    }

    fn rollback(self, items: &mut Vec<ChecklistItem>) {
        let Some(previous) = self.previous else {
            return;
        };
        if let Some(item) = items.iter_mut().find(|i| i.id == self.item_id) {
            item.completed = previous;
        }
    }
}

/// Apply `command` locally, then persist; roll back if persisting fails.
///
/// `persist` sees the speculative state and returns the request future. On
/// success the speculative state stays; on failure it is restored and the
/// error returned.
pub async fn run_optimistic<S, C, F, Fut, T, E>(state: &mut S, mut command: C, persist: F) -> Result<T>
where
    C: OptimisticCommand<S>,
    F: FnOnce(&S) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Into<Error>,
{
    command.apply(state)?;

    match persist(state).await {
        Ok(value) => Ok(value),
        Err(e) => {
            let err: Error = e.into();
            tracing::warn!(error = %err, "optimistic update rejected, rolling back");
            command.rollback(state);
            Err(err)
        }
    }
}

/// IDs of checklist items in list order, as sent to the reorder endpoint.
pub fn item_ids(items: &[ChecklistItem]) -> Vec<String> {
    items.iter().map(|i| i.id.clone()).collect()
}
