//! Per-item batch execution.
//!
//! Multi-file uploads, bulk deletes and bulk quote requests run one request
//! per item. Each item's failure is caught on its own, so one bad item never
//! aborts the rest; the caller gets a summary for the aggregate toast.

use std::fmt;
use std::future::Future;

use futures::StreamExt;
use futures::stream;
use serde::Serialize;

use crate::toast::{Toast, ToastLevel};

/// Requests in flight at once during a batch
pub const MAX_CONCURRENT_REQUESTS: usize = 4;

/// One item that failed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub item: String,
    pub error: String,
}

/// Outcome of a batch: successful results in input order plus failures.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary<R> {
    pub succeeded: Vec<R>,
    pub failed: Vec<BatchFailure>,
}

impl<R> BatchSummary<R> {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Aggregate toast, e.g. `"Uploaded 3 of 4 files; 1 failed"`.
    ///
    /// Success when nothing failed, Warning on partial failure, Error when
    /// every item failed.
    pub fn to_toast(&self, id: u64, verb: &str, noun: &str) -> Toast {
        let total = self.total();
        let ok = self.succeeded.len();
        let plural = if total == 1 { "" } else { "s" };

        if self.failed.is_empty() {
            let message = format!("{} {} {}{}", verb, ok, noun, plural);
            return Toast::new(id, ToastLevel::Success, message);
        }

        let level = if ok == 0 {
            ToastLevel::Error
        } else {
            ToastLevel::Warning
        };
        let message = format!(
            "{} {} of {} {}{}; {} failed",
            verb,
            ok,
            total,
            noun,
            plural,
            self.failed.len()
        );

        Toast::new(id, level, message)
    }
}

/// Run `op` for every item, collecting results and per-item failures.
///
/// At most [`MAX_CONCURRENT_REQUESTS`] operations run at once; successes are
/// reported in input order. `label` names an item in failure reports.
pub async fn run_batch<T, R, E, L, F, Fut>(items: Vec<T>, label: L, op: F) -> BatchSummary<R>
where
    L: Fn(&T) -> String,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: fmt::Display,
{
    let labelled: Vec<(String, T)> = items.into_iter().map(|item| (label(&item), item)).collect();

    let outcomes: Vec<(String, Result<R, E>)> = stream::iter(labelled)
        .map(|(name, item)| {
            let fut = op(item);
            async move { (name, fut.await) }
        })
        .buffered(MAX_CONCURRENT_REQUESTS)
        .collect()
        .await;

    let mut summary = BatchSummary {
        succeeded: Vec::new(),
        failed: Vec::new(),
    };
    for (item, outcome) in outcomes {
        match outcome {
            Ok(result) => summary.succeeded.push(result),
            Err(e) => {
                tracing::warn!(item = %item, error = %e, "batch item failed");
                summary.failed.push(BatchFailure {
                    item,
                    error: e.to_string(),
                });
            }
        }
    }
    summary
}
