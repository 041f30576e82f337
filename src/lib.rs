//! Atelier - a client library and CLI for interior-design project workspaces.
//!
//! This library provides the core functionality for the `atl` CLI tool:
//! threaded design comments, @-mention resolution, the typed API client,
//! background polling, optimistic checklist edits, and batch operations.

pub mod batch;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod logging;
pub mod mentions;
pub mod models;
pub mod optimistic;
pub mod poller;
pub mod toast;

pub use client::{ApiClient, ApiError};

/// Library-level error type for atl operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API failures keep the server's message as-is.
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for atl operations.
pub type Result<T> = std::result::Result<T, Error>;
