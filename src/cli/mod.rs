//! CLI argument definitions for atl.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::models::{DeliveryStatus, DesignStatus, QuoteLineItem, SectionType};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("ATL_GIT_COMMIT"),
    " ",
    env!("ATL_BUILD_TIMESTAMP"),
    ")"
);

/// atl - work with interior-design project workspaces from the terminal.
///
/// Output is JSON by default; pass -H for human-readable output.
#[derive(Parser, Debug)]
#[command(name = "atl")]
#[command(author, version, long_version = LONG_VERSION, about = "Design workspace client: sections, threaded comments, deliveries and quotes", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Base URL of the design API (overrides ATL_API_URL and config.kdl)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// API bearer token (overrides ATL_API_TOKEN and state.kdl)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Design section commands (notes, status, completion)
    Section {
        #[command(subcommand)]
        command: SectionCommands,
    },

    /// Threaded comments on a design section
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Section photos and documents
    Asset {
        #[command(subcommand)]
        command: AssetCommands,
    },

    /// Notification feed
    Notification {
        #[command(subcommand)]
        command: NotificationCommands,
    },

    /// Project stages
    Stage {
        #[command(subcommand)]
        command: StageCommands,
    },

    /// Stage checklists
    Checklist {
        #[command(subcommand)]
        command: ChecklistCommands,
    },

    /// Project update feed
    Update {
        #[command(subcommand)]
        command: UpdateCommands,
    },

    /// Delivery tracking
    Delivery {
        #[command(subcommand)]
        command: DeliveryCommands,
    },

    /// Supplier requests for quote
    Rfq {
        #[command(subcommand)]
        command: RfqCommands,
    },

    /// Team roster used for @mentions
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },

    /// Build a comment thread from a JSON array of comments (offline)
    Thread {
        /// JSON file with a flat comment list, or - for stdin
        #[arg(default_value = "-")]
        input: String,
    },

    /// Extract and resolve @mentions in text against a roster (offline)
    Mentions {
        /// Message text containing @mentions
        text: String,

        /// JSON file with the team roster
        #[arg(long)]
        roster: PathBuf,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Design section subcommands
#[derive(Subcommand, Debug)]
pub enum SectionCommands {
    /// List a stage's design sections
    List {
        /// Stage ID
        stage_id: String,
    },

    /// Get the section of a type, creating it if missing
    Ensure {
        /// Stage ID
        stage_id: String,

        /// Section type (general, wall-covering, ceiling, floor)
        #[arg(value_name = "TYPE")]
        section_type: SectionType,
    },

    /// Replace a section's notes
    Notes {
        /// Section ID
        section_id: String,

        /// New notes text
        notes: String,
    },

    /// Set a section's review status
    Status {
        /// Section ID
        section_id: String,

        /// New status (draft, in-review, finalized)
        status: DesignStatus,
    },

    /// Mark a section complete
    Complete {
        /// Section ID
        section_id: String,

        /// Reopen instead of completing
        #[arg(long)]
        reopen: bool,
    },
}

/// Comment subcommands
#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Show a section's comments as a thread
    List {
        /// Section ID
        section_id: String,
    },

    /// Post a comment; @mentions are resolved against the team roster
    Add {
        /// Section ID
        section_id: String,

        /// Comment text
        content: String,

        /// Reply to this comment
        #[arg(long)]
        parent: Option<String>,
    },

    /// Replace a comment's text
    Edit {
        /// Comment ID
        comment_id: String,

        /// New text
        content: String,
    },

    /// Like a comment
    Like {
        /// Comment ID
        comment_id: String,
    },

    /// Toggle a comment's pinned flag
    Pin {
        /// Comment ID
        comment_id: String,
    },

    /// Delete a comment
    Delete {
        /// Comment ID
        comment_id: String,
    },

    /// Re-print the thread whenever it changes (Ctrl+C to stop)
    Watch {
        /// Section ID
        section_id: String,

        /// Seconds between refreshes (10-300, default 30)
        #[arg(long, value_parser = clap::value_parser!(u64).range(10..=300))]
        interval: Option<u64>,
    },
}

/// Asset subcommands
#[derive(Subcommand, Debug)]
pub enum AssetCommands {
    /// Upload files to a section (each file is a separate request)
    Upload {
        /// Section ID
        section_id: String,

        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Upload straight to blob storage with a server-issued token
        #[arg(long)]
        blob: bool,
    },

    /// Set an asset's caption
    Caption {
        /// Asset ID
        asset_id: String,

        /// Caption text
        caption: String,
    },

    /// Delete assets
    Delete {
        /// Asset IDs
        #[arg(required = true)]
        asset_ids: Vec<String>,
    },
}

/// Notification subcommands
#[derive(Subcommand, Debug)]
pub enum NotificationCommands {
    /// List notifications
    List {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
    },

    /// Mark a notification read
    Read {
        /// Notification ID
        notification_id: String,
    },

    /// Print new notifications as they arrive, until Ctrl+C
    Watch {
        /// Poll interval in seconds (default from config, 15)
        #[arg(long, value_parser = clap::value_parser!(u64).range(10..=300))]
        interval: Option<u64>,
    },
}

/// Stage subcommands
#[derive(Subcommand, Debug)]
pub enum StageCommands {
    /// Show a stage
    Show {
        /// Stage ID
        stage_id: String,
    },

    /// Set a stage's status
    Status {
        /// Stage ID
        stage_id: String,

        /// New status (draft, in-review, finalized)
        status: DesignStatus,
    },
}

/// Checklist subcommands
#[derive(Subcommand, Debug)]
pub enum ChecklistCommands {
    /// List a stage's checklist
    List {
        /// Stage ID
        stage_id: String,
    },

    /// Toggle an item's completion
    Toggle {
        /// Stage ID
        stage_id: String,

        /// Checklist item ID
        item_id: String,
    },

    /// Move an item to a new position (0-based)
    Move {
        /// Stage ID
        stage_id: String,

        /// Checklist item ID
        item_id: String,

        /// Target position
        position: usize,
    },
}

/// Project update subcommands
#[derive(Subcommand, Debug)]
pub enum UpdateCommands {
    /// List a project's updates
    List {
        /// Project ID
        project_id: String,
    },

    /// Post an update to a project
    Post {
        /// Project ID
        project_id: String,

        /// Update text
        content: String,
    },
}

/// Delivery subcommands
#[derive(Subcommand, Debug)]
pub enum DeliveryCommands {
    /// List deliveries
    List {
        /// Only deliveries for this project
        #[arg(long)]
        project: Option<String>,

        /// Only deliveries with this status
        #[arg(long)]
        status: Option<DeliveryStatus>,
    },

    /// Track a new delivery
    Create {
        /// Project ID
        project_id: String,

        /// Item being delivered
        item_name: String,

        /// Supplier name
        #[arg(long)]
        supplier: Option<String>,

        /// Carrier tracking number
        #[arg(long)]
        tracking: Option<String>,

        /// Expected delivery date (YYYY-MM-DD)
        #[arg(long)]
        expected: Option<NaiveDate>,
    },

    /// Change a delivery; any status may be set
    Update {
        /// Delivery ID
        delivery_id: String,

        /// New status
        #[arg(long)]
        status: Option<DeliveryStatus>,

        /// Carrier tracking number
        #[arg(long)]
        tracking: Option<String>,

        /// Expected delivery date (YYYY-MM-DD)
        #[arg(long)]
        expected: Option<NaiveDate>,

        /// Actual delivery date (YYYY-MM-DD)
        #[arg(long)]
        delivered: Option<NaiveDate>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },
}

/// RFQ subcommands
#[derive(Subcommand, Debug)]
pub enum RfqCommands {
    /// List sent quote requests
    List,

    /// Send one quote request per supplier
    Send {
        /// Supplier email (repeatable)
        #[arg(long = "supplier", required = true)]
        suppliers: Vec<String>,

        /// Line item as "description:quantity" (repeatable)
        #[arg(long = "item", required = true)]
        items: Vec<QuoteLineItem>,

        /// Project the request belongs to
        #[arg(long)]
        project: Option<String>,

        /// Message to include
        #[arg(long)]
        message: Option<String>,
    },
}

/// Team subcommands
#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    /// List team members
    List,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration and where each value came from
    Show,

    /// Set a value (api-url, output-format, poll-interval, api-token)
    Set {
        /// Config key
        key: String,

        /// New value
        value: String,
    },
}
