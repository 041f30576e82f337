//! Data models for the design workspace API.
//!
//! This module defines the wire structures exchanged with the backend:
//! - `Comment` - Threaded remarks on a design section, with mentions and tags
//! - `TeamMember` - Roster entry used to resolve `@mentions`
//! - `DesignSection` - A completable subsection of a room's design workspace
//! - `Stage` - A project phase owning sections and a checklist
//! - `Delivery` - A tracked item shipment
//! - `SupplierQuote` - A request for quote sent to a supplier
//!
//! The backend is JSON-first and uses camelCase field names throughout.

pub mod thread;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use thread::{CommentNode, build_comment_tree, count_replies, flatten_tree};

/// Normalize user-entered enum text: `in-review`, `In Review` and `IN_REVIEW`
/// all become `IN_REVIEW`.
fn normalize_variant(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Review status shared by stages and design sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DesignStatus {
    #[default]
    Draft,
    InReview,
    Finalized,
}

impl DesignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignStatus::Draft => "DRAFT",
            DesignStatus::InReview => "IN_REVIEW",
            DesignStatus::Finalized => "FINALIZED",
        }
    }
}

impl fmt::Display for DesignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DesignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant(s).as_str() {
            "DRAFT" => Ok(DesignStatus::Draft),
            "IN_REVIEW" => Ok(DesignStatus::InReview),
            "FINALIZED" => Ok(DesignStatus::Finalized),
            _ => Err(format!(
                "Invalid status: {}. Valid values: draft, in-review, finalized",
                s
            )),
        }
    }
}

/// The fixed set of sections inside a room's design workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionType {
    General,
    WallCovering,
    Ceiling,
    Floor,
}

impl SectionType {
    /// All section types in workspace display order.
    pub const ALL: [SectionType; 4] = [
        SectionType::General,
        SectionType::WallCovering,
        SectionType::Ceiling,
        SectionType::Floor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::General => "GENERAL",
            SectionType::WallCovering => "WALL_COVERING",
            SectionType::Ceiling => "CEILING",
            SectionType::Floor => "FLOOR",
        }
    }

    /// Title shown in the workspace accordion.
    pub fn label(&self) -> &'static str {
        match self {
            SectionType::General => "General",
            SectionType::WallCovering => "Wall Covering",
            SectionType::Ceiling => "Ceiling",
            SectionType::Floor => "Floor",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant(s).as_str() {
            "GENERAL" => Ok(SectionType::General),
            "WALL_COVERING" | "WALLCOVERING" | "WALL" => Ok(SectionType::WallCovering),
            "CEILING" => Ok(SectionType::Ceiling),
            "FLOOR" => Ok(SectionType::Floor),
            _ => Err(format!(
                "Invalid section type: {}. Valid values: general, wall-covering, ceiling, floor",
                s
            )),
        }
    }
}

/// A comment on a design section or project update.
///
/// Replies reference their parent through `parent_id`. The collection is
/// acyclic by construction because replies only ever point to older comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,

    /// Body text; may embed `@name` and `#tag` tokens
    pub content: String,

    pub author_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Parent comment for replies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,

    #[serde(default)]
    pub is_pinned: bool,

    #[serde(default)]
    pub likes: u32,

    /// Resolved member IDs, in mention order
    #[serde(default)]
    pub mentions: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl Comment {
    /// Create a root comment authored now.
    pub fn new(id: impl Into<String>, author_id: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            content: content.into(),
            author_id: author_id.into(),
            author_name: None,
            created_at: now,
            updated_at: now,
            parent_id: None,
            section_id: None,
            is_pinned: false,
            likes: 0,
            mentions: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Payload for `POST /api/design/comments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub section_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub mentions: Vec<String>,
    pub tags: Vec<String>,
}

/// A team member, the matching universe for mention resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl TeamMember {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            role: None,
        }
    }
}

/// An uploaded image or file attached to a section or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub url: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// A named subsection of a room's design workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSection {
    pub id: String,
    pub stage_id: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    #[serde(default)]
    pub status: DesignStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for `PATCH /api/design/sections/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DesignStatus>,
}

/// A phase of a project (e.g. "Design Concept").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub status: DesignStatus,
    #[serde(default)]
    pub sections: Vec<DesignSection>,
}

/// Top-level project container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

/// A room inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
}

/// An entry in a project's update feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub id: String,
    pub project_id: String,
    pub content: String,
    pub author_id: String,
    #[serde(default)]
    pub attachments: Vec<Asset>,
    pub created_at: DateTime<Utc>,
}

/// A checklist entry on a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub position: u32,
}

/// Kind of in-app notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Mention,
    Comment,
    Reply,
    StatusChange,
    Delivery,
    #[serde(other)]
    Other,
}

/// An in-app notification for the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Delivery tracking status. Transitions are unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Ordered,
    InTransit,
    Delivered,
    Delayed,
    Cancelled,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Ordered => "ORDERED",
            DeliveryStatus::InTransit => "IN_TRANSIT",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::Delayed => "DELAYED",
            DeliveryStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant(s).as_str() {
            "PENDING" => Ok(DeliveryStatus::Pending),
            "ORDERED" => Ok(DeliveryStatus::Ordered),
            "IN_TRANSIT" => Ok(DeliveryStatus::InTransit),
            "DELIVERED" => Ok(DeliveryStatus::Delivered),
            "DELAYED" => Ok(DeliveryStatus::Delayed),
            "CANCELLED" | "CANCELED" => Ok(DeliveryStatus::Cancelled),
            _ => Err(format!(
                "Invalid delivery status: {}. Valid values: pending, ordered, in-transit, delivered, delayed, cancelled",
                s
            )),
        }
    }
}

/// A tracked shipment for a project item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: String,
    pub project_id: String,
    pub item_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default)]
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payload for `POST /api/deliveries`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDelivery {
    pub project_id: String,
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<NaiveDate>,
}

/// Partial update for `PATCH /api/deliveries/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DeliveryPatch {
    pub fn is_empty(&self) -> bool {
        *self == DeliveryPatch::default()
    }
}

/// Status of a request for quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    #[default]
    Sent,
    Received,
    Accepted,
    Declined,
}

/// One line of a quote request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLineItem {
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl FromStr for QuoteLineItem {
    type Err = String;

    /// Parse `description` or `description:quantity`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Quote item cannot be empty".to_string());
        }
        match s.rsplit_once(':') {
            Some((desc, qty)) if !desc.trim().is_empty() => {
                let quantity = qty
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| format!("Invalid quantity in quote item: {}", s))?;
                if quantity == 0 {
                    return Err(format!("Quantity must be at least 1: {}", s));
                }
                Ok(QuoteLineItem {
                    description: desc.trim().to_string(),
                    quantity,
                })
            }
            _ => Ok(QuoteLineItem {
                description: s.to_string(),
                quantity: 1,
            }),
        }
    }
}

/// A request for quote sent to a single supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierQuote {
    pub id: String,
    pub supplier_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub items: Vec<QuoteLineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /api/rfq/supplier-quote`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub supplier_email: String,
    pub items: Vec<QuoteLineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
