//! Commands that work on local JSON without contacting the API.

use std::io::Read;
use std::path::Path;

use serde::Serialize;

use super::{CommentThread, Output, json};
use crate::mentions::{extract_mention_tokens, extract_tags, match_member, resolve_mentions};
use crate::models::{Comment, TeamMember};
use crate::{Error, Result};

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input)
            .map_err(|e| Error::InvalidInput(format!("Failed to read {}: {}", input, e)))
    }
}

/// Build a comment thread from a flat JSON array of comments.
pub fn thread(input: &str) -> Result<CommentThread> {
    let text = read_input(input)?;
    let comments: Vec<Comment> = serde_json::from_str(&text)
        .map_err(|e| Error::InvalidInput(format!("Expected a JSON array of comments: {}", e)))?;
    Ok(CommentThread::new(None, &comments))
}

/// One `@token` and the roster entry it resolved to.
#[derive(Debug, Clone, Serialize)]
pub struct TokenMatch {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<TeamMember>,
}

/// Mentions and tags found in a piece of text.
#[derive(Debug, Clone, Serialize)]
pub struct MentionReport {
    pub tokens: Vec<TokenMatch>,
    /// Resolved member IDs, de-duplicated, in first-seen order
    pub mentions: Vec<String>,
    pub tags: Vec<String>,
}

impl Output for MentionReport {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if self.tokens.is_empty() {
            lines.push("No mentions.".to_string());
        }
        for m in &self.tokens {
            match &m.member {
                Some(member) => lines.push(format!("@{} → {} ({})", m.token, member.name, member.id)),
                None => lines.push(format!("@{} → (no match)", m.token)),
            }
        }
        if !self.tags.is_empty() {
            lines.push(format!("tags: #{}", self.tags.join(" #")));
        }
        lines.join("\n")
    }
}

/// Extract `@mentions` from `text` and resolve them against a roster file.
pub fn mentions(text: &str, roster_path: &Path) -> Result<MentionReport> {
    let roster_json = std::fs::read_to_string(roster_path).map_err(|e| {
        Error::InvalidInput(format!("Failed to read {}: {}", roster_path.display(), e))
    })?;
    let roster: Vec<TeamMember> = serde_json::from_str(&roster_json)
        .map_err(|e| Error::InvalidInput(format!("Expected a JSON array of team members: {}", e)))?;

    let tokens = extract_mention_tokens(text, &roster);
    let matches = tokens
        .iter()
        .map(|token| TokenMatch {
            token: token.clone(),
            member: match_member(token, &roster).cloned(),
        })
        .collect();

    Ok(MentionReport {
        tokens: matches,
        mentions: resolve_mentions(&tokens, &roster),
        tags: extract_tags(text),
    })
}
