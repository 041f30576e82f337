//! `@mention` and `#tag` handling for comment composition.
//!
//! Mentions go through two steps before a comment is posted:
//! 1. [`extract_mention_tokens`] splits raw `@name` tokens out of the text
//! 2. [`resolve_mentions`] matches those tokens against the team roster and
//!    yields the member IDs used for notification fan-out
//!
//! Resolution is best-effort. A token that matches nobody is ignored, and when
//! several members match, the first one in roster order wins.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::TeamMember;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s(\[{])#([\p{L}\p{N}_][\p{L}\p{N}_-]*)").expect("tag pattern is valid")
});

/// Characters after which an `@` starts a mention.
fn opens_mention(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '(' | '[' | '{' | '"' | '\''),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '\'')
}

/// First word of a name, split on whitespace and parentheses.
///
/// `"John (Site Lead)"` and `"John Smith"` both yield `"John"`.
fn first_word(s: &str) -> Option<&str> {
    s.split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .find(|w| !w.is_empty())
}

/// Case-insensitive prefix test that never slices inside a character.
fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.to_lowercase() == prefix.to_lowercase())
}

/// Longest roster name the text starts with, ending on a word boundary.
fn longest_roster_prefix<'a>(rest: &str, roster: &'a [TeamMember]) -> Option<&'a str> {
    roster
        .iter()
        .map(|m| m.name.trim())
        .filter(|name| !name.is_empty() && starts_with_ignore_case(rest, name))
        .filter(|name| {
            rest[name.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric())
        })
        .max_by_key(|name| name.len())
}

/// Split raw `@name` tokens out of message text.
///
/// An `@` opens a token only at the start of the text or after whitespace or
/// opening punctuation, so e-mail addresses are not mentions. Multi-word names
/// are taken greedily when the text spells out a roster name (`@John Smith`);
/// otherwise the token is the single word after `@`. Tokens are returned in
/// order of appearance without case-insensitive duplicates.
pub fn extract_mention_tokens(content: &str, roster: &[TeamMember]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut prev: Option<char> = None;

    for (i, c) in content.char_indices() {
        if c == '@' && opens_mention(prev) {
            let rest = &content[i + 1..];
            let token = match longest_roster_prefix(rest, roster) {
                Some(name) => rest[..name.len()].to_string(),
                None => {
                    let word: String = rest.chars().take_while(|c| is_word_char(*c)).collect();
                    word.trim_end_matches(['.', '-', '\'']).to_string()
                }
            };

            if !token.is_empty() && seen.insert(token.to_lowercase()) {
                tokens.push(token);
            }
        }
        prev = Some(c);
    }

    tokens
}

/// Extract unique `#tag` tokens (without the `#`) in order of appearance.
pub fn extract_tags(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    TAG_PATTERN
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .collect()
}

/// Find the roster member a single mention token refers to.
///
/// Rules are tried in order, each across the whole roster, all
/// case-insensitive:
/// 1. exact full-name match
/// 2. the member's name contains (or starts with) the token
/// 3. the first word of the member's name equals the first word of the token
///
/// Within a rule the first roster entry wins. Blank tokens match nobody.
pub fn match_member<'a>(token: &str, roster: &'a [TeamMember]) -> Option<&'a TeamMember> {
    let needle = token.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let names: Vec<String> = roster.iter().map(|m| m.name.trim().to_lowercase()).collect();

    if let Some(pos) = names.iter().position(|name| *name == needle) {
        return Some(&roster[pos]);
    }

    if let Some(pos) = names
        .iter()
        .position(|name| name.starts_with(&needle) || name.contains(&needle))
    {
        return Some(&roster[pos]);
    }

    let token_first = first_word(&needle)?;
    names
        .iter()
        .position(|name| first_word(name) == Some(token_first))
        .map(|pos| &roster[pos])
}

/// Resolve mention tokens to member IDs.
///
/// IDs appear in the order their first matching token appears; a member hit by
/// several tokens is listed once. Unmatched tokens are dropped silently.
pub fn resolve_mentions<S: AsRef<str>>(tokens: &[S], roster: &[TeamMember]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for token in tokens {
        match match_member(token.as_ref(), roster) {
            Some(member) => {
                if seen.insert(member.id.as_str()) {
                    ids.push(member.id.clone());
                }
            }
            None => {
                tracing::debug!(token = token.as_ref(), "mention matched no team member");
            }
        }
    }

    ids
}

/// Extract and resolve the mentions in a comment body in one step.
pub fn mentions_for_content(content: &str, roster: &[TeamMember]) -> Vec<String> {
    let tokens = extract_mention_tokens(content, roster);
    resolve_mentions(&tokens, roster)
}
