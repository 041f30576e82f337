//! Comment threading.
//!
//! Turns the flat comment list returned by the API into a reply tree ready for
//! display. Root comments are ordered pinned-first, then newest-first; replies
//! keep the order in which they appear in the input.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Comment;

/// A comment together with its nested replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,

    #[serde(default)]
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn id(&self) -> &str {
        &self.comment.id
    }
}

// Unnests replies before they drop so long chains don't recurse
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// Build a reply tree from a flat list of comments.
///
/// A comment whose `parent_id` does not resolve to a comment in `comments` is
/// dropped, together with any replies beneath it. It is neither promoted to a
/// root nor reported as an error. An empty `parent_id` counts as no parent.
///
/// Comment IDs are expected to be unique; with duplicates, replies attach to
/// the first occurrence.
pub fn build_comment_tree(comments: &[Comment]) -> Vec<CommentNode> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(comments.len());
    for (i, comment) in comments.iter().enumerate() {
        index.entry(comment.id.as_str()).or_insert(i);
    }

    // Children are recorded in input order, which becomes reply order
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();

    for (i, comment) in comments.iter().enumerate() {
        match comment.parent_id.as_deref().filter(|p| !p.is_empty()) {
            None => roots.push(i),
            Some(parent_id) => match index.get(parent_id) {
                Some(&parent) => children.entry(parent).or_default().push(i),
                None => {
                    tracing::debug!(
                        comment_id = %comment.id,
                        parent_id = %parent_id,
                        "dropping comment with dangling parent"
                    );
                }
            },
        }
    }

    // Post-order walk with an explicit stack so reply depth is bounded only by memory
    let mut built: HashMap<usize, CommentNode> = HashMap::new();
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&i| (i, false)).collect();
    while let Some((idx, expanded)) = stack.pop() {
        if expanded {
            let replies = children
                .remove(&idx)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|child| built.remove(&child))
                .collect();
            built.insert(
                idx,
                CommentNode {
                    comment: comments[idx].clone(),
                    replies,
                },
            );
        } else {
            stack.push((idx, true));
            if let Some(kids) = children.get(&idx) {
                stack.extend(kids.iter().map(|&k| (k, false)));
            }
        }
    }

    let mut tree: Vec<CommentNode> = roots.iter().filter_map(|i| built.remove(i)).collect();

    sort_roots(&mut tree);
    tree
}

/// Pinned first; within each group, newest `created_at` first.
fn sort_roots(roots: &mut [CommentNode]) {
    roots.sort_by(|a, b| {
        b.comment
            .is_pinned
            .cmp(&a.comment.is_pinned)
            .then_with(|| b.comment.created_at.cmp(&a.comment.created_at))
    });
}

/// Depth-first, pre-order walk over every comment in the tree.
pub fn flatten_tree(tree: &[CommentNode]) -> Vec<&Comment> {
    let mut out = Vec::new();
    let mut stack: Vec<&CommentNode> = tree.iter().rev().collect();

    while let Some(node) = stack.pop() {
        out.push(&node.comment);
        stack.extend(node.replies.iter().rev());
    }

    out
}

/// Total number of replies nested under `node` at any depth.
pub fn count_replies(node: &CommentNode) -> usize {
    let mut count = 0;
    let mut stack: Vec<&CommentNode> = node.replies.iter().collect();
    while let Some(reply) = stack.pop() {
        count += 1;
        stack.extend(reply.replies.iter());
    }
    count
}
