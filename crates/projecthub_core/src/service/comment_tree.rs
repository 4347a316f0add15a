//! Threaded view over participation records.
//!
//! # Invariants
//! - Children keep the insertion order of the input slice.
//! - A record whose parent chain leads back to itself is a root.
//! - A record whose parent is outside the project's records is a root.
//! - Construction, traversal and drop never recurse.

use crate::model::participant::{ParticipantRecord, RecordId};
use crate::model::project::ProjectId;
use std::collections::HashMap;

/// One record with its direct replies.
#[derive(Debug, PartialEq, Eq)]
pub struct CommentNode {
    pub record: ParticipantRecord,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of transitive replies below this node.
    pub fn descendant_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&CommentNode> = self.replies.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }

    /// Pre-order walk yielding `(depth, record)`, this node at depth 0.
    pub fn walk(&self) -> Vec<(usize, &ParticipantRecord)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, &node.record));
            stack.extend(node.replies.iter().rev().map(|child| (depth + 1, child)));
        }
        out
    }
}

impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// Builds the reply forest of `project_id` from `records`.
pub fn build_comment_tree(records: &[ParticipantRecord], project_id: ProjectId) -> Vec<CommentNode> {
    let scoped: Vec<&ParticipantRecord> = records
        .iter()
        .filter(|record| record.project_id == project_id)
        .collect();
    let position: HashMap<RecordId, usize> = scoped
        .iter()
        .enumerate()
        .map(|(index, record)| (record.id, index))
        .collect();

    let parents = resolve_parents(&scoped, &position);
    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); scoped.len()];
    for (index, parent) in parents.iter().enumerate() {
        match parent {
            Some(parent) => children[*parent].push(index),
            None => roots.push(index),
        }
    }

    // Post-order assembly: every child is built before its parent.
    let mut built: Vec<Option<CommentNode>> = (0..scoped.len()).map(|_| None).collect();
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&root| (root, false)).collect();
    while let Some((index, expanded)) = stack.pop() {
        if expanded {
            let replies = children[index]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[index] = Some(CommentNode {
                record: scoped[index].clone(),
                replies,
            });
            continue;
        }
        stack.push((index, true));
        stack.extend(children[index].iter().rev().map(|&child| (child, false)));
    }

    roots
        .into_iter()
        .filter_map(|root| built[root].take())
        .collect()
}

/// Parent position per record; `None` marks a root.
///
/// Each record is visited once: parent chains are walked with an explicit
/// path, and every record on a cycle found along the way is made a root.
fn resolve_parents(
    scoped: &[&ParticipantRecord],
    position: &HashMap<RecordId, usize>,
) -> Vec<Option<usize>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unseen,
        OnPath,
        Done,
    }

    let mut parents: Vec<Option<usize>> = scoped
        .iter()
        .map(|record| {
            record
                .parent_id
                .and_then(|parent_id| position.get(&parent_id).copied())
        })
        .collect();
    let mut marks = vec![Mark::Unseen; scoped.len()];
    let mut path = Vec::new();

    for start in 0..scoped.len() {
        let mut cursor = Some(start);
        while let Some(index) = cursor {
            match marks[index] {
                Mark::Done => break,
                Mark::OnPath => {
                    let cycle_start = path
                        .iter()
                        .position(|&entry| entry == index)
                        .unwrap_or(path.len());
                    for &member in &path[cycle_start..] {
                        parents[member] = None;
                    }
                    break;
                }
                Mark::Unseen => {
                    marks[index] = Mark::OnPath;
                    path.push(index);
                    cursor = parents[index];
                }
            }
        }
        for index in path.drain(..) {
            marks[index] = Mark::Done;
        }
    }
    parents
}
