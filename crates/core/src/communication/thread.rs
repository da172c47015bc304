//! Flat message list → reply tree.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::MAX_REPLY_DEPTH;

/// A stored message as loaded for one thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadMessage {
    /// Message id.
    pub id: Uuid,
    /// Replied-to message.
    pub parent_id: Option<Uuid>,
    /// Author.
    pub author_id: Uuid,
    /// Author display name.
    pub author_name: String,
    /// Body.
    pub message: String,
    /// Edited after posting.
    pub is_edited: bool,
    /// Posted at.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// A message with its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageNode {
    /// The message.
    #[serde(flatten)]
    pub message: ThreadMessage,
    /// Replies ordered by creation time.
    pub replies: Vec<MessageNode>,
}

/// Builds the reply tree of one thread.
///
/// Roots and every reply list are ordered by creation time, ties broken by id.
/// A message whose parent is missing from `messages` is promoted to a root.
/// Replies nested deeper than [`MAX_REPLY_DEPTH`] are hung on the last allowed
/// level, so the tree never grows past it.
#[must_use]
pub fn build_thread(mut messages: Vec<ThreadMessage>) -> Vec<MessageNode> {
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let known: HashSet<Uuid> = messages.iter().map(|m| m.id).collect();
    let mut children: HashMap<Uuid, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (index, message) in messages.iter().enumerate() {
        match message.parent_id.filter(|id| known.contains(id)) {
            Some(parent) => children.entry(parent).or_default().push(index),
            None => roots.push(index),
        }
    }

    let placements = place(&messages, &roots, &mut children);
    assemble(messages, placements)
}

/// Where a message ends up: its depth and the parent it hangs on.
#[derive(Debug, Clone, Copy)]
struct Placement {
    depth: usize,
    parent: Option<Uuid>,
}

/// Walks the thread breadth-first from the roots, capping depth.
///
/// Messages unreachable from a root (a parent cycle) become roots themselves.
fn place(
    messages: &[ThreadMessage],
    roots: &[usize],
    children: &mut HashMap<Uuid, Vec<usize>>,
) -> Vec<Option<Placement>> {
    const ROOT: Placement = Placement {
        depth: 0,
        parent: None,
    };

    let mut placements: Vec<Option<Placement>> = vec![None; messages.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for &root in roots {
        placements[root] = Some(ROOT);
        queue.push_back(root);
    }

    loop {
        while let Some(index) = queue.pop_front() {
            let Some(placement) = placements[index] else {
                continue;
            };
            let Some(replies) = children.remove(&messages[index].id) else {
                continue;
            };
            let (depth, parent) = if placement.depth < MAX_REPLY_DEPTH {
                (placement.depth + 1, Some(messages[index].id))
            } else {
                (placement.depth, placement.parent)
            };
            for reply in replies {
                if placements[reply].is_none() {
                    placements[reply] = Some(Placement { depth, parent });
                    queue.push_back(reply);
                }
            }
        }

        let Some(stranded) = placements.iter().position(Option::is_none) else {
            break;
        };
        placements[stranded] = Some(ROOT);
        queue.push_back(stranded);
    }
    placements
}

/// Builds nodes deepest level first so every reply list is complete before
/// its parent node is made.
fn assemble(
    messages: Vec<ThreadMessage>,
    placements: Vec<Option<Placement>>,
) -> Vec<MessageNode> {
    let mut ordered: Vec<(Placement, usize, ThreadMessage)> = messages
        .into_iter()
        .zip(placements)
        .enumerate()
        .filter_map(|(index, (message, placement))| placement.map(|p| (p, index, message)))
        .collect();
    ordered.sort_by(|a, b| b.0.depth.cmp(&a.0.depth).then(a.1.cmp(&b.1)));

    let mut replies: HashMap<Option<Uuid>, Vec<MessageNode>> = HashMap::new();
    for (placement, _, message) in ordered {
        let own = replies.remove(&Some(message.id)).unwrap_or_default();
        replies.entry(placement.parent).or_default().push(MessageNode {
            message,
            replies: own,
        });
    }
    replies.remove(&None).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn msg(id: u128, parent: Option<u128>, minute: u32) -> ThreadMessage {
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 12, minute, 0).unwrap();
        ThreadMessage {
            id: Uuid::from_u128(id),
            parent_id: parent.map(Uuid::from_u128),
            author_id: Uuid::nil(),
            author_name: "Ann".to_string(),
            message: format!("m{id}"),
            is_edited: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_nested_tree_ordered_by_time() {
        let messages = vec![
            msg(3, Some(1), 5),
            msg(2, None, 2),
            msg(1, None, 1),
            msg(4, Some(3), 6),
            msg(5, Some(1), 3),
        ];

        let tree = build_thread(messages);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].message.id, Uuid::from_u128(1));
        assert_eq!(tree[1].message.id, Uuid::from_u128(2));

        let replies = &tree[0].replies;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].message.id, Uuid::from_u128(5));
        assert_eq!(replies[1].message.id, Uuid::from_u128(3));
        assert_eq!(replies[1].replies[0].message.id, Uuid::from_u128(4));
    }

    #[test]
    fn test_orphan_promoted_to_root() {
        let tree = build_thread(vec![msg(7, Some(42), 1)]);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].replies.is_empty());
    }

    #[test]
    fn test_empty() {
        assert!(build_thread(Vec::new()).is_empty());
    }

    #[test]
    fn test_serializes_flat_with_replies() {
        let tree = build_thread(vec![msg(1, None, 1)]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[0]["message"], "m1");
        assert!(json[0]["replies"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_deep_chain_is_flattened_at_depth_limit() {
        let chain_len = 10_000u128;
        let messages: Vec<ThreadMessage> = (1..=chain_len)
            .map(|id| {
                let mut m = msg(id, (id > 1).then(|| id - 1), 0);
                m.created_at += chrono::Duration::seconds(i64::try_from(id).unwrap());
                m
            })
            .collect();

        let tree = build_thread(messages);

        assert_eq!(tree.len(), 1);
        let mut node = &tree[0];
        for _ in 0..MAX_REPLY_DEPTH - 1 {
            assert_eq!(node.replies.len(), 1);
            node = &node.replies[0];
        }
        let last_level = &node.replies;
        let expected = usize::try_from(chain_len).unwrap() - MAX_REPLY_DEPTH;
        assert_eq!(last_level.len(), expected);
        assert!(last_level.iter().all(|reply| reply.replies.is_empty()));
        assert_eq!(last_level[0].message.id, Uuid::from_u128(u128::try_from(MAX_REPLY_DEPTH).unwrap() + 1));
        assert_eq!(last_level[expected - 1].message.id, Uuid::from_u128(chain_len));

        let json = serde_json::to_value(&tree).unwrap();
        assert!(json.is_array());
    }

    #[test]
    fn test_parent_cycle_does_not_lose_messages() {
        let tree = build_thread(vec![msg(1, Some(2), 1), msg(2, Some(1), 2)]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].message.id, Uuid::from_u128(1));
        assert_eq!(tree[0].replies[0].message.id, Uuid::from_u128(2));
    }
}
