//! Pruning: drop subtrees that cannot change a decision.

use tracing::debug;

use super::Pretree;
use crate::error::Result;
use crate::node::NodeArena;
use crate::vote::vote;

impl Pretree {
    /// Shrinks the tree to what is needed to reproduce its decisions.
    ///
    /// - A leaf keeps only the first character of its content.
    /// - A node with a single label keeps its first character and loses all
    ///   children.
    /// - Any other node drops each child whose only label is the node's own
    ///   decision, and the remaining children are pruned in turn.
    ///
    /// Runs on the object form; a flat tree is materialized first.
    pub fn prune(&mut self) -> Result<()> {
        let threshold = self.config.threshold;
        self.with_arena(|arena| {
            let before = arena.reachable();
            prune_arena(arena, threshold);
            let freed = arena.compact();
            debug!(before, after = arena.reachable(), freed, "pruned tree");
        })
    }
}

pub(crate) fn prune_arena(arena: &mut NodeArena, threshold: f64) {
    let mut stack = vec![arena.root()];
    while let Some(id) = stack.pop() {
        let node = arena.get_mut(id);
        if node.is_leaf() {
            node.content.truncate(1);
            continue;
        }
        if node.votes.len() == 1 {
            node.content.truncate(1);
            node.children.clear();
            continue;
        }

        let decision = vote(&node.votes, threshold);
        let children = std::mem::take(&mut arena.get_mut(id).children);
        let kept: Vec<_> = children
            .into_iter()
            .filter(|&child| {
                let redundant = match arena.get(child).votes.only_label() {
                    Some(label) => decision.as_deref() == Some(label),
                    None => false,
                };
                !redundant
            })
            .collect();
        stack.extend(kept.iter().copied());
        arena.get_mut(id).children.extend(kept);
    }
}
