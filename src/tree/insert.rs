//! Training: inserting keys with their votes.

use smallvec::smallvec;
use tracing::trace;

use super::Pretree;
use crate::config::{VOTES_CLOSE, VOTE_SEP};
use crate::encoding::common_prefix_len;
use crate::error::{PretreeError, Result};
use crate::node::{Node, NodeArena, NodeId};
use crate::vote::VoteVector;

impl Pretree {
    /// Records that `word` belongs to `class`, `count` times.
    pub fn train(&mut self, word: &str, class: &str, count: u64) -> Result<()> {
        if word.is_empty() {
            return Err(PretreeError::EmptyWord);
        }
        if let Some(c) = class.chars().find(|&c| c == VOTES_CLOSE || c == VOTE_SEP) {
            return Err(PretreeError::ReservedChar {
                what: "class",
                text: class.to_string(),
                code: c as u32,
            });
        }

        // Checked after case folding: the stored key is what gets encoded.
        let key = self.config.key_for(word);
        if let Some(&c) = key[..key.len() - 1]
            .iter()
            .find(|&&c| self.config.is_reserved_in_word(c))
        {
            return Err(PretreeError::ReservedChar {
                what: "word",
                text: word.to_string(),
                code: c as u32,
            });
        }

        let votes = VoteVector::single(class, count);
        trace!(word, class, count, "train");
        self.with_arena(|arena| insert_key(arena, &key, &votes))
    }

    /// Trains every `(word, class, count)` triple in order.
    pub fn train_many<'a, I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str, u64)>,
    {
        for (word, class, count) in entries {
            self.train(word, class, count)?;
        }
        Ok(())
    }
}

/// Merges `key` with `votes` into the tree.
///
/// Walking down from the root, every node whose content the key passes
/// through accumulates `votes`. Where the key leaves the tree it becomes a
/// new leaf; where it diverges inside a node's content that node is split at
/// the divergence point.
pub(crate) fn insert_key(arena: &mut NodeArena, key: &[char], votes: &VoteVector) {
    let mut at = arena.root();
    let mut rest = key;

    loop {
        let node = arena.get_mut(at);
        node.votes = node.votes.merge(votes);
        let Some(&first) = rest.first() else {
            return;
        };

        let Some((_, child)) = arena.child_starting_with(at, first) else {
            let leaf = arena.alloc(Node::new(rest.to_vec(), votes.clone()));
            arena.get_mut(at).children.push(leaf);
            return;
        };

        let content_len = arena.get(child).content.len();
        let shared = common_prefix_len(&arena.get(child).content, rest);
        if shared < content_len && shared < rest.len() {
            split(arena, child, shared, &rest[shared..], votes);
            return;
        }

        // Either the child's content is a prefix of the key, or the key ends
        // inside it; in both cases the child takes the votes.
        at = child;
        rest = &rest[shared..];
    }
}

/// Splits `id` after `at` characters. The node keeps the shared prefix and
/// becomes the parent of its old remainder and of a new leaf for `suffix`.
fn split(arena: &mut NodeArena, id: NodeId, at: usize, suffix: &[char], votes: &VoteVector) {
    let node = arena.get_mut(id);
    let tail = Node {
        content: node.content.split_off(at),
        children: std::mem::take(&mut node.children),
        votes: node.votes.clone(),
    };
    node.votes = node.votes.merge(votes);

    let tail = arena.alloc(tail);
    let leaf = arena.alloc(Node::new(suffix.to_vec(), votes.clone()));
    arena.get_mut(id).children = smallvec![tail, leaf];
}
