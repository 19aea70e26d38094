//! Lookup and classification over either form of the tree.

use tracing::warn;

use super::walk::WalkEntry;
use super::{Pretree, Repr};
use crate::error::Result;
use crate::flat::FlatTree;
use crate::node::{NodeArena, NodeId};
use crate::vote::{vote, VoteVector, UNDECIDED};

/// How a lookup treats a key that leaves the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Only a node whose accumulated content equals the key.
    Exact,
    /// The deepest node reached: when the key diverges inside a child's
    /// content, that child.
    NearestBelow,
    /// When the key diverges inside a child's content, back off to the last
    /// node whose content was fully consumed.
    NearestAbove,
}

/// A node returned by [`Pretree::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// The node's own content fragment.
    pub content: String,
    pub votes: VoteVector,
}

/// Where a lookup ended, together with the storage it ended in.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Located<'a> {
    Object {
        arena: &'a NodeArena,
        id: NodeId,
    },
    Flat {
        flat: &'a FlatTree,
        pos: usize,
        content: &'a [char],
    },
}

impl<'a> Located<'a> {
    pub(super) fn root(repr: &'a Repr) -> Self {
        match repr {
            Repr::Materialized(arena) => Located::Object {
                arena,
                id: arena.root(),
            },
            Repr::Flat(flat) => Located::Flat {
                flat,
                pos: flat.root_pos(),
                content: flat.root_content(),
            },
        }
    }

    /// The node's own content fragment.
    pub(crate) fn content(self) -> &'a [char] {
        match self {
            Located::Object { arena, id } => &arena.get(id).content,
            Located::Flat { content, .. } => content,
        }
    }

    pub(crate) fn votes(self) -> Result<VoteVector> {
        match self {
            Located::Object { arena, id } => Ok(arena.get(id).votes.clone()),
            Located::Flat { flat, pos, .. } => Ok(flat.votes_at(pos)?.0),
        }
    }
}

/// What to do after matching one step against a child.
enum Step {
    Descend,
    Stop,
}

fn step(child_content: &[char], rest: &[char]) -> Step {
    if child_content.len() <= rest.len() && rest[..child_content.len()] == *child_content {
        Step::Descend
    } else {
        Step::Stop
    }
}

fn locate_object(arena: &NodeArena, key: &[char], mode: LookupMode) -> Option<NodeId> {
    let mut at = arena.root();
    let mut rest = key;
    loop {
        let Some(&first) = rest.first() else {
            return Some(at);
        };
        let Some((_, child)) = arena.child_starting_with(at, first) else {
            return (mode != LookupMode::Exact).then_some(at);
        };
        let content = &arena.get(child).content;
        match step(content, rest) {
            Step::Descend => {
                rest = &rest[content.len()..];
                at = child;
            }
            Step::Stop => {
                return match mode {
                    LookupMode::Exact => None,
                    LookupMode::NearestBelow => Some(child),
                    LookupMode::NearestAbove => Some(at),
                };
            }
        }
    }
}

fn locate_flat<'a>(flat: &'a FlatTree, key: &[char], mode: LookupMode) -> Result<Option<Located<'a>>> {
    let mut pos = flat.root_pos();
    let mut content = flat.root_content();
    let mut rest = key;
    loop {
        let here = Located::Flat { flat, pos, content };
        let Some(&first) = rest.first() else {
            return Ok(Some(here));
        };
        let Some(child) = flat.child_starting_with(pos, first)? else {
            return Ok((mode != LookupMode::Exact).then_some(here));
        };
        match step(child.content, rest) {
            Step::Descend => {
                rest = &rest[child.content.len()..];
                pos = child.offset;
                content = child.content;
            }
            Step::Stop => {
                return Ok(match mode {
                    LookupMode::Exact => None,
                    LookupMode::NearestBelow => Some(Located::Flat {
                        flat,
                        pos: child.offset,
                        content: child.content,
                    }),
                    LookupMode::NearestAbove => Some(here),
                });
            }
        }
    }
}

impl Pretree {
    /// Finds the node for a transformed key (sentinel included).
    pub(crate) fn locate(&self, key: &[char], mode: LookupMode) -> Result<Option<Located<'_>>> {
        match &self.repr {
            Repr::Materialized(arena) => {
                Ok(locate_object(arena, key, mode).map(|id| Located::Object { arena, id }))
            }
            Repr::Flat(flat) => locate_flat(flat, key, mode),
        }
    }

    /// Looks `word` up after applying the key transforms. `None` only in
    /// [`LookupMode::Exact`] when the word was never trained.
    pub fn get(&self, word: &str, mode: LookupMode) -> Result<Option<Hit>> {
        let key = self.config.key_for(word);
        match self.locate(&key, mode)? {
            Some(at) => Ok(Some(Hit {
                content: at.content().iter().collect(),
                votes: at.votes()?,
            })),
            None => Ok(None),
        }
    }

    /// Votes at the node `word` classifies by.
    pub fn class_distribution(&self, word: &str) -> Result<VoteVector> {
        let key = self.config.key_for(word);
        match self.locate(&key, LookupMode::NearestBelow)? {
            Some(at) => at.votes(),
            None => Ok(VoteVector::new()),
        }
    }

    /// Majority class for `word`, or [`UNDECIDED`] when no class reaches the
    /// threshold.
    pub fn try_classify(&self, word: &str) -> Result<String> {
        let votes = self.class_distribution(word)?;
        Ok(vote(&votes, self.config.threshold).unwrap_or_else(|| UNDECIDED.to_string()))
    }

    /// Like [`try_classify`](Self::try_classify), reporting a corrupt buffer
    /// as [`UNDECIDED`].
    pub fn classify(&self, word: &str) -> String {
        self.try_classify(word).unwrap_or_else(|e| {
            warn!(word, error = %e, "classification failed");
            UNDECIDED.to_string()
        })
    }

    /// Share of `class` among the votes `word` classifies by; `0` when the
    /// node has no votes.
    pub fn probability_for_class(&self, word: &str, class: &str) -> f64 {
        match self.class_distribution(word) {
            Ok(votes) => votes.probability(class),
            Err(e) => {
                warn!(word, error = %e, "probability lookup failed");
                0.0
            }
        }
    }

    /// Indented dump of the subtree `word` classifies by.
    pub fn explain(&self, word: &str) -> Result<String> {
        let key = self.config.key_for(word);
        let Some(at) = self.locate(&key, LookupMode::NearestBelow)? else {
            return Ok(String::new());
        };
        let mut out = String::new();
        self.walk_from(at, &mut |e: WalkEntry<'_>| {
            out.push_str(&"-".repeat(e.depth));
            out.push_str(&self.display_content(e.content));
            out.push(' ');
            out.push_str(&e.votes.to_string());
            out.push('\n');
        })?;
        Ok(out)
    }
}
