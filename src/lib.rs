//! # pretree
//!
//! A Patricia trie that maps word forms to vote vectors over class labels and
//! classifies unseen words by their longest known prefix (or suffix, with
//! [`Pretree::set_reverse`]).
//!
//! A tree lives in one of two forms. Training and pruning work on an arena of
//! nodes; [`Pretree::freeze`] packs it into one flat character buffer that
//! lookups walk directly, jumping between nodes through fixed-width offsets.
//! Model files store the flat form.
//!
//! Trained on [rule codes](rule) instead of plain labels, a tree is a
//! lemmatizer:
//!
//! ## Example
//!
//! ```rust
//! use pretree::rule::{apply_rule, create_rule};
//! use pretree::Pretree;
//!
//! let mut tree = Pretree::new();
//! tree.set_reverse(true);
//! for (full, base) in [("walked", "walk"), ("talked", "talk"), ("sitting", "sit")] {
//!     tree.train(full, &create_rule(full, base), 1)?;
//! }
//! tree.freeze()?;
//!
//! let rule = tree.classify("stalked");
//! assert_eq!(rule, "2");
//! assert_eq!(apply_rule("stalked", &rule)?, "stalk");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

mod config;
mod encoding;
mod error;
mod flat;
mod node;
mod persist;
pub mod rule;
mod shared;
mod tree;
mod vote;

pub use config::Config;
pub use error::{PretreeError, Result};
pub use flat::FlatTree;
pub use shared::SharedPretree;
pub use tree::{Hit, LookupMode, Pretree, WalkEntry};
pub use vote::{vote, Vote, VoteVector, TIE_SEPARATOR, UNDECIDED};


#[cfg(test)]
mod proptests;
