//! The [`Pretree`] classifier.
//!
//! A tree is authoritative in exactly one of two forms:
//!
//! - **Materialized**: a [`NodeArena`]. Training and pruning only run here.
//! - **Flat**: a [`FlatTree`] buffer. Lookups run directly over it.
//!
//! Any mutating call on a flat tree first materializes the whole arena and
//! drops the buffer; [`Pretree::freeze`] (and saving) goes the other way.
//! Lookups never convert.

mod insert;
mod lookup;
mod prune;
mod walk;

pub use lookup::{Hit, LookupMode};
pub use walk::WalkEntry;

use std::fmt;

use crate::config::{char_code, check_threshold, Config};
use crate::error::{PretreeError, Result};
use crate::flat::FlatTree;
use crate::node::NodeArena;
use crate::vote::VoteVector;

#[derive(Debug, Clone)]
enum Repr {
    Materialized(NodeArena),
    Flat(FlatTree),
}

/// Patricia trie mapping word forms to vote vectors over class labels.
#[derive(Debug, Clone)]
pub struct Pretree {
    config: Config,
    repr: Repr,
}

impl Pretree {
    /// An empty tree with the default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            repr: Repr::Materialized(NodeArena::new()),
        }
    }

    /// An empty tree with `config`.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            repr: Repr::Materialized(NodeArena::new()),
        })
    }

    /// A tree served from an existing flat buffer. The buffer is checked
    /// structurally before it is accepted.
    pub fn from_flat(config: Config, buf: Vec<char>) -> Result<Self> {
        config.validate()?;
        let flat = FlatTree::from_buffer(buf, &config)?;
        Ok(Self {
            config,
            repr: Repr::Flat(flat),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the flat buffer is the authoritative form.
    pub fn is_flat(&self) -> bool {
        matches!(self.repr, Repr::Flat(_))
    }

    /// The flat buffer, if that is the current form.
    pub fn flat(&self) -> Option<&FlatTree> {
        match &self.repr {
            Repr::Flat(flat) => Some(flat),
            Repr::Materialized(_) => None,
        }
    }

    /// Converts the object form into the flat buffer. No-op when already flat.
    pub fn freeze(&mut self) -> Result<()> {
        if let Repr::Materialized(arena) = &self.repr {
            self.repr = Repr::Flat(FlatTree::encode(arena, &self.config)?);
        }
        Ok(())
    }

    /// Rebuilds the object form from the flat buffer and discards the buffer.
    /// No-op when already materialized.
    pub fn materialize(&mut self) -> Result<()> {
        if let Repr::Flat(flat) = &self.repr {
            self.repr = Repr::Materialized(flat.to_arena()?);
        }
        Ok(())
    }

    /// Runs `f` on the arena, materializing it first if needed.
    pub(crate) fn with_arena<R>(&mut self, f: impl FnOnce(&mut NodeArena) -> R) -> Result<R> {
        match &mut self.repr {
            Repr::Materialized(arena) => Ok(f(arena)),
            Repr::Flat(flat) => {
                let mut arena = flat.to_arena()?;
                let out = f(&mut arena);
                self.repr = Repr::Materialized(arena);
                Ok(out)
            }
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Sets the minimum vote share of the winning class. Rejects values that
    /// are negative or not finite.
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        check_threshold(threshold)?;
        self.config.threshold = threshold;
        Ok(())
    }

    pub fn reverse(&self) -> bool {
        self.config.reverse
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.config.reverse = reverse;
    }

    pub fn ignore_case(&self) -> bool {
        self.config.ignore_case
    }

    pub fn set_ignore_case(&mut self, ignore_case: bool) {
        self.config.ignore_case = ignore_case;
    }

    /// Sets the lowest character of the numeric alphabet.
    pub fn set_low_char(&mut self, code: i64) -> Result<()> {
        let c = char_code(code)?;
        self.reconfigure(|cfg| cfg.low_char = c as u32)
    }

    /// Sets the highest character of the numeric alphabet.
    pub fn set_high_char(&mut self, code: i64) -> Result<()> {
        let c = char_code(code)?;
        self.reconfigure(|cfg| cfg.high_char = c as u32)
    }

    /// Sets both ends of the numeric alphabet at once.
    pub fn set_alphabet(&mut self, low: i64, high: i64) -> Result<()> {
        let (low, high) = (char_code(low)?, char_code(high)?);
        self.reconfigure(|cfg| {
            cfg.low_char = low as u32;
            cfg.high_char = high as u32;
        })
    }

    pub fn set_number_marker(&mut self, code: i64) -> Result<()> {
        let c = char_code(code)?;
        self.reconfigure(|cfg| cfg.number_marker = c)
    }

    pub fn set_node_marker(&mut self, code: i64) -> Result<()> {
        let c = char_code(code)?;
        self.reconfigure(|cfg| cfg.node_marker = c)
    }

    /// Sets the end-of-word sentinel. Keys trained before the change keep the
    /// old sentinel.
    pub fn set_end_of_word(&mut self, code: i64) -> Result<()> {
        let c = char_code(code)?;
        let mut next = self.config.clone();
        next.end_of_word = c;
        next.validate()?;
        self.config = next;
        Ok(())
    }

    /// Applies a change to settings the flat buffer depends on. The new
    /// configuration is validated before anything is touched; the tree is
    /// then materialized so the buffer is rebuilt with the new layout.
    fn reconfigure(&mut self, change: impl FnOnce(&mut Config)) -> Result<()> {
        let mut next = self.config.clone();
        change(&mut next);
        next.validate()?;
        self.materialize()?;
        self.config = next;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    fn root_votes(&self) -> Result<VoteVector> {
        match &self.repr {
            Repr::Materialized(arena) => Ok(arena.get(arena.root()).votes.clone()),
            Repr::Flat(flat) => Ok(flat.votes_at(flat.root_pos())?.0),
        }
    }

    /// Number of distinct class labels seen in training.
    pub fn class_count(&self) -> Result<usize> {
        Ok(self.root_votes()?.len())
    }

    /// Sum of all training counts.
    pub fn total_count(&self) -> Result<u64> {
        Ok(self.root_votes()?.total())
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> Result<usize> {
        match &self.repr {
            Repr::Materialized(arena) => Ok(arena.reachable()),
            Repr::Flat(flat) => flat.validate(),
        }
    }

    /// Renders a node fragment for display: un-reversed when keys are
    /// reversed, with the end-of-word sentinel shown as `$`.
    pub(crate) fn display_content(&self, content: &[char]) -> String {
        let eow = self.config.end_of_word;
        let shown = content.iter().map(|&c| if c == eow { '$' } else { c });
        if self.config.reverse {
            shown.rev().collect()
        } else {
            shown.collect()
        }
    }
}

impl Default for Pretree {
    fn default() -> Self {
        Self::new()
    }
}

/// Indented dump of every node: one line per node, `depth` dashes, the
/// node's content and its votes.
impl fmt::Display for Pretree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = Ok(());
        let walked = self.walk(|e| {
            if out.is_ok() {
                out = writeln!(
                    f,
                    "{}{} {}",
                    "-".repeat(e.depth),
                    self.display_content(e.content),
                    e.votes
                );
            }
        });
        out?;
        walked.map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeze_and_materialize() {
        let mut t = Pretree::new();
        t.train("walked", "2", 1).unwrap();
        assert!(!t.is_flat());
        t.freeze().unwrap();
        assert!(t.is_flat());
        assert!(t.flat().is_some());
        t.materialize().unwrap();
        assert!(!t.is_flat());
        assert_eq!(t.classify("walked"), "2");
    }

    #[test]
    fn test_setters_reject_negative_codes_without_mutation() {
        let mut t = Pretree::new();
        t.train("a", "x", 1).unwrap();
        t.freeze().unwrap();

        assert!(matches!(
            t.set_low_char(-5),
            Err(PretreeError::InvalidCharCode(-5))
        ));
        assert!(t.set_node_marker(-1).is_err());
        assert!(t.set_end_of_word(-1).is_err());
        assert_eq!(t.config(), &Config::default());
        // Fail-fast: no conversion happened either.
        assert!(t.is_flat());
    }

    #[test]
    fn test_alphabet_change_rebuilds_layout() {
        let mut t = Pretree::new();
        t.train("house", "0", 3).unwrap();
        t.train("mouse", "4ice", 1).unwrap();
        t.freeze().unwrap();

        t.set_alphabet(48, 57).unwrap();
        assert!(!t.is_flat());
        assert_eq!(t.config().basis(), 10);
        assert_eq!(t.config().offset_width(), 10);

        t.freeze().unwrap();
        let text: String = t.flat().unwrap().as_chars().iter().collect();
        assert!(text.contains("0000000"));
        assert_eq!(t.classify("mouse"), "4ice");
        assert_eq!(t.classify("house"), "0");
    }

    #[test]
    fn test_threshold_must_be_finite() {
        let mut t = Pretree::new();
        t.train("walked", "2", 1).unwrap();
        for bad in [f64::NAN, f64::INFINITY, -0.5] {
            assert!(matches!(
                t.set_threshold(bad),
                Err(PretreeError::InvalidThreshold(_))
            ));
        }
        assert_eq!(t.threshold(), 0.0);
        assert_eq!(t.classify("walked"), "2");
        t.set_threshold(1.0).unwrap();
        assert_eq!(t.classify("walked"), "2");
        assert!(Pretree::with_config(Config {
            threshold: f64::NAN,
            ..Config::default()
        })
        .is_err());
    }

    #[test]
    fn test_invalid_alphabet_is_rejected() {
        let mut t = Pretree::new();
        assert!(matches!(
            t.set_high_char(33),
            Err(PretreeError::InvalidAlphabet { .. })
        ));
        assert_eq!(t.config().high_char, 248);
        assert!(Pretree::with_config(Config {
            node_marker: '[',
            ..Config::default()
        })
        .is_err());
    }

    #[test]
    fn test_statistics() {
        let mut t = Pretree::new();
        t.train("cats", "1", 2).unwrap();
        t.train("dogs", "1", 1).unwrap();
        t.train("mice", "3ouse", 1).unwrap();
        assert_eq!(t.class_count().unwrap(), 2);
        assert_eq!(t.total_count().unwrap(), 4);
        let objects = t.node_count().unwrap();
        t.freeze().unwrap();
        assert_eq!(t.class_count().unwrap(), 2);
        assert_eq!(t.total_count().unwrap(), 4);
        assert_eq!(t.node_count().unwrap(), objects);
    }

    #[test]
    fn test_display() {
        let mut t = Pretree::new();
        t.train("ab", "x", 1).unwrap();
        t.train("ac", "y", 1).unwrap();
        let shown = t.to_string();
        assert_eq!(shown, " [x=1;y=1]\n-a [x=1;y=1]\n--b$ [x=1]\n--c$ [y=1]\n");
    }
}
