//! Per-tree settings.
//!
//! A [`Config`] fixes the numeric alphabet used for flat-buffer offsets, the
//! structural marker characters, and the key transforms applied before a word
//! enters the trie. The alphabet and markers shape the flat buffer, so
//! changing them on a live tree forces the object form first (see the setters
//! on [`Pretree`](crate::Pretree)).

use crate::error::{PretreeError, Result};

/// Opens the vote block of a flat node.
pub(crate) const VOTES_OPEN: char = '[';
/// Closes the vote block of a flat node.
pub(crate) const VOTES_CLOSE: char = ']';
/// Separates vote entries.
pub(crate) const VOTE_SEP: char = ';';
/// Separates a label from its count.
pub(crate) const VOTE_EQ: char = '=';

const DEFAULT_LOW_CHAR: u32 = 33;
const DEFAULT_HIGH_CHAR: u32 = 248;
const DEFAULT_NUMBER_MARKER: char = '\u{2}';
const DEFAULT_NODE_MARKER: char = '\u{3}';
const DEFAULT_END_OF_WORD: char = '\u{4}';

/// Largest offset the flat format must be able to address.
pub(crate) const MAX_OFFSET: u64 = i32::MAX as u64;

/// Configuration for a [`Pretree`](crate::Pretree).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Lowest code point of the numeric alphabet.
    pub low_char: u32,
    /// Highest code point of the numeric alphabet.
    pub high_char: u32,
    /// Separates a child's content from its offset.
    pub number_marker: char,
    /// Starts every node block.
    pub node_marker: char,
    /// Appended to every key on insertion and lookup.
    pub end_of_word: char,
    /// Index words back to front.
    pub reverse: bool,
    /// Lowercase words before indexing.
    pub ignore_case: bool,
    /// Minimum share of votes the leading class needs.
    pub threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            low_char: DEFAULT_LOW_CHAR,
            high_char: DEFAULT_HIGH_CHAR,
            number_marker: DEFAULT_NUMBER_MARKER,
            node_marker: DEFAULT_NODE_MARKER,
            end_of_word: DEFAULT_END_OF_WORD,
            reverse: false,
            ignore_case: false,
            threshold: 0.0,
        }
    }
}

impl Config {
    /// Size of the numeric alphabet.
    pub fn basis(&self) -> u32 {
        self.high_char.saturating_sub(self.low_char).saturating_add(1)
    }

    /// Number of digits every offset occupies: `ceil(log_basis(i32::MAX))`.
    pub fn offset_width(&self) -> usize {
        offset_width_for(self.basis())
    }

    /// Checks that the alphabet is usable and the markers cannot be confused
    /// with each other or with the vote block syntax.
    pub fn validate(&self) -> Result<()> {
        if self.high_char < self.low_char || self.basis() < 2 {
            return Err(PretreeError::InvalidAlphabet {
                low: self.low_char,
                high: self.high_char,
            });
        }
        // Every digit must be a char, so the range may not span surrogates.
        if self.high_char > char::MAX as u32
            || (self.low_char <= 0xDFFF && self.high_char >= 0xD800)
        {
            return Err(PretreeError::InvalidAlphabet {
                low: self.low_char,
                high: self.high_char,
            });
        }

        check_threshold(self.threshold)?;

        let markers = [self.number_marker, self.node_marker, self.end_of_word];
        for (i, m) in markers.iter().enumerate() {
            if matches!(*m, VOTES_OPEN | VOTES_CLOSE | VOTE_SEP | VOTE_EQ)
                || markers[i + 1..].contains(m)
            {
                return Err(PretreeError::ReservedChar {
                    what: "marker",
                    text: m.to_string(),
                    code: *m as u32,
                });
            }
        }
        Ok(())
    }

    /// Characters a trained word may not contain.
    pub(crate) fn is_reserved_in_word(&self, c: char) -> bool {
        c == self.number_marker || c == self.node_marker || c == self.end_of_word
    }

    /// Applies the case and direction transforms and appends the sentinel.
    pub(crate) fn key_for(&self, word: &str) -> Vec<char> {
        let mut key: Vec<char> = if self.ignore_case {
            word.to_lowercase().chars().collect()
        } else {
            word.chars().collect()
        };
        if self.reverse {
            key.reverse();
        }
        key.push(self.end_of_word);
        key
    }
}

/// Converts a setter argument into a character code.
pub(crate) fn char_code(code: i64) -> Result<char> {
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or(PretreeError::InvalidCharCode(code))
}

/// A threshold is a vote share: finite and not negative.
pub(crate) fn check_threshold(threshold: f64) -> Result<()> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(())
    } else {
        Err(PretreeError::InvalidThreshold(threshold))
    }
}

fn offset_width_for(basis: u32) -> usize {
    if basis < 2 {
        return 0;
    }
    let mut width = 0;
    let mut reach: u64 = 1;
    while reach < MAX_OFFSET {
        reach = reach.saturating_mul(basis as u64);
        width += 1;
    }
    width
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_width() {
        let cfg = Config::default();
        assert_eq!(cfg.basis(), 216);
        // 216^3 < 2^31 - 1 <= 216^4
        assert_eq!(cfg.offset_width(), 4);
    }

    #[test]
    fn test_width_small_basis() {
        assert_eq!(offset_width_for(2), 31);
        assert_eq!(offset_width_for(10), 10);
        assert_eq!(offset_width_for(0x10FFFF), 2);
    }

    #[test]
    fn test_validate_rejects_bad_alphabet() {
        let cfg = Config {
            low_char: 100,
            high_char: 100,
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(PretreeError::InvalidAlphabet { .. })
        ));

        let cfg = Config {
            low_char: 0xD000,
            high_char: 0xE000,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_clashing_markers() {
        let cfg = Config {
            node_marker: '\u{2}',
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(PretreeError::ReservedChar { .. })
        ));

        let cfg = Config {
            number_marker: ']',
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        for threshold in [f64::NAN, f64::NEG_INFINITY, -1.0] {
            let cfg = Config {
                threshold,
                ..Config::default()
            };
            assert!(matches!(
                cfg.validate(),
                Err(PretreeError::InvalidThreshold(_))
            ));
        }
        let cfg = Config {
            threshold: 0.75,
            ..Config::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_char_code() {
        assert_eq!(char_code(65).unwrap(), 'A');
        assert!(matches!(
            char_code(-1),
            Err(PretreeError::InvalidCharCode(-1))
        ));
        assert!(char_code(0xD800).is_err());
    }

    #[test]
    fn test_key_transforms() {
        let cfg = Config {
            reverse: true,
            ignore_case: true,
            ..Config::default()
        };
        let key: String = cfg.key_for("AbC").into_iter().collect();
        assert_eq!(key, "cba\u{4}");
    }
}
