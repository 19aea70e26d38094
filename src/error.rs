use thiserror::Error;

/// Result type for trie operations.
pub type Result<T> = std::result::Result<T, PretreeError>;

/// Errors produced by [`Pretree`](crate::Pretree) and its flat encoding.
#[derive(Error, Debug)]
pub enum PretreeError {
    /// A configuration setter received a negative code or one that is not a
    /// Unicode scalar value.
    #[error("invalid character code {0}: must be a non-negative Unicode scalar value")]
    InvalidCharCode(i64),

    /// The numeric alphabet `low..=high` has fewer than two symbols.
    #[error("numeric alphabet {low}..={high} must contain at least two characters")]
    InvalidAlphabet { low: u32, high: u32 },

    /// A threshold that is negative, infinite or NaN.
    #[error("invalid threshold {0}: must be a finite, non-negative vote share")]
    InvalidThreshold(f64),

    /// Words must contain at least one character.
    #[error("cannot train an empty word")]
    EmptyWord,

    /// A word or class label contains a character the flat format reserves.
    #[error("{what} {text:?} contains reserved character U+{code:04X}")]
    ReservedChar {
        what: &'static str,
        text: String,
        code: u32,
    },

    /// The flat buffer is malformed.
    #[error("flat buffer decode error at position {pos}: {reason}")]
    Decode { pos: usize, reason: String },

    /// The model file header is not one this crate writes.
    #[error("model format error: {0}")]
    Format(String),

    /// The encoded tree does not fit the 32-bit offset space.
    #[error("flat buffer of {0} characters exceeds the addressable offset range")]
    BufferTooLarge(usize),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PretreeError {
    pub(crate) fn decode(pos: usize, reason: impl Into<String>) -> Self {
        PretreeError::Decode {
            pos,
            reason: reason.into(),
        }
    }
}
