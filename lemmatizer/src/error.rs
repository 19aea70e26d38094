use pretree::rule::RuleError;
use pretree::PretreeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LemmatizerError>;

#[derive(Error, Debug)]
pub enum LemmatizerError {
    /// Loading or training a model failed.
    #[error(transparent)]
    Tree(#[from] PretreeError),

    /// A rule code could not be applied.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Models and POS prefixes must pair up one to one.
    #[error("{models} models given for {prefixes} POS tag prefixes")]
    ModelCountMismatch { models: usize, prefixes: usize },

    /// A line of a training file could not be parsed.
    #[error("{path}:{line}: {reason}")]
    Input {
        path: String,
        line: usize,
        reason: String,
    },

    /// A `PREFIX=PATH` model argument without the `=`.
    #[error("invalid model argument {0:?}, expected PREFIX=PATH")]
    ModelSpec(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
