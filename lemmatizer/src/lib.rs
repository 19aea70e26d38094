//! # lemmatizer
//!
//! Lemmatization with [`pretree`] models: a tree trained on
//! [rule codes](pretree::rule) predicts the rule for a word form, and the rule
//! rewrites the form into its lemma.
//!
//! ## Example
//!
//! ```rust
//! use lemmatizer::{Lemmatizer, PosLemmatizer};
//! use pretree::rule::create_rule;
//! use pretree::Pretree;
//!
//! let mut verbs = Pretree::new();
//! verbs.set_reverse(true);
//! for (full, base) in [("walked", "walk"), ("sitting", "sit")] {
//!     verbs.train(full, &create_rule(full, base), 1)?;
//! }
//!
//! let pos = PosLemmatizer::new(vec![("VB".to_string(), Lemmatizer::new(verbs))]);
//! assert_eq!(pos.lemmatize_word("talked", "VBD"), "talk");
//! assert_eq!(pos.lemmatize_word("talked", "NN"), "talked");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;

pub use error::{LemmatizerError, Result};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use pretree::rule::apply_rule;
use pretree::{Pretree, TIE_SEPARATOR, UNDECIDED};
use tracing::debug;

/// Model files of the English models, by POS tag prefix.
pub const ENGLISH_MODELS: [(&str, &str); 3] = [
    ("JJ", "en-adj-red.txt.ptrie"),
    ("NN", "en-noun-red-large.txt.ptrie"),
    ("VB", "en-verb-red.txt.ptrie"),
];

/// Model files of the German models, by POS tag prefix.
pub const GERMAN_MODELS: [(&str, &str); 3] = [
    ("ADJ", "de-adjectives.tree"),
    ("N", "de-nouns.tree"),
    ("V", "de-verbs.tree"),
];

/// Lemmatizes words with one rule-trained tree.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    tree: Pretree,
}

impl Lemmatizer {
    pub fn new(tree: Pretree) -> Self {
        Self { tree }
    }

    /// Opens a model file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Pretree::open(path)?))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::new(Pretree::read_from(reader)?))
    }

    pub fn tree(&self) -> &Pretree {
        &self.tree
    }

    pub fn into_tree(self) -> Pretree {
        self.tree
    }

    /// The lemma of `word`, or `None` when the model has no usable rule for
    /// it: a tie between rules, no decision, or a rule that yields nothing.
    pub fn try_lemmatize(&self, word: &str) -> Result<Option<String>> {
        let rule = self.tree.try_classify(word)?;
        if rule == UNDECIDED || rule.contains(TIE_SEPARATOR) {
            debug!(word, rule, "no single rule");
            return Ok(None);
        }
        let lemma = apply_rule(word, &rule)?;
        Ok(Some(lemma).filter(|l| !l.is_empty()))
    }

    /// The lemma of `word`, or `word` itself when no rule applies.
    pub fn lemmatize(&self, word: &str) -> String {
        match self.try_lemmatize(word) {
            Ok(Some(lemma)) => lemma,
            Ok(None) => word.to_string(),
            Err(e) => {
                debug!(word, error = %e, "falling back to the word");
                word.to_string()
            }
        }
    }
}

/// Routes words to a [`Lemmatizer`] by part-of-speech tag.
///
/// Each model is registered under a tag prefix; a word is lemmatized by the
/// first model, in registration order, whose prefix starts its tag.
#[derive(Debug, Clone, Default)]
pub struct PosLemmatizer {
    models: Vec<(String, Lemmatizer)>,
}

impl PosLemmatizer {
    pub fn new(models: Vec<(String, Lemmatizer)>) -> Self {
        Self { models }
    }

    /// Opens one model file per prefix.
    pub fn open<P, S>(paths: &[P], prefixes: &[S]) -> Result<Self>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        check_counts(paths.len(), prefixes.len())?;
        let models = prefixes
            .iter()
            .zip(paths)
            .map(|(prefix, path)| -> Result<(String, Lemmatizer)> {
                Ok((prefix.as_ref().to_string(), Lemmatizer::open(path)?))
            })
            .collect::<Result<_>>()?;
        Ok(Self::new(models))
    }

    /// Reads one model per prefix.
    pub fn from_readers<R, S>(readers: Vec<R>, prefixes: &[S]) -> Result<Self>
    where
        R: Read,
        S: AsRef<str>,
    {
        check_counts(readers.len(), prefixes.len())?;
        let models = prefixes
            .iter()
            .zip(readers)
            .map(|(prefix, reader)| -> Result<(String, Lemmatizer)> {
                Ok((
                    prefix.as_ref().to_string(),
                    Lemmatizer::from_reader(BufReader::new(reader))?,
                ))
            })
            .collect::<Result<_>>()?;
        Ok(Self::new(models))
    }

    /// English adjective, noun and verb models (`JJ`, `NN`, `VB`) from `dir`.
    pub fn english(dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_dir(dir.as_ref(), &ENGLISH_MODELS)
    }

    /// German adjective, noun and verb models (`ADJ`, `N`, `V`) from `dir`.
    pub fn german(dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_dir(dir.as_ref(), &GERMAN_MODELS)
    }

    fn from_dir(dir: &Path, files: &[(&str, &str)]) -> Result<Self> {
        // Open every file before parsing any of them.
        let readers = files
            .iter()
            .map(|(_, name)| File::open(dir.join(name)))
            .collect::<std::io::Result<Vec<_>>>()?;
        let prefixes: Vec<&str> = files.iter().map(|(prefix, _)| *prefix).collect();
        Self::from_readers(readers, &prefixes)
    }

    /// Registers another model after the existing ones.
    pub fn push(&mut self, prefix: impl Into<String>, lemmatizer: Lemmatizer) {
        self.models.push((prefix.into(), lemmatizer));
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|(prefix, _)| prefix.as_str())
    }

    /// The model responsible for `pos`.
    pub fn model_for(&self, pos: &str) -> Option<&Lemmatizer> {
        self.models
            .iter()
            .find(|(prefix, _)| pos.starts_with(prefix.as_str()))
            .map(|(_, lemmatizer)| lemmatizer)
    }

    /// Lemmatizes `word` with the model for `pos`; without one, `word` is
    /// returned unchanged.
    pub fn lemmatize_word(&self, word: &str, pos: &str) -> String {
        match self.model_for(pos) {
            Some(lemmatizer) => lemmatizer.lemmatize(word),
            None => word.to_string(),
        }
    }
}

fn check_counts(models: usize, prefixes: usize) -> Result<()> {
    if models != prefixes {
        return Err(LemmatizerError::ModelCountMismatch { models, prefixes });
    }
    Ok(())
}
