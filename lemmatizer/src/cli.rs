use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lemmatizer",
    about = "Train, inspect and apply Patricia trie lemmatizer models",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all log output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the settings, statistics and every node of each model
    #[command(alias = "p")]
    Print {
        /// Model files
        #[arg(required = true)]
        models: Vec<PathBuf>,
    },

    /// Print the accumulated key of every node of each model
    #[command(alias = "pk", alias = "printkeys")]
    PrintKeys {
        /// Model files
        #[arg(required = true)]
        models: Vec<PathBuf>,
    },

    /// Train a model from a tab-separated word list
    Train {
        /// Lines of `full<TAB>base[<TAB>count]`
        input: PathBuf,

        /// Model file to write
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Treat the second column as the class label instead of deriving a rule
        #[arg(long)]
        classes: bool,

        /// Index words back to front (suffix-based models)
        #[arg(long)]
        reverse: bool,

        /// Lowercase words before indexing
        #[arg(long)]
        ignore_case: bool,

        /// Minimum vote share of the winning class
        #[arg(long, default_value_t = 0.0)]
        threshold: f64,

        /// Prune the tree before saving
        #[arg(long)]
        prune: bool,
    },

    /// Print the class of each word (words are read from stdin if none are given)
    Classify {
        /// Model file
        #[arg(short = 'm', long = "model")]
        model: PathBuf,

        /// Words to classify
        words: Vec<String>,
    },

    /// Print the lemma of each word (words are read from stdin if none are given)
    Lemmatize {
        /// Model file, or `PREFIX=PATH` with --pos (repeatable)
        #[arg(short = 'm', long = "model", required = true)]
        models: Vec<String>,

        /// Input is `word/TAG`; each word goes to the model whose prefix starts its tag
        #[arg(long)]
        pos: bool,

        /// Words to lemmatize
        words: Vec<String>,
    },
}
