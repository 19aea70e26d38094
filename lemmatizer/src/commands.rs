use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use lemmatizer::{Lemmatizer, LemmatizerError, PosLemmatizer, Result};
use pretree::rule::create_rule;
use pretree::Pretree;
use tracing::info;

pub fn print(models: &[PathBuf], out: &mut impl Write) -> Result<()> {
    for path in models {
        let tree = Pretree::open(path)?;
        writeln!(out, "tree: {}", path.display())?;
        writeln!(out, "classes: {}", tree.class_count()?)?;
        writeln!(out, "nodes: {}", tree.node_count()?)?;
        writeln!(out, "total count: {}", tree.total_count()?)?;
        writeln!(out, "ignore case: {}", tree.ignore_case())?;
        writeln!(out, "reverse: {}", tree.reverse())?;
        writeln!(out, "threshold: {}", tree.threshold())?;
        write!(out, "{}", tree.entries_string()?)?;
    }
    Ok(())
}

pub fn print_keys(models: &[PathBuf], out: &mut impl Write) -> Result<()> {
    for path in models {
        let tree = Pretree::open(path)?;
        writeln!(out, "tree: {}", path.display())?;
        for key in tree.keys()? {
            writeln!(out, "{key}")?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct TrainOptions {
    pub classes: bool,
    pub reverse: bool,
    pub ignore_case: bool,
    pub threshold: f64,
    pub prune: bool,
}

/// Trains a tree on `full<TAB>base[<TAB>count]` lines. `name` labels parse
/// errors.
pub fn train_from_reader<R: BufRead>(
    reader: R,
    name: &str,
    opts: &TrainOptions,
) -> Result<Pretree> {
    let mut tree = Pretree::new();
    tree.set_reverse(opts.reverse);
    tree.set_ignore_case(opts.ignore_case);
    tree.set_threshold(opts.threshold)?;

    let bad_line = |line: usize, reason: &str| LemmatizerError::Input {
        path: name.to_string(),
        line,
        reason: reason.to_string(),
    };

    let mut entries = 0usize;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let mut cols = line.split('\t');
        let (Some(full), Some(base)) = (cols.next(), cols.next()) else {
            return Err(bad_line(i + 1, "expected full<TAB>base[<TAB>count]"));
        };
        let count = match cols.next() {
            Some(n) => n
                .trim()
                .parse::<u64>()
                .map_err(|_| bad_line(i + 1, "count is not a number"))?,
            None => 1,
        };
        if cols.next().is_some() {
            return Err(bad_line(i + 1, "too many columns"));
        }
        let class = if opts.classes {
            base.to_string()
        } else {
            create_rule(full, base)
        };
        tree.train(full, &class, count)?;
        entries += 1;
    }

    if opts.prune {
        tree.prune()?;
    }
    info!(entries, nodes = tree.node_count()?, "trained {name}");
    Ok(tree)
}

pub fn train(
    input: &Path,
    output: &Path,
    opts: &TrainOptions,
    out: &mut impl Write,
) -> Result<()> {
    let reader = BufReader::new(File::open(input)?);
    let mut tree = train_from_reader(reader, &input.display().to_string(), opts)?;
    tree.save(output)?;
    writeln!(
        out,
        "{}: {} classes, {} nodes",
        output.display(),
        tree.class_count()?,
        tree.node_count()?
    )?;
    Ok(())
}

pub fn classify(model: &Path, words: &[String], out: &mut impl Write) -> Result<()> {
    let tree = Pretree::open(model)?;
    for word in words {
        writeln!(out, "{word}\t{}", tree.classify(word))?;
    }
    Ok(())
}

/// Splits `PREFIX=PATH`.
pub fn parse_model_spec(spec: &str) -> Result<(String, PathBuf)> {
    match spec.split_once('=') {
        Some((prefix, path)) if !prefix.is_empty() && !path.is_empty() => {
            Ok((prefix.to_string(), PathBuf::from(path)))
        }
        _ => Err(LemmatizerError::ModelSpec(spec.to_string())),
    }
}

/// Splits `word/TAG` at the last slash; a word without one has an empty tag.
pub fn split_tagged(token: &str) -> (&str, &str) {
    token.rsplit_once('/').unwrap_or((token, ""))
}

pub fn lemmatize(
    models: &[String],
    pos: bool,
    words: &[String],
    out: &mut impl Write,
) -> Result<()> {
    if pos {
        let specs = models
            .iter()
            .map(|m| parse_model_spec(m))
            .collect::<Result<Vec<_>>>()?;
        let (prefixes, paths): (Vec<String>, Vec<PathBuf>) = specs.into_iter().unzip();
        let lemmatizer = PosLemmatizer::open(&paths, &prefixes)?;
        for token in words {
            let (word, tag) = split_tagged(token);
            writeln!(out, "{token}\t{}", lemmatizer.lemmatize_word(word, tag))?;
        }
        return Ok(());
    }

    let [model] = models else {
        return Err(LemmatizerError::ModelCountMismatch {
            models: models.len(),
            prefixes: 1,
        });
    };
    let lemmatizer = Lemmatizer::open(model)?;
    for word in words {
        writeln!(out, "{word}\t{}", lemmatizer.lemmatize(word))?;
    }
    Ok(())
}

/// `words`, or the non-empty lines of stdin when none were given.
pub fn words_or_stdin(words: Vec<String>) -> Result<Vec<String>> {
    if !words.is_empty() {
        return Ok(words);
    }
    let mut out = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() {
            out.push(word.to_string());
        }
    }
    Ok(out)
}
