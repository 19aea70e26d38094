//! Rule codes turning a full form into its base form.
//!
//! A rule is the class label a lemmatizing tree is trained on:
//!
//! - `<n><suffix>`: drop the last `n` characters, append `suffix`
//!   (`"4"`: running → run, `"5aus"`: Häuser → Haus).
//! - `<prefix>#<n><suffix>`: additionally drop the first `len(prefix)`
//!   characters (`"ge#5ingen"`: gesungen → singen).
//! - `ä<n>`: drop `n` characters and replace umlauts with their base vowel.
//!
//! `n` is read as two digits when two digits follow, so a one-digit count
//! followed by a suffix starting with a digit cannot be told apart from a
//! two-digit count.

use thiserror::Error;

use crate::vote::UNDECIDED;

const PREFIX_MARK: char = '#';
const UMLAUT_MARK: char = 'ä';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("empty rule")]
    Empty,

    #[error("malformed rule {0:?}")]
    Malformed(String),

    #[error("rule {rule:?} removes {remove} characters from {word:?}")]
    OutOfRange {
        rule: String,
        word: String,
        remove: usize,
    },
}

/// Derives the rule that rewrites `full` into `base`.
///
/// The longest substring of `full` that is also a prefix of `base` is kept;
/// among equally long candidates the leftmost wins. Characters before it are
/// recorded as a `#` prefix, characters after it as the truncation count, and
/// the rest of `base` as the suffix. Without any shared substring the rule
/// truncates all of `full` and appends all of `base`.
pub fn create_rule(full: &str, base: &str) -> String {
    let full: Vec<char> = full.chars().collect();
    let base: Vec<char> = base.chars().collect();
    let n = full.len();

    let mut best: Option<(usize, usize)> = None;
    for i in 0..n {
        // Longest first; a later start only wins when strictly longer.
        let longest = (i..=n)
            .rev()
            .take_while(|&j| j > i)
            .find(|&j| base.starts_with(&full[i..j]));
        if let Some(j) = longest {
            if best.map_or(true, |(bi, bj)| j - i > bj - bi) {
                best = Some((i, j));
            }
        }
    }

    match best {
        Some((i, j)) => {
            let mut rule = String::new();
            if i != 0 {
                rule.extend(&full[..i]);
                rule.push(PREFIX_MARK);
            }
            rule.push_str(&(n - j).to_string());
            rule.extend(&base[j - i..]);
            rule
        }
        None => {
            let mut rule = n.to_string();
            rule.extend(&base);
            rule
        }
    }
}

/// Applies `rule` to `full`. [`UNDECIDED`] passes through unchanged.
pub fn apply_rule(full: &str, rule: &str) -> Result<String, RuleError> {
    if rule == UNDECIDED {
        return Ok(UNDECIDED.to_string());
    }
    let code: Vec<char> = rule.chars().collect();
    let word: Vec<char> = full.chars().collect();
    let malformed = || RuleError::Malformed(rule.to_string());

    match code.first() {
        None => return Err(RuleError::Empty),
        Some(&UMLAUT_MARK) => {
            let remove = code
                .get(1)
                .and_then(|c| c.to_digit(10))
                .ok_or_else(malformed)?;
            let stem = truncate(&word, remove as usize, rule)?;
            return Ok(umlaut_strip(&stem.iter().collect::<String>()));
        }
        Some(_) => {}
    }

    match code.iter().position(|&c| c == PREFIX_MARK) {
        Some(at) => {
            let rest = word.get(at..).ok_or_else(|| RuleError::OutOfRange {
                rule: rule.to_string(),
                word: full.to_string(),
                remove: at,
            })?;
            match truncation(&code[at + 1..]) {
                Some((remove, suffix)) => rewrite(rest, remove, suffix, rule),
                None => Ok(rest.iter().collect()),
            }
        }
        None => {
            let (remove, suffix) = truncation(&code).ok_or_else(malformed)?;
            rewrite(&word, remove, suffix, rule)
        }
    }
}

/// Replaces ä, ö, ü (either case) with the plain vowel.
pub fn umlaut_strip(word: &str) -> String {
    word.chars()
        .map(|c| match c {
            'ä' => 'a',
            'Ä' => 'A',
            'ö' => 'o',
            'Ö' => 'O',
            'ü' => 'u',
            'Ü' => 'U',
            c => c,
        })
        .collect()
}

/// Splits a leading truncation count, two digits if present, off `code`.
fn truncation(code: &[char]) -> Option<(usize, &[char])> {
    let digit = |c: &char| c.to_digit(10);
    match code {
        [a, b, rest @ ..] if digit(a).is_some() && digit(b).is_some() => {
            Some(((digit(a)? * 10 + digit(b)?) as usize, rest))
        }
        [a, rest @ ..] => Some((digit(a)? as usize, rest)),
        [] => None,
    }
}

fn truncate<'a>(word: &'a [char], remove: usize, rule: &str) -> Result<&'a [char], RuleError> {
    let keep = word
        .len()
        .checked_sub(remove)
        .ok_or_else(|| RuleError::OutOfRange {
            rule: rule.to_string(),
            word: word.iter().collect(),
            remove,
        })?;
    Ok(&word[..keep])
}

fn rewrite(word: &[char], remove: usize, suffix: &[char], rule: &str) -> Result<String, RuleError> {
    let mut out: String = truncate(word, remove, rule)?.iter().collect();
    out.extend(suffix);
    Ok(out)
}
