//! Vote vectors and the majority-vote decision.

use std::fmt;

use smallvec::SmallVec;

use crate::config::{VOTES_CLOSE, VOTES_OPEN, VOTE_EQ, VOTE_SEP};

/// Decision returned when no class reaches the threshold.
pub const UNDECIDED: &str = "undecided";

/// Joins the labels of a tie.
pub const TIE_SEPARATOR: char = VOTE_SEP;

/// One `label=count` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub label: String,
    pub count: u64,
}

impl Vote {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }

    /// Parses `label=count`, splitting at the last `=`.
    pub fn parse(entry: &str) -> Option<Self> {
        let (label, count) = entry.rsplit_once(VOTE_EQ)?;
        Some(Self::new(label, count.parse().ok()?))
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.label, VOTE_EQ, self.count)
    }
}

/// Accumulated training counts per class label, in first-seen order.
///
/// Most nodes carry one or two labels, so the entries live inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteVector(SmallVec<[Vote; 2]>);

impl VoteVector {
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    pub fn single(label: impl Into<String>, count: u64) -> Self {
        let mut v = Self::new();
        v.0.push(Vote::new(label, count));
        v
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vote> {
        self.0.iter()
    }

    /// Sum of all counts, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.0.iter().fold(0u64, |sum, v| sum.saturating_add(v.count))
    }

    pub fn count_of(&self, label: &str) -> u64 {
        self.0
            .iter()
            .find(|v| v.label == label)
            .map_or(0, |v| v.count)
    }

    /// The label when exactly one is present.
    pub fn only_label(&self) -> Option<&str> {
        match self.0.as_slice() {
            [only] => Some(&only.label),
            _ => None,
        }
    }

    /// `count(label) / total`, or `0` without votes.
    pub fn probability(&self, label: &str) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.count_of(label) as f64 / total as f64
    }

    /// Adds `count` to `label`, appending it if unseen. Counts saturate.
    pub fn add(&mut self, label: &str, count: u64) {
        match self.0.iter_mut().find(|v| v.label == label) {
            Some(v) => v.count = v.count.saturating_add(count),
            None => self.0.push(Vote::new(label, count)),
        }
    }

    /// Union of labels with counts summed; `self`'s order first.
    pub fn merge(&self, other: &VoteVector) -> VoteVector {
        let mut out = self.clone();
        for v in other.iter() {
            out.add(&v.label, v.count);
        }
        out
    }
}

impl FromIterator<Vote> for VoteVector {
    fn from_iter<I: IntoIterator<Item = Vote>>(iter: I) -> Self {
        let mut out = VoteVector::new();
        for v in iter {
            out.add(&v.label, v.count);
        }
        out
    }
}

impl<'a> IntoIterator for &'a VoteVector {
    type Item = &'a Vote;
    type IntoIter = std::slice::Iter<'a, Vote>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Formats as the flat vote block: `[a=1;b=2]`.
impl fmt::Display for VoteVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{VOTES_OPEN}")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{VOTE_SEP}")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "{VOTES_CLOSE}")
    }
}

/// Majority vote over `votes`.
///
/// The leader is the label with the highest count; labels tying the current
/// leader are joined with `;`. The leader is returned when its share of all
/// votes is at least `threshold`, otherwise [`UNDECIDED`]. No votes yields
/// `None`.
pub fn vote(votes: &VoteVector, threshold: f64) -> Option<String> {
    let mut iter = votes.iter();
    let first = iter.next()?;
    let mut leader = first.label.clone();
    let mut max = first.count;
    let mut sum = first.count;

    for v in iter {
        sum = sum.saturating_add(v.count);
        if v.count > max {
            max = v.count;
            leader.clone_from(&v.label);
        } else if v.count == max {
            leader.push(TIE_SEPARATOR);
            leader.push_str(&v.label);
        }
    }

    if sum > 0 && max as f64 / sum as f64 >= threshold {
        Some(leader)
    } else {
        Some(UNDECIDED.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes(entries: &[(&str, u64)]) -> VoteVector {
        entries.iter().map(|&(l, c)| Vote::new(l, c)).collect()
    }

    #[test]
    fn test_merge_sums_and_unions() {
        let a = votes(&[("x", 2), ("y", 1)]);
        let b = votes(&[("y", 3), ("z", 1)]);
        let m = a.merge(&b);
        assert_eq!(m, votes(&[("x", 2), ("y", 4), ("z", 1)]));
        // Inputs untouched.
        assert_eq!(a.total(), 3);
        assert_eq!(b.total(), 4);
    }

    #[test]
    fn test_vote_majority() {
        assert_eq!(vote(&votes(&[("a", 1), ("b", 3)]), 0.0).as_deref(), Some("b"));
        assert_eq!(vote(&votes(&[("a", 3), ("b", 1)]), 0.75).as_deref(), Some("a"));
        assert_eq!(vote(&votes(&[("a", 3), ("b", 1)]), 0.8).as_deref(), Some(UNDECIDED));
    }

    #[test]
    fn test_counts_saturate() {
        let mut v = VoteVector::single("x", u64::MAX);
        v.add("x", 1);
        assert_eq!(v.count_of("x"), u64::MAX);

        let v = votes(&[("x", u64::MAX), ("y", 1)]);
        assert_eq!(v.total(), u64::MAX);
        assert_eq!(vote(&v, 0.0).as_deref(), Some("x"));
        assert_eq!(vote(&v, 0.99).as_deref(), Some("x"));
        assert_eq!(v.merge(&v).count_of("y"), 2);
    }

    #[test]
    fn test_vote_tie_threshold_boundary() {
        let v = votes(&[("A", 5), ("B", 5)]);
        assert_eq!(vote(&v, 0.5).as_deref(), Some("A;B"));
        assert_eq!(vote(&v, 0.51).as_deref(), Some(UNDECIDED));
    }

    #[test]
    fn test_vote_tie_broken_by_later_maximum() {
        let v = votes(&[("a", 2), ("b", 2), ("c", 3)]);
        assert_eq!(vote(&v, 0.0).as_deref(), Some("c"));
    }

    #[test]
    fn test_vote_empty() {
        assert_eq!(vote(&VoteVector::new(), 0.0), None);
        assert_eq!(vote(&votes(&[("a", 0)]), 0.0).as_deref(), Some(UNDECIDED));
    }

    #[test]
    fn test_probability() {
        let v = votes(&[("a", 1), ("b", 3)]);
        assert_eq!(v.probability("b"), 0.75);
        assert_eq!(v.probability("missing"), 0.0);
        assert_eq!(VoteVector::new().probability("a"), 0.0);
    }

    #[test]
    fn test_display_and_parse() {
        let v = votes(&[("2e", 4), ("a=b", 1)]);
        assert_eq!(v.to_string(), "[2e=4;a=b=1]");
        assert_eq!(Vote::parse("a=b=1"), Some(Vote::new("a=b", 1)));
        assert_eq!(Vote::parse("nocount"), None);
        assert_eq!(Vote::parse("x=-1"), None);
    }
}
