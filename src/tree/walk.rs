//! Depth-first traversal over either form, and the dumps built on it.

use std::collections::{BTreeMap, BTreeSet};

use super::lookup::Located;
use super::Pretree;
use crate::error::Result;
use crate::vote::VoteVector;

/// One node visited by [`Pretree::walk`].
#[derive(Debug, Clone)]
pub struct WalkEntry<'a> {
    /// Concatenated content from the start of the walk down to this node, in
    /// key form (reversed when the tree reverses, sentinel included).
    pub key: &'a [char],
    /// The node's own fragment.
    pub content: &'a [char],
    /// Distance from the node the walk started at.
    pub depth: usize,
    pub votes: VoteVector,
}

impl Pretree {
    /// Visits every node in preorder, children in stored order.
    pub fn walk<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(WalkEntry<'_>),
    {
        self.walk_from(Located::root(&self.repr), &mut f)
    }

    pub(crate) fn walk_from(&self, start: Located<'_>, f: &mut dyn FnMut(WalkEntry<'_>)) -> Result<()> {
        let mut key: Vec<char> = Vec::new();
        match start {
            Located::Object { arena, id } => {
                // (node, depth, key length before the node)
                let mut stack = vec![(id, 0, 0)];
                while let Some((id, depth, prefix)) = stack.pop() {
                    let node = arena.get(id);
                    key.truncate(prefix);
                    key.extend_from_slice(&node.content);
                    f(WalkEntry {
                        key: &key,
                        content: &node.content,
                        depth,
                        votes: node.votes.clone(),
                    });
                    let here = key.len();
                    stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1, here)));
                }
            }
            Located::Flat { flat, pos, content } => {
                let mut stack = vec![(pos, content, 0, 0)];
                while let Some((pos, content, depth, prefix)) = stack.pop() {
                    key.truncate(prefix);
                    key.extend_from_slice(content);
                    let (votes, _) = flat.votes_at(pos)?;
                    f(WalkEntry {
                        key: &key,
                        content,
                        depth,
                        votes,
                    });
                    let here = key.len();
                    let children = flat.children(pos)?.collect::<Result<Vec<_>>>()?;
                    stack.extend(
                        children
                            .into_iter()
                            .rev()
                            .map(|c| (c.offset, c.content, depth + 1, here)),
                    );
                }
            }
        }
        Ok(())
    }

    /// Accumulated key of every node mapped to its `[votes]` block.
    pub fn to_map(&self) -> Result<BTreeMap<String, String>> {
        let mut map = BTreeMap::new();
        self.walk(|e| {
            map.insert(e.key.iter().collect(), e.votes.to_string());
        })?;
        Ok(map)
    }

    /// Accumulated key of every node.
    pub fn keys(&self) -> Result<BTreeSet<String>> {
        let mut keys = BTreeSet::new();
        self.walk(|e| {
            keys.insert(e.key.iter().collect());
        })?;
        Ok(keys)
    }

    /// One `key\t[votes]` line per node, in preorder.
    pub fn entries_string(&self) -> Result<String> {
        let mut out = String::new();
        self.walk(|e| {
            out.extend(e.key.iter());
            out.push('\t');
            out.push_str(&e.votes.to_string());
            out.push('\n');
        })?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained() -> Pretree {
        let mut t = Pretree::new();
        t.train("cat", "0", 1).unwrap();
        t.train("cats", "1", 2).unwrap();
        t.train("dog", "0", 1).unwrap();
        t
    }

    #[test]
    fn test_walk_preorder() {
        let t = trained();
        let mut seen = Vec::new();
        t.walk(|e| seen.push((e.key.iter().collect::<String>(), e.depth)))
            .unwrap();
        assert_eq!(
            seen,
            vec![
                ("".to_string(), 0),
                ("cat".to_string(), 1),
                ("cat\u{4}".to_string(), 2),
                ("cats\u{4}".to_string(), 2),
                ("dog\u{4}".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_walk_same_over_both_forms() {
        let object = trained();
        let mut flat = object.clone();
        flat.freeze().unwrap();

        assert_eq!(object.to_map().unwrap(), flat.to_map().unwrap());
        assert_eq!(object.entries_string().unwrap(), flat.entries_string().unwrap());
        assert_eq!(object.to_string(), flat.to_string());
        // Walking does not convert.
        assert!(flat.is_flat());
    }

    #[test]
    fn test_to_map_and_keys() {
        let t = trained();
        let map = t.to_map().unwrap();
        assert_eq!(map.len(), 5);
        assert_eq!(map["cat"], "[0=1;1=2]");
        assert_eq!(map["cats\u{4}"], "[1=2]");
        assert!(t.keys().unwrap().contains("dog\u{4}"));

        let text = t.entries_string().unwrap();
        assert_eq!(text.lines().count(), 5);
        assert!(text.starts_with("\t[0=2;1=2]\n"));
    }

    #[test]
    fn test_reversed_keys_are_stored_reversed() {
        let mut t = Pretree::new();
        t.set_reverse(true);
        t.train("ab", "x", 1).unwrap();
        assert!(t.keys().unwrap().contains("ba\u{4}"));
        // Display un-reverses.
        assert_eq!(t.to_string(), " [x=1]\n-$ab [x=1]\n");
    }
}
