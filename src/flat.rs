//! Flat, position-addressed form of the trie.
//!
//! The whole tree is one character buffer written depth-first:
//!
//! ```text
//! <root content> N [l1=c1;l2=c2] <child content> M <offset> <child content> M <offset> ...
//!                N [ ... ] ...                      (first child's block)
//! ```
//!
//! `N` is the node marker, `M` the number marker. Every offset is a fixed-width
//! numeral (see [`OffsetCodec`]) holding the absolute position of the child's
//! `N`. A node's child list ends at the next `N` or at the end of the buffer.
//!
//! Lookups walk this buffer directly: they decode the votes and child entries
//! of the nodes on the search path and jump via offsets, never building nodes.
//! Children are always laid out after their parent, so every offset points
//! forward; the decoder relies on that to reject cyclic buffers.

use std::ops::Range;

use tracing::debug;

use crate::config::{Config, VOTES_CLOSE, VOTES_OPEN, VOTE_SEP};
use crate::encoding::OffsetCodec;
use crate::error::{PretreeError, Result};
use crate::node::{Node, NodeArena, NodeId};
use crate::vote::{Vote, VoteVector};

/// Structural characters and offset codec shared by encoder and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub codec: OffsetCodec,
    pub node_marker: char,
    pub number_marker: char,
}

impl Layout {
    pub fn new(config: &Config) -> Self {
        Self {
            codec: OffsetCodec::new(config),
            node_marker: config.node_marker,
            number_marker: config.number_marker,
        }
    }
}

/// One entry of a node's child list.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChildEntry<'a> {
    pub content: &'a [char],
    /// Position of the child's node marker.
    pub offset: usize,
}

/// The trie as a single character buffer.
#[derive(Debug, Clone)]
pub struct FlatTree {
    buf: Vec<char>,
    layout: Layout,
    root: usize,
}

impl FlatTree {
    /// Serializes the object form.
    pub(crate) fn encode(arena: &NodeArena, config: &Config) -> Result<Self> {
        let layout = Layout::new(config);
        let root = arena.get(arena.root());
        let mut buf: Vec<char> = root.content.clone();
        let root_pos = buf.len();
        write_node(arena, arena.root(), &layout, &mut buf)?;
        debug!(chars = buf.len(), "encoded flat tree");
        Ok(Self {
            buf,
            layout,
            root: root_pos,
        })
    }

    /// Wraps an existing buffer after checking its whole structure.
    pub fn from_buffer(buf: Vec<char>, config: &Config) -> Result<Self> {
        let layout = Layout::new(config);
        let root = buf
            .iter()
            .position(|&c| c == layout.node_marker)
            .ok_or_else(|| PretreeError::decode(0, "no root node marker"))?;
        let tree = Self { buf, layout, root };
        tree.validate()?;
        Ok(tree)
    }

    pub fn as_chars(&self) -> &[char] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Position of the root's node marker.
    #[inline]
    pub(crate) fn root_pos(&self) -> usize {
        self.root
    }

    pub(crate) fn root_content(&self) -> &[char] {
        &self.buf[..self.root]
    }

    /// Parses the vote block of the node at `pos`. Returns the votes and the
    /// position just past the block.
    pub(crate) fn votes_at(&self, pos: usize) -> Result<(VoteVector, usize)> {
        let (entries, end) = self.vote_block(pos)?;
        let mut votes = VoteVector::new();
        if !entries.is_empty() {
            let text: String = self.buf[entries.clone()].iter().collect();
            for (i, entry) in text.split(VOTE_SEP).enumerate() {
                let vote = Vote::parse(entry).ok_or_else(|| {
                    PretreeError::decode(entries.start, format!("bad vote entry #{i}: {entry:?}"))
                })?;
                votes.add(&vote.label, vote.count);
            }
        }
        Ok((votes, end))
    }

    /// Range of the vote entries of the node at `pos`, and the position just
    /// past the closing bracket.
    fn vote_block(&self, pos: usize) -> Result<(Range<usize>, usize)> {
        if self.buf.get(pos) != Some(&self.layout.node_marker) {
            return Err(PretreeError::decode(pos, "expected node marker"));
        }
        if self.buf.get(pos + 1) != Some(&VOTES_OPEN) {
            return Err(PretreeError::decode(pos + 1, "expected vote block"));
        }
        let start = pos + 2;
        let len = self.buf[start..]
            .iter()
            .position(|&c| c == VOTES_CLOSE)
            .ok_or_else(|| PretreeError::decode(start, "unterminated vote block"))?;
        Ok((start..start + len, start + len + 1))
    }

    /// Child entries of the node at `pos`.
    pub(crate) fn children(&self, pos: usize) -> Result<Children<'_>> {
        let (_, next) = self.vote_block(pos)?;
        Ok(Children {
            tree: self,
            parent: pos,
            next,
        })
    }

    /// Follows one step: the child of the node at `pos` whose content starts
    /// with `c`.
    pub(crate) fn child_starting_with(&self, pos: usize, c: char) -> Result<Option<ChildEntry<'_>>> {
        for entry in self.children(pos)? {
            let entry = entry?;
            if entry.content.first() == Some(&c) {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Rebuilds the object form.
    pub(crate) fn to_arena(&self) -> Result<NodeArena> {
        let mut arena = NodeArena::new();
        let (root_votes, _) = self.votes_at(self.root)?;
        let root = arena.root();
        *arena.get_mut(root) = Node::new(self.root_content().to_vec(), root_votes);

        let mut stack: Vec<(usize, NodeId)> = vec![(self.root, root)];
        while let Some((pos, id)) = stack.pop() {
            for entry in self.children(pos)? {
                let entry = entry?;
                let (votes, _) = self.votes_at(entry.offset)?;
                let child = arena.alloc(Node::new(entry.content.to_vec(), votes));
                arena.get_mut(id).children.push(child);
                stack.push((entry.offset, child));
            }
        }
        debug!(chars = self.buf.len(), nodes = arena.capacity(), "materialized flat tree");
        Ok(arena)
    }

    /// Walks every node once, checking markers, vote entries and offsets.
    pub fn validate(&self) -> Result<usize> {
        let mut seen = vec![false; self.buf.len()];
        let mut stack = vec![self.root];
        let mut nodes = 0;
        while let Some(pos) = stack.pop() {
            if std::mem::replace(&mut seen[pos], true) {
                return Err(PretreeError::decode(pos, "node referenced twice"));
            }
            nodes += 1;
            self.votes_at(pos)?;
            for entry in self.children(pos)? {
                stack.push(entry?.offset);
            }
        }
        Ok(nodes)
    }
}

/// Iterator over the child list of one flat node.
pub(crate) struct Children<'a> {
    tree: &'a FlatTree,
    parent: usize,
    next: usize,
}

impl<'a> Iterator for Children<'a> {
    type Item = Result<ChildEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let buf = &self.tree.buf;
        let layout = &self.tree.layout;
        let start = self.next;
        match buf.get(start) {
            None => return None,
            Some(&c) if c == layout.node_marker => return None,
            Some(_) => {}
        }

        let Some(len) = buf[start..]
            .iter()
            .position(|&c| c == layout.number_marker || c == layout.node_marker)
            .filter(|&len| buf[start + len] == layout.number_marker)
        else {
            self.next = buf.len();
            return Some(Err(PretreeError::decode(start, "child content without offset")));
        };

        let digits = start + len + 1;
        let offset = match layout.codec.decode_at(buf, digits) {
            Ok(offset) => offset,
            Err(e) => {
                self.next = buf.len();
                return Some(Err(e));
            }
        };
        if offset <= self.parent || buf.get(offset) != Some(&layout.node_marker) {
            self.next = buf.len();
            return Some(Err(PretreeError::decode(
                digits,
                format!("offset {offset} does not point forward to a node"),
            )));
        }

        self.next = digits + layout.codec.width();
        Some(Ok(ChildEntry {
            content: &buf[start..start + len],
            offset,
        }))
    }
}

fn write_node(arena: &NodeArena, id: NodeId, layout: &Layout, buf: &mut Vec<char>) -> Result<()> {
    let node = arena.get(id);
    buf.push(layout.node_marker);
    buf.extend(node.votes.to_string().chars());

    // Child entries first, with offsets patched once each child is placed.
    let mut slots = Vec::with_capacity(node.children.len());
    for &child in &node.children {
        let content = &arena.get(child).content;
        if let Some(&c) = content
            .iter()
            .find(|&&c| c == layout.node_marker || c == layout.number_marker)
        {
            // Markers changed after training.
            return Err(PretreeError::ReservedChar {
                what: "key",
                text: content.iter().collect(),
                code: c as u32,
            });
        }
        buf.extend_from_slice(content);
        buf.push(layout.number_marker);
        slots.push(buf.len());
        layout.codec.encode_into(0, buf)?;
    }
    for (&child, slot) in node.children.iter().zip(slots) {
        let here = buf.len();
        layout.codec.patch(buf, slot, here)?;
        write_node(arena, child, layout, buf)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn sample_arena() -> NodeArena {
        // root -> "ab" -> {"c", "d"}, root -> "x"
        let mut arena = NodeArena::new();
        let c = arena.alloc(Node::new(chars("c"), VoteVector::single("1", 2)));
        let d = arena.alloc(Node::new(chars("d"), VoteVector::single("2", 1)));
        let mut ab_votes = VoteVector::single("1", 2);
        ab_votes.add("2", 1);
        let ab = arena.alloc(Node::new(chars("ab"), ab_votes.clone()));
        arena.get_mut(ab).children.extend([c, d]);
        let x = arena.alloc(Node::new(chars("x"), VoteVector::single("0", 4)));
        let root = arena.root();
        let mut root_votes = ab_votes;
        root_votes.add("0", 4);
        arena.get_mut(root).votes = root_votes;
        arena.get_mut(root).children.extend([ab, x]);
        arena
    }

    #[test]
    fn test_encode_layout() {
        let cfg = Config::default();
        let flat = FlatTree::encode(&sample_arena(), &cfg).unwrap();
        let text: String = flat.as_chars().iter().collect();

        // Root block starts at 0 (empty root content).
        assert_eq!(flat.root_pos(), 0);
        assert!(text.starts_with("\u{3}[1=2;2=1;0=4]ab\u{2}"));

        let entries: Vec<_> = flat
            .children(0)
            .unwrap()
            .map(|e| e.unwrap())
            .map(|e| (e.content.iter().collect::<String>(), e.offset))
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "ab");
        assert_eq!(entries[1].0, "x");
        // First child block sits right after the root's child list.
        let list_end = "\u{3}[1=2;2=1;0=4]".chars().count() + 2 * (1 + 4) + 3;
        assert_eq!(entries[0].1, list_end);
        assert_eq!(flat.as_chars()[entries[1].1], '\u{3}');

        let (votes, _) = flat.votes_at(entries[1].1).unwrap();
        assert_eq!(votes.only_label(), Some("0"));
    }

    #[test]
    fn test_decode_roundtrip_structure() {
        let cfg = Config::default();
        let arena = sample_arena();
        let flat = FlatTree::encode(&arena, &cfg).unwrap();
        assert_eq!(flat.validate().unwrap(), 5);

        let back = flat.to_arena().unwrap();
        assert_eq!(back.reachable(), 5);
        let again = FlatTree::encode(&back, &cfg).unwrap();
        assert_eq!(again.as_chars(), flat.as_chars());
    }

    #[test]
    fn test_child_step() {
        let cfg = Config::default();
        let flat = FlatTree::encode(&sample_arena(), &cfg).unwrap();
        let ab = flat.child_starting_with(0, 'a').unwrap().unwrap();
        assert_eq!(ab.content, &['a', 'b']);
        let d = flat.child_starting_with(ab.offset, 'd').unwrap().unwrap();
        let (votes, _) = flat.votes_at(d.offset).unwrap();
        assert_eq!(votes.only_label(), Some("2"));
        assert!(flat.child_starting_with(ab.offset, 'z').unwrap().is_none());
        assert!(flat.child_starting_with(d.offset, 'z').unwrap().is_none());
    }

    #[test]
    fn test_rejects_truncated_buffer() {
        let cfg = Config::default();
        let flat = FlatTree::encode(&sample_arena(), &cfg).unwrap();
        for cut in [1, 5, 20, flat.len() - 1] {
            let buf = flat.as_chars()[..cut].to_vec();
            assert!(
                FlatTree::from_buffer(buf, &cfg).is_err(),
                "truncation at {cut} accepted"
            );
        }
        assert!(FlatTree::from_buffer(chars("no marker"), &cfg).is_err());
    }

    #[test]
    fn test_rejects_backward_offset() {
        let cfg = Config::default();
        let mut buf = chars("\u{3}[a=1]b\u{2}");
        OffsetCodec::new(&cfg).encode_into(0, &mut buf).unwrap();
        buf.extend(chars("\u{3}[a=1]"));
        assert!(matches!(
            FlatTree::from_buffer(buf, &cfg),
            Err(PretreeError::Decode { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_vote() {
        let cfg = Config::default();
        let buf = chars("\u{3}[a=x]");
        assert!(FlatTree::from_buffer(buf, &cfg).is_err());
        let buf = chars("\u{3}[]");
        assert_eq!(FlatTree::from_buffer(buf, &cfg).unwrap().validate().unwrap(), 1);
    }
}
