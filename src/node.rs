//! Index arena holding the object form of the trie.
//!
//! Nodes never point at each other directly: children are `NodeId`s into the
//! arena's node vector. This keeps the three-way merge free of aliasing
//! problems and lets pruning drop whole subtrees by forgetting their ids;
//! [`NodeArena::compact`] reclaims the slots afterwards.

use smallvec::SmallVec;

use crate::vote::VoteVector;

/// Index of a node in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A trie node.
///
/// Invariant: the contents of sibling nodes differ in their first character,
/// so a child is selected by one character.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Key fragment on the edge into this node. Empty only for the root.
    pub content: Vec<char>,
    /// Children, in insertion order.
    pub children: SmallVec<[NodeId; 4]>,
    /// Votes of every key passing through this node.
    pub votes: VoteVector,
}

impl Node {
    pub fn new(content: Vec<char>, votes: VoteVector) -> Self {
        Self {
            content,
            children: SmallVec::new(),
            votes,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn first_char(&self) -> Option<char> {
        self.content.first().copied()
    }
}

/// Owns every node of one tree. The root always exists.
#[derive(Debug, Clone)]
pub struct NodeArena {
    nodes: Vec<Node>,
    root: NodeId,
}

impl NodeArena {
    /// An arena holding only an empty root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Child of `id` whose content starts with `c`.
    pub fn child_starting_with(&self, id: NodeId, c: char) -> Option<(usize, NodeId)> {
        self.get(id)
            .children
            .iter()
            .enumerate()
            .find(|&(_, &child)| self.get(child).first_char() == Some(c))
            .map(|(slot, &child)| (slot, child))
    }

    /// Slots allocated, reachable or not.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes reachable from the root.
    pub fn reachable(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            count += 1;
            stack.extend(self.get(id).children.iter().copied());
        }
        count
    }

    /// Rebuilds the arena with only reachable nodes, in depth-first order.
    /// Returns the number of slots freed.
    pub fn compact(&mut self) -> usize {
        let before = self.nodes.len();
        let mut old = std::mem::take(&mut self.nodes);
        let mut nodes = Vec::with_capacity(before);

        // (old id, parent slot in the new vector)
        let mut stack: Vec<(NodeId, Option<usize>)> = vec![(self.root, None)];
        while let Some((id, parent)) = stack.pop() {
            let mut node = std::mem::take(&mut old[id.index()]);
            let children = std::mem::take(&mut node.children);
            let new_id = NodeId(nodes.len() as u32);
            nodes.push(node);
            if let Some(p) = parent {
                nodes[p].children.push(new_id);
            }
            // Reverse so children are visited and re-linked in order.
            for &child in children.iter().rev() {
                stack.push((child, Some(new_id.index())));
            }
        }

        self.nodes = nodes;
        self.root = NodeId(0);
        before - self.nodes.len()
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}
