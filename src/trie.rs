//! Prefix tree over repository-relative file paths.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::RepoPath;

/// Handle of a node inside a [`PathTrie`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<String, NodeId>,
    weight: usize,
    /// A file path ends at this node.
    terminal: bool,
}

/// Arena-backed trie. The root node stands for the repository root and has
/// no segment of its own.
#[derive(Debug)]
pub struct PathTrie {
    nodes: Vec<TrieNode>,
}

impl Default for PathTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }

    /// Insert a file path. Returns `false` if it was already present.
    pub fn insert(&mut self, path: &RepoPath) -> bool {
        let mut chain = Vec::with_capacity(path.segments().len() + 1);
        let mut current = NodeId::ROOT;
        chain.push(current);

        for segment in path.segments() {
            current = match self.nodes[current.0].children.get(segment) {
                Some(&child) => child,
                None => {
                    let child = NodeId(self.nodes.len());
                    self.nodes.push(TrieNode::default());
                    self.nodes[current.0]
                        .children
                        .insert(segment.clone(), child);
                    child
                }
            };
            chain.push(current);
        }

        if self.nodes[current.0].terminal {
            return false;
        }
        self.nodes[current.0].terminal = true;
        for id in chain {
            self.nodes[id.0].weight += 1;
        }
        true
    }

    /// Parse and insert a raw path string.
    pub fn insert_str(&mut self, raw: &str) -> Result<bool> {
        let path = RepoPath::parse(raw)?;
        Ok(self.insert(&path))
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of distinct file paths at or below `node`.
    pub fn weight(&self, node: NodeId) -> usize {
        self.nodes[node.0].weight
    }

    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.nodes[node.0].children.is_empty()
    }

    pub fn is_terminal(&self, node: NodeId) -> bool {
        self.nodes[node.0].terminal
    }

    /// Children in sorted segment order.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.nodes[node.0]
            .children
            .iter()
            .map(|(seg, &id)| (seg.as_str(), id))
    }

    /// Total number of distinct files in the trie.
    pub fn len(&self) -> usize {
        self.weight(NodeId::ROOT)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the node for `path`, if every segment exists.
    pub fn find(&self, path: &RepoPath) -> Option<NodeId> {
        path.segments()
            .iter()
            .try_fold(NodeId::ROOT, |node, seg| {
                self.nodes[node.0].children.get(seg).copied()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> RepoPath {
        RepoPath::parse(s).unwrap()
    }

    #[test]
    fn weights_count_files_below_each_node() {
        let mut trie = PathTrie::new();
        for p in ["src/a.rs", "src/b.rs", "src/x/c.rs", "README.md"] {
            assert!(trie.insert(&path(p)));
        }
        assert_eq!(trie.len(), 4);
        let src = trie.find(&path("src")).unwrap();
        assert_eq!(trie.weight(src), 3);
        let x = trie.find(&path("src/x")).unwrap();
        assert_eq!(trie.weight(x), 1);
        assert!(trie.is_leaf(trie.find(&path("README.md")).unwrap()));
        assert!(!trie.is_leaf(src));
    }

    #[test]
    fn duplicate_insert_keeps_weight() {
        let mut trie = PathTrie::new();
        assert!(trie.insert(&path("a/b")));
        assert!(!trie.insert(&path("a/b")));
        assert!(!trie.insert(&path("./a//b")));
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn malformed_paths_are_rejected() {
        let mut trie = PathTrie::new();
        assert!(trie.insert_str("").is_err());
        assert!(trie.insert_str("/./").is_err());
        assert!(trie.is_empty());
    }

    #[test]
    fn children_iterate_sorted_regardless_of_insertion() {
        let mut trie = PathTrie::new();
        for p in ["z.rs", "a.rs", "m/n.rs"] {
            trie.insert(&path(p));
        }
        let names: Vec<&str> = trie.children(trie.root()).map(|(s, _)| s).collect();
        assert_eq!(names, vec!["a.rs", "m", "z.rs"]);
    }
}
