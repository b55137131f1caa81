//! The recovered folder hierarchy.
//!
//! Nodes are indexed by id for O(1) lookup; parent and child links are ids
//! into the same index. A node can only be linked under a parent that is
//! already present, so the structure can never contain a cycle.

use std::collections::HashMap;

use crate::error::{MegashareError, Result};
use crate::ids::NodeId;
use crate::node::ClearNode;

struct TreeEntry {
    node: ClearNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A decrypted node hierarchy rooted at the share container.
pub struct NodeTree {
    root: NodeId,
    index: HashMap<NodeId, TreeEntry>,
    /// Insertion order, for deterministic iteration.
    order: Vec<NodeId>,
}

impl NodeTree {
    /// Start a tree from its root. The root's own parent id is not required
    /// to resolve.
    pub fn new(root: ClearNode) -> Self {
        let id = root.id.clone();
        let mut index = HashMap::new();
        index.insert(
            id.clone(),
            TreeEntry {
                node: root,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            root: id.clone(),
            index,
            order: vec![id],
        }
    }

    pub fn root(&self) -> &ClearNode {
        &self.entry(&self.root).node
    }

    /// Link a node under its parent.
    ///
    /// Re-inserting an identical node is a no-op. Re-inserting an id with
    /// different content fails with `Conflict`; inserting before the parent
    /// is known fails with `ParentNotFound`.
    pub fn insert(&mut self, node: ClearNode) -> Result<()> {
        if let Some(existing) = self.index.get(&node.id) {
            return if existing.node == node {
                Ok(())
            } else {
                Err(MegashareError::Conflict(node.id))
            };
        }

        let parent = self
            .index
            .get_mut(&node.parent_id)
            .ok_or_else(|| MegashareError::ParentNotFound {
                node: node.id.clone(),
                parent: node.parent_id.clone(),
            })?;
        parent.children.push(node.id.clone());

        let id = node.id.clone();
        let parent_id = node.parent_id.clone();
        self.index.insert(
            id.clone(),
            TreeEntry {
                node,
                parent: Some(parent_id),
                children: Vec::new(),
            },
        );
        self.order.push(id);
        Ok(())
    }

    pub fn get(&self, id: &NodeId) -> Option<&ClearNode> {
        self.index.get(id).map(|entry| &entry.node)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Parent of `id`, or `None` for the root. Fails if `id` is unknown.
    pub fn parent(&self, id: &NodeId) -> Result<Option<&ClearNode>> {
        let entry = self.lookup(id)?;
        Ok(entry.parent.as_ref().map(|parent| &self.entry(parent).node))
    }

    /// Direct children of `id`, in insertion order. Fails if `id` is unknown.
    pub fn children(&self, id: &NodeId) -> Result<Vec<&ClearNode>> {
        let entry = self.lookup(id)?;
        Ok(entry
            .children
            .iter()
            .map(|child| &self.entry(child).node)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Always false: a tree holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ClearNode> + '_ {
        self.order.iter().map(move |id| &self.entry(id).node)
    }

    /// All file nodes in insertion order.
    pub fn files(&self) -> impl Iterator<Item = &ClearNode> + '_ {
        self.iter().filter(|node| node.is_file())
    }

    /// Depth-first pre-order walk from the root, with each node's depth.
    pub fn walk(&self) -> Vec<(usize, &ClearNode)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![(0usize, &self.root)];
        while let Some((depth, id)) = stack.pop() {
            let entry = self.entry(id);
            out.push((depth, &entry.node));
            for child in entry.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    /// Names from the root down to `id`, inclusive.
    pub fn path_of(&self, id: &NodeId) -> Result<Vec<&str>> {
        let mut names = Vec::new();
        let mut cursor = Some(self.lookup(id)?);
        while let Some(entry) = cursor {
            names.push(entry.node.name());
            cursor = entry.parent.as_ref().map(|parent| self.entry(parent));
        }
        names.reverse();
        Ok(names)
    }

    fn lookup(&self, id: &NodeId) -> Result<&TreeEntry> {
        self.index
            .get(id)
            .ok_or_else(|| MegashareError::UnknownNode(id.clone()))
    }

    /// Ids held in links always resolve: entries are never removed.
    fn entry(&self, id: &NodeId) -> &TreeEntry {
        &self.index[id]
    }
}

impl std::fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTree")
            .field("root", &self.root)
            .field("nodes", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::NodeAttributes;
    use crate::ids::UserId;
    use crate::keys::Key128;
    use crate::node::NodeKind;
    use chrono::{TimeZone, Utc};

    fn folder(id: &str, parent: &str, name: &str) -> ClearNode {
        ClearNode {
            id: NodeId::new(id).unwrap(),
            parent_id: NodeId::new(parent).unwrap(),
            owner_id: UserId::new("UsEr0123456").unwrap(),
            kind: NodeKind::Folder,
            attributes: NodeAttributes {
                name: Some(name.to_string()),
                ..NodeAttributes::default()
            },
            size: None,
            modified: Utc.timestamp_opt(1_500_000_000, 0).unwrap(),
            key: Key128::zero(),
            iv: Key128::zero(),
            integrity_tag: None,
        }
    }

    fn sample() -> NodeTree {
        let mut tree = NodeTree::new(folder("RooT0000", "OutSide0", "root"));
        tree.insert(folder("ChildA00", "RooT0000", "a")).unwrap();
        tree.insert(folder("ChildB00", "RooT0000", "b")).unwrap();
        tree.insert(folder("GrandC00", "ChildA00", "c")).unwrap();
        tree
    }

    fn id(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    #[test]
    fn test_parent_and_children() {
        let tree = sample();
        assert_eq!(tree.len(), 4);
        assert!(tree.parent(&id("RooT0000")).unwrap().is_none());
        assert_eq!(tree.parent(&id("GrandC00")).unwrap().unwrap().name(), "a");
        let names: Vec<_> = tree
            .children(&id("RooT0000"))
            .unwrap()
            .iter()
            .map(|n| n.name())
            .collect();
        assert_eq!(names, ["a", "b"]);
        assert!(tree.children(&id("ChildB00")).unwrap().is_empty());
        assert!(tree.parent(&id("NoSuch00")).is_err());
    }

    #[test]
    fn test_insert_is_idempotent_but_detects_conflicts() {
        let mut tree = sample();
        tree.insert(folder("ChildA00", "RooT0000", "a")).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.children(&id("RooT0000")).unwrap().len(), 2);

        let err = tree.insert(folder("ChildA00", "RooT0000", "renamed")).unwrap_err();
        assert!(matches!(err, MegashareError::Conflict(_)));
    }

    #[test]
    fn test_self_parent_is_rejected() {
        let mut tree = sample();
        let err = tree.insert(folder("Loop0000", "Loop0000", "loop")).unwrap_err();
        assert!(matches!(err, MegashareError::ParentNotFound { .. }));
        assert!(!tree.contains(&id("Loop0000")));
    }

    #[test]
    fn test_walk_and_paths() {
        let tree = sample();
        let walked: Vec<_> = tree.walk().into_iter().map(|(d, n)| (d, n.name())).collect();
        assert_eq!(walked, [(0, "root"), (1, "a"), (2, "c"), (1, "b")]);
        assert_eq!(tree.path_of(&id("GrandC00")).unwrap(), ["root", "a", "c"]);
    }
}
