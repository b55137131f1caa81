//! Dependency-ordered assembly of a node list into a tree.
//!
//! Wire order usually has parents before children, but a record's key may be
//! wrapped under any node's key, not just its parent's. Records are therefore
//! decoded in passes:
//!
//! 1. Decode the root with the share key.
//! 2. Each pass, decode every pending record whose key owner is known and
//!    link every decoded node whose parent is in the tree.
//! 3. Stop when a pass makes no progress. Whatever is left is reported as
//!    unresolved (missing or circular key owner) or orphaned (missing parent).
//!
//! A failed record never touches the tree; everything placed before it stays.
//! That includes records that do not even parse: [`assemble_values`] sets
//! them aside and assembles the rest.

use serde_json::Value;
use tracing::debug;

use crate::decoder::{KeyRing, NodeRecordDecoder};
use crate::error::{MegashareError, Result};
use crate::ids::NodeId;
use crate::link::ShareContainer;
use crate::node::{ClearNode, EncryptedNodeRecord};
use crate::tree::NodeTree;

/// The outcome of assembling a node list.
#[derive(Debug)]
pub struct Assembly {
    /// Every node that could be decoded and placed.
    pub tree: NodeTree,
    /// Records that could not be, with the reason, in wire order of discovery.
    pub failures: Vec<(NodeId, MegashareError)>,
    /// Records rejected before even their id could be read.
    pub unidentified: Vec<MegashareError>,
}

impl Assembly {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.unidentified.is_empty()
    }

    /// The tree, or the first failure if any record was left out.
    pub fn into_tree(self) -> Result<NodeTree> {
        let first = self
            .failures
            .into_iter()
            .map(|(_, err)| err)
            .chain(self.unidentified)
            .next();
        match first {
            Some(err) => Err(err),
            None => Ok(self.tree),
        }
    }
}

enum Pending {
    Encrypted(EncryptedNodeRecord),
    Decoded(ClearNode),
}

/// Assemble as much of the tree as possible.
///
/// Only fails outright when there is no root to start from: an empty list,
/// or a root record that does not decode under the share key.
pub fn assemble(records: Vec<EncryptedNodeRecord>, container: &ShareContainer) -> Result<Assembly> {
    let mut ring = KeyRing::with_share_key(container.id().clone(), container.key().clone());

    let mut records = records;
    if records.is_empty() {
        return Err(MegashareError::format("node list is empty"));
    }
    let root_index = records
        .iter()
        .position(|record| record.id == *container.id())
        .unwrap_or(0);
    let root_record = records.remove(root_index);

    let root = NodeRecordDecoder::new(&ring).decode(&root_record)?;
    ring.insert(root.id.clone(), root.key.clone());
    let mut tree = NodeTree::new(root);

    let mut failures = Vec::new();
    let mut pending: Vec<Pending> = records.into_iter().map(Pending::Encrypted).collect();
    let mut pass = 0usize;

    while !pending.is_empty() {
        pass += 1;
        let mut progressed = false;
        let mut deferred = Vec::new();

        for item in pending.drain(..) {
            let node = match item {
                Pending::Decoded(node) => node,
                Pending::Encrypted(record) => {
                    let decoded = NodeRecordDecoder::new(&ring).decode(&record);
                    match decoded {
                        Ok(node) => {
                            ring.insert(node.id.clone(), node.key.clone());
                            progressed = true;
                            node
                        }
                        Err(MegashareError::Unresolved(_)) => {
                            deferred.push(Pending::Encrypted(record));
                            continue;
                        }
                        Err(err) => {
                            debug!(node = %record.id, error = %err, "node record failed to decode");
                            failures.push((record.id, err));
                            continue;
                        }
                    }
                }
            };

            if !tree.contains(&node.parent_id) {
                deferred.push(Pending::Decoded(node));
                continue;
            }
            let id = node.id.clone();
            match tree.insert(node) {
                Ok(()) => progressed = true,
                Err(err) => failures.push((id, err)),
            }
        }

        debug!(pass, deferred = deferred.len(), "node assembly pass finished");
        pending = deferred;
        if !progressed {
            break;
        }
    }

    for leftover in pending {
        failures.push(match leftover {
            Pending::Encrypted(record) => {
                (record.id.clone(), MegashareError::Unresolved(record.id))
            }
            Pending::Decoded(node) => (
                node.id.clone(),
                MegashareError::ParentNotFound {
                    node: node.id,
                    parent: node.parent_id,
                },
            ),
        });
    }

    Ok(Assembly {
        tree,
        failures,
        unidentified: Vec::new(),
    })
}

/// Parse raw wire records and assemble the ones that parse.
///
/// A record that fails to parse is reported under its `h` field when that
/// is a valid node id, and as unidentified otherwise. A malformed root
/// record fails the whole call, since nothing could be keyed without it.
pub fn assemble_values(values: Vec<Value>, container: &ShareContainer) -> Result<Assembly> {
    let mut records = Vec::with_capacity(values.len());
    let mut rejected = Vec::new();
    let mut unidentified = Vec::new();

    for value in values {
        let id = value
            .get("h")
            .and_then(Value::as_str)
            .and_then(|h| NodeId::new(h).ok());
        match EncryptedNodeRecord::from_json(value) {
            Ok(record) => records.push(record),
            Err(err) => {
                debug!(node = ?id, error = %err, "node record failed to parse");
                match id {
                    Some(id) if id == *container.id() => return Err(err),
                    Some(id) => rejected.push((id, err)),
                    None => unidentified.push(err),
                }
            }
        }
    }

    let mut assembly = assemble(records, container)?;
    rejected.append(&mut assembly.failures);
    assembly.failures = rejected;
    assembly.unidentified = unidentified;
    Ok(assembly)
}

/// Assemble a node list, failing on the first record that could not be placed.
pub fn decode_node_list(
    records: Vec<EncryptedNodeRecord>,
    container: &ShareContainer,
) -> Result<NodeTree> {
    assemble(records, container)?.into_tree()
}
