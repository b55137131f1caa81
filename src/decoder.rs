//! Per-record decryption.
//!
//! Turning a wire record into a clear node is a fixed chain:
//!
//! ```text
//! owner key ──unwrap──▶ content key (+ iv, tag for files) ──▶ attributes
//! ```
//!
//! The owner key must already be known. Which node owns it is named by the
//! record's key grant and is not necessarily the record's parent.

use std::collections::HashMap;

use tracing::trace;

use crate::attributes;
use crate::crypto;
use crate::error::{MegashareError, Result};
use crate::ids::NodeId;
use crate::keys::Key128;
use crate::node::{ClearNode, EncryptedNodeRecord, KeyGrant, NodeKind};

/// Source of already-recovered node keys.
pub trait KeyResolver {
    fn resolve(&self, owner: &NodeId) -> Option<&Key128>;
}

/// Keys recovered so far, by the node that owns them.
#[derive(Debug, Default, Clone)]
pub struct KeyRing {
    keys: HashMap<NodeId, Key128>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ring with the container key of a share.
    pub fn with_share_key(id: NodeId, key: Key128) -> Self {
        let mut ring = Self::new();
        ring.insert(id, key);
        ring
    }

    /// Add a key unless one is already known for `id`. Share keys seeded
    /// first are never replaced by a later node key.
    pub fn insert(&mut self, id: NodeId, key: Key128) {
        self.keys.entry(id).or_insert(key);
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.keys.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyResolver for KeyRing {
    fn resolve(&self, owner: &NodeId) -> Option<&Key128> {
        self.keys.get(owner)
    }
}

/// Decodes records against a key resolver.
pub struct NodeRecordDecoder<'a, R: KeyResolver> {
    resolver: &'a R,
}

impl<'a, R: KeyResolver> NodeRecordDecoder<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    /// Whether some grant on the record can be unwrapped right now.
    pub fn is_ready(&self, record: &EncryptedNodeRecord) -> bool {
        self.usable_grant(record).is_some()
    }

    /// Decode a record into a clear node.
    ///
    /// Fails with `Unresolved` if none of the record's key owners are known
    /// yet, `NotSupported` for node types other than file and folder, and
    /// `WrongKey` if the unwrapped key does not open the attributes.
    pub fn decode(&self, record: &EncryptedNodeRecord) -> Result<ClearNode> {
        if !matches!(record.kind, NodeKind::File | NodeKind::Folder) {
            return Err(MegashareError::NotSupported(format!(
                "cannot decode node {} of type {}",
                record.id, record.kind
            )));
        }

        let (grant, owner_key) = self
            .usable_grant(record)
            .ok_or_else(|| MegashareError::Unresolved(record.id.clone()))?;
        trace!(node = %record.id, owner = ?grant.owner, kind = %record.kind, "decoding node");

        let (key, iv, integrity_tag) = match record.kind {
            NodeKind::File => {
                let full = crypto::unwrap256(&grant.wrapped, owner_key)?;
                (full.reduce_to_128(), full.iv(), Some(full.integrity_tag()))
            }
            _ => (crypto::unwrap128(&grant.wrapped, owner_key)?, Key128::zero(), None),
        };

        let attributes = attributes::decrypt_attributes(&record.attributes, &key)?;

        Ok(ClearNode {
            id: record.id.clone(),
            parent_id: record.parent_id.clone(),
            owner_id: record.owner_id.clone(),
            kind: record.kind,
            attributes,
            size: record.size,
            modified: record.modified,
            key,
            iv,
            integrity_tag,
        })
    }

    fn usable_grant<'r>(
        &self,
        record: &'r EncryptedNodeRecord,
    ) -> Option<(&'r KeyGrant, &'a Key128)> {
        let resolver: &'a R = self.resolver;
        record.key.grants().iter().find_map(|grant| {
            let owner = grant.owner_node()?;
            resolver.resolve(owner).map(|key| (grant, key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn share_ring() -> KeyRing {
        let key = Key128::from_bytes(&hex::decode("0f1e2d3c4b5a69788796a5b4c3d2e1f0").unwrap())
            .unwrap();
        KeyRing::with_share_key(NodeId::new("FoLdEr01").unwrap(), key)
    }

    fn folder_record() -> EncryptedNodeRecord {
        EncryptedNodeRecord::from_json(json!({
            "h": "SuBdIr01",
            "p": "FoLdEr01",
            "u": "UsEr0123456",
            "t": 1,
            "a": "RrKU9KZ775j1vq5gl0UgEEC6meUK41iRlkERfW_-19E",
            "k": "FoLdEr01:VsKE849W8RFEJpr2DmL3sw",
            "ts": 1_500_000_000
        }))
        .unwrap()
    }

    #[test]
    fn test_folder_decodes_with_zero_iv() {
        let ring = share_ring();
        let node = NodeRecordDecoder::new(&ring).decode(&folder_record()).unwrap();
        assert_eq!(node.name(), "photos");
        assert_eq!(node.iv, Key128::zero());
        assert!(node.integrity_tag.is_none());
        assert_eq!(hex::encode(node.key.to_bytes()), "00112233445566778899aabbccddeeff");
    }

    #[test]
    fn test_readiness_follows_the_ring() {
        let record = folder_record();
        assert!(!NodeRecordDecoder::new(&KeyRing::new()).is_ready(&record));
        assert!(NodeRecordDecoder::new(&share_ring()).is_ready(&record));
    }

    #[test]
    fn test_missing_owner_is_unresolved() {
        let ring = KeyRing::new();
        let err = NodeRecordDecoder::new(&ring).decode(&folder_record()).unwrap_err();
        assert!(matches!(err, MegashareError::Unresolved(id) if id.as_str() == "SuBdIr01"));
    }

    #[test]
    fn test_wrong_owner_key_fails_tag_check() {
        let ring = KeyRing::with_share_key(
            NodeId::new("FoLdEr01").unwrap(),
            Key128::from_word_array([9, 9, 9, 9]),
        );
        let err = NodeRecordDecoder::new(&ring).decode(&folder_record()).unwrap_err();
        assert!(matches!(err, MegashareError::WrongKey));
    }

    #[test]
    fn test_other_types_are_not_supported() {
        let mut record = folder_record();
        record.kind = NodeKind::Trash;
        let ring = share_ring();
        let err = NodeRecordDecoder::new(&ring).decode(&record).unwrap_err();
        assert!(matches!(err, MegashareError::NotSupported(_)));
    }

    #[test]
    fn test_share_key_is_not_replaced() {
        let mut ring = share_ring();
        let id = NodeId::new("FoLdEr01").unwrap();
        ring.insert(id.clone(), Key128::zero());
        assert_ne!(ring.resolve(&id), Some(&Key128::zero()));
    }
}
