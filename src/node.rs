//! Wire-format node records and their decrypted form.
//!
//! An `EncryptedNodeRecord` is one element of a fetched node list. It is
//! transient: the decoder consumes it and produces a `ClearNode`, which the
//! tree then owns.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::attributes::NodeAttributes;
use crate::b64;
use crate::error::{MegashareError, Result};
use crate::ids::{NodeId, UserId, NODE_ID_LEN, USER_ID_LEN};
use crate::keys::{Key128, Key64};

/// Node type, as numbered on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u8")]
pub enum NodeKind {
    File = 0,
    Folder = 1,
    Root = 2,
    Inbox = 3,
    Trash = 4,
    Contact = 8,
    Network = 9,
}

impl TryFrom<u8> for NodeKind {
    type Error = MegashareError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::File,
            1 => Self::Folder,
            2 => Self::Root,
            3 => Self::Inbox,
            4 => Self::Trash,
            8 => Self::Contact,
            9 => Self::Network,
            other => return Err(MegashareError::format(format!("unknown node type {other}"))),
        })
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Response key
// ---------------------------------------------------------------------------

/// Who holds the key a grant is wrapped under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOwner {
    Node(NodeId),
    User(UserId),
}

/// One `<owner>:<wrapped key>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGrant {
    pub owner: KeyOwner,
    pub wrapped: Vec<u8>,
}

impl KeyGrant {
    fn parse(raw: &str) -> Result<Self> {
        let (owner, wrapped) = raw
            .split_once(':')
            .ok_or_else(|| MegashareError::format("node key has no owner separator"))?;
        let owner = match owner.len() {
            NODE_ID_LEN => KeyOwner::Node(NodeId::new(owner)?),
            USER_ID_LEN => KeyOwner::User(UserId::new(owner)?),
            _ => return Err(MegashareError::format(format!("invalid key owner \"{owner}\""))),
        };
        Ok(Self {
            owner,
            wrapped: b64::decode(wrapped)?,
        })
    }

    /// The owner node id, if this grant is wrapped under a node key.
    pub fn owner_node(&self) -> Option<&NodeId> {
        match &self.owner {
            KeyOwner::Node(id) => Some(id),
            KeyOwner::User(_) => None,
        }
    }
}

/// The `k` field of a record: one or more `/`-separated key grants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ResponseKey {
    grants: Vec<KeyGrant>,
}

impl ResponseKey {
    pub fn parse(raw: &str) -> Result<Self> {
        let grants = raw
            .split('/')
            .filter(|grant| !grant.is_empty())
            .map(KeyGrant::parse)
            .collect::<Result<Vec<_>>>()?;
        if grants.is_empty() {
            return Err(MegashareError::format("node key is empty"));
        }
        Ok(Self { grants })
    }

    pub fn grants(&self) -> &[KeyGrant] {
        &self.grants
    }
}

impl TryFrom<String> for ResponseKey {
    type Error = MegashareError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A node as delivered by the service, before decryption.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptedNodeRecord {
    #[serde(rename = "h")]
    pub id: NodeId,
    #[serde(rename = "p")]
    pub parent_id: NodeId,
    #[serde(rename = "u")]
    pub owner_id: UserId,
    #[serde(rename = "t")]
    pub kind: NodeKind,
    /// Base64 attribute ciphertext.
    #[serde(rename = "a")]
    pub attributes: String,
    #[serde(rename = "k")]
    pub key: ResponseKey,
    #[serde(rename = "s", default)]
    pub size: Option<u64>,
    #[serde(rename = "ts", with = "chrono::serde::ts_seconds")]
    pub modified: DateTime<Utc>,
    /// Opaque file-attribute handles (thumbnails); not decoded.
    #[serde(rename = "fa", default)]
    pub file_attributes: Option<String>,
}

impl EncryptedNodeRecord {
    /// Parse one record from its JSON value.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// A fully decrypted node.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearNode {
    pub id: NodeId,
    pub parent_id: NodeId,
    pub owner_id: UserId,
    pub kind: NodeKind,
    pub attributes: NodeAttributes,
    /// Content size in bytes, files only.
    pub size: Option<u64>,
    pub modified: DateTime<Utc>,
    pub key: Key128,
    /// Counter-mode IV. All zero for folders.
    pub iv: Key128,
    /// Integrity tag, files only.
    pub integrity_tag: Option<Key64>,
}

impl ClearNode {
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn name(&self) -> &str {
        self.attributes.name_or_default()
    }
}
