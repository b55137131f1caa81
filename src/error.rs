//! Error types for megashare.
//!
//! Every variant is a distinct failure mode of the share client core. Error
//! messages name *what* failed (a node id, a field) without ever carrying key
//! bytes or decrypted content.

use thiserror::Error;

use crate::ids::NodeId;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, MegashareError>;

/// The single error type for all megashare operations.
#[derive(Debug, Error)]
pub enum MegashareError {
    /// Malformed input: share link, base64, node/user id, key length, wire JSON.
    #[error("format error: {0}")]
    Format(String),

    /// Attribute plaintext failed the `MEGA{"` tag check. The key used was
    /// wrong or belonged to another node. Never produced by the service.
    #[error("wrong key for node attributes")]
    WrongKey,

    /// A node record's owner key could not be resolved after every decode pass.
    #[error("owner key unresolved for node {0}")]
    Unresolved(NodeId),

    /// A node was inserted before its parent was known.
    #[error("parent {parent} of node {node} not found in tree")]
    ParentNotFound { node: NodeId, parent: NodeId },

    /// A lookup named a node that is not in the tree.
    #[error("node not found: {0}")]
    UnknownNode(NodeId),

    /// A node id was inserted twice with differing content.
    #[error("conflicting node with id {0}")]
    Conflict(NodeId),

    /// The record carries a node type this core cannot decode.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The service answered with a negative error code.
    #[error("remote error {}: {}", .0.code(), .0.message())]
    Remote(RemoteError),

    /// The transport collaborator failed before a response was decoded.
    #[error("transport error: {0}")]
    Transport(String),

    /// The decrypted content does not match the node's integrity tag.
    #[error("integrity check failed for node {0}")]
    Integrity(NodeId),
}

/// The categories callers branch on, independent of the concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Format,
    Key,
    Dependency,
    Tree,
    Remote,
    Transport,
    Integrity,
}

impl MegashareError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Return the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Format(_) | Self::NotSupported(_) => ErrorCategory::Format,
            Self::WrongKey => ErrorCategory::Key,
            Self::Unresolved(_) => ErrorCategory::Dependency,
            Self::ParentNotFound { .. } | Self::UnknownNode(_) | Self::Conflict(_) => {
                ErrorCategory::Tree
            }
            Self::Remote(_) => ErrorCategory::Remote,
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Integrity(_) => ErrorCategory::Integrity,
        }
    }
}

impl From<serde_json::Error> for MegashareError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(format!("json: {err}"))
    }
}

impl From<RemoteError> for MegashareError {
    fn from(err: RemoteError) -> Self {
        Self::Remote(err)
    }
}

// ---------------------------------------------------------------------------
// Remote error catalog
// ---------------------------------------------------------------------------

/// The service's fixed catalog of negative error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteError {
    Unknown,
    Internal,
    BadArguments,
    Again,
    RateLimit,
    Failed,
    TooMany,
    Range,
    Expired,
    NotFound,
    Circular,
    AccessDenied,
    AlreadyExists,
    Incomplete,
    Key,
    SessionInvalid,
    Blocked,
    OverQuota,
    TemporarilyUnavailable,
}

impl RemoteError {
    /// Map a wire code to the catalog. Unlisted codes become `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            -1 => Self::Internal,
            -2 => Self::BadArguments,
            -3 => Self::Again,
            -4 => Self::RateLimit,
            -5 => Self::Failed,
            -6 => Self::TooMany,
            -7 => Self::Range,
            -8 => Self::Expired,
            -9 => Self::NotFound,
            -10 => Self::Circular,
            -11 => Self::AccessDenied,
            -12 => Self::AlreadyExists,
            -13 => Self::Incomplete,
            -14 => Self::Key,
            -15 => Self::SessionInvalid,
            -16 => Self::Blocked,
            -17 => Self::OverQuota,
            -18 => Self::TemporarilyUnavailable,
            _ => Self::Unknown,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Internal => -1,
            Self::BadArguments => -2,
            Self::Again => -3,
            Self::RateLimit => -4,
            Self::Failed => -5,
            Self::TooMany => -6,
            Self::Range => -7,
            Self::Expired => -8,
            Self::NotFound => -9,
            Self::Circular => -10,
            Self::AccessDenied => -11,
            Self::AlreadyExists => -12,
            Self::Incomplete => -13,
            Self::Key => -14,
            Self::SessionInvalid => -15,
            Self::Blocked => -16,
            Self::OverQuota => -17,
            Self::TemporarilyUnavailable => -18,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown error",
            Self::Internal => "internal error",
            Self::BadArguments => "invalid arguments",
            Self::Again => "temporary congestion, retry with backoff",
            Self::RateLimit => "rate limit exceeded",
            Self::Failed => "upload failed",
            Self::TooMany => "too many concurrent addresses",
            Self::Range => "out of range",
            Self::Expired => "target url expired",
            Self::NotFound => "object not found",
            Self::Circular => "circular linkage attempted",
            Self::AccessDenied => "access denied",
            Self::AlreadyExists => "object already exists",
            Self::Incomplete => "resource incomplete",
            Self::Key => "decryption failed",
            Self::SessionInvalid => "invalid or expired session",
            Self::Blocked => "user blocked",
            Self::OverQuota => "over quota",
            Self::TemporarilyUnavailable => "temporarily unavailable",
        }
    }

    /// Whether the caller may retry with backoff. The core itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Again | Self::RateLimit | Self::TemporarilyUnavailable
        )
    }

    /// Whether the failure is on the service side rather than the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Unknown | Self::Internal)
    }
}
