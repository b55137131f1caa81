//! Opaque node and user handles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{MegashareError, Result};

/// Length of a node handle.
pub const NODE_ID_LEN: usize = 8;
/// Length of a user handle.
pub const USER_ID_LEN: usize = 11;

fn check_handle(value: &str, len: usize, what: &str) -> Result<()> {
    if value.len() == len && value.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(MegashareError::format(format!("invalid {what} \"{value}\"")))
    }
}

/// An 8-character alphanumeric node handle.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(value: &str) -> Result<Self> {
        check_handle(value, NODE_ID_LEN, "node id")?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An 11-character alphanumeric user handle.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: &str) -> Result<Self> {
        check_handle(value, USER_ID_LEN, "user id")?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! handle_impls {
    ($ty:ident) => {
        impl FromStr for $ty {
            type Err = MegashareError;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($ty), self.0)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::new(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

handle_impls!(NodeId);
handle_impls!(UserId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_shape() {
        assert!(NodeId::new("AbCdEfGh").is_ok());
        assert!(NodeId::new("AbCdEfG").is_err());
        assert!(NodeId::new("AbCdEfGhI").is_err());
        assert!(NodeId::new("AbCd-fGh").is_err());
    }

    #[test]
    fn test_user_id_shape() {
        assert!(UserId::new("UsEr0123456").is_ok());
        assert!(UserId::new("UsEr012345").is_err());
        assert!(UserId::new("UsEr_123456").is_err());
    }

    #[test]
    fn test_equality_is_exact() {
        assert_eq!(NodeId::new("AbCdEfGh").unwrap(), "AbCdEfGh".parse::<NodeId>().unwrap());
        assert_ne!(NodeId::new("AbCdEfGh").unwrap(), NodeId::new("abcdefgh").unwrap());
    }

    #[test]
    fn test_deserialize_validates() {
        let id: NodeId = serde_json::from_str("\"AbCdEfGh\"").unwrap();
        assert_eq!(id.as_str(), "AbCdEfGh");
        assert!(serde_json::from_str::<NodeId>("\"short\"").is_err());
    }
}
