//! Node attribute decryption.
//!
//! Attributes are a JSON object prefixed with the literal `MEGA`, zero-padded
//! to the block size and encrypted with the node's own content key. The
//! prefix doubles as the key check: a wrong key yields noise that fails it.

use serde_json::{Map, Value};

use crate::b64;
use crate::crypto;
use crate::error::{MegashareError, Result};
use crate::keys::Key128;

/// Plaintext tag every correctly decrypted attribute blob starts with.
const ATTRIBUTE_TAG: &[u8] = b"MEGA{\"";

/// Cleartext node metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeAttributes {
    /// Display name (`n`).
    pub name: Option<String>,
    /// Every other attribute key, kept verbatim.
    pub extra: Map<String, Value>,
}

impl NodeAttributes {
    fn from_json(mut object: Map<String, Value>) -> Result<Self> {
        let name = match object.remove("n") {
            None => None,
            Some(Value::String(name)) => Some(name),
            Some(other) => {
                return Err(MegashareError::format(format!(
                    "attribute name must be a string, got {other}"
                )))
            }
        };
        Ok(Self { name, extra: object })
    }

    /// Name for display or file naming. Falls back to an empty string.
    pub fn name_or_default(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// Decrypt and parse an attribute blob.
pub fn decrypt_attributes(cipher_b64: &str, content_key: &Key128) -> Result<NodeAttributes> {
    let ciphertext = b64::decode(cipher_b64)?;
    let plaintext = crypto::cbc_decrypt_zero_iv(content_key, &ciphertext)?;

    if !plaintext.starts_with(ATTRIBUTE_TAG) {
        return Err(MegashareError::WrongKey);
    }

    // The object may be followed by zero padding.
    let start = plaintext
        .iter()
        .position(|b| *b == b'{')
        .ok_or_else(|| MegashareError::format("attribute object has no opening brace"))?;
    let end = plaintext
        .iter()
        .rposition(|b| *b == b'}')
        .ok_or_else(|| MegashareError::format("attribute object has no closing brace"))?;

    let object: Map<String, Value> = serde_json::from_slice(&plaintext[start..=end])?;
    NodeAttributes::from_json(object)
}
