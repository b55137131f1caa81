//! Low-level AES operations.
//!
//! This module is the only place in the crate that touches the block cipher
//! crates directly. Every other module goes through the functions here.
//!
//! Primitive usage:
//! - **Key unwrap / attributes**: AES-128-CBC with a fixed all-zero IV and no
//!   padding. Used as a keyed permutation over block-aligned input, not as
//!   general-purpose encryption.
//! - **File content**: AES-128-CTR, 128-bit big-endian counter.
//! - **Integrity**: single-block AES-128 encryption, the CBC-MAC step.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};

use crate::error::{MegashareError, Result};
use crate::keys::{Key128, Key256};

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

const ZERO_IV: [u8; BLOCK_LEN] = [0u8; BLOCK_LEN];

type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Counter-mode cipher used for file content.
pub(crate) type Aes128Ctr = ctr::Ctr128BE<Aes128>;

/// Decrypt block-aligned data with AES-128-CBC and an all-zero IV.
///
/// Fails with a format error if `data` is not a whole number of blocks.
pub(crate) fn cbc_decrypt_zero_iv(key: &Key128, data: &[u8]) -> Result<Vec<u8>> {
    let key_bytes = key.to_block();
    let mut buf = data.to_vec();
    let len = Aes128CbcDec::new((&key_bytes).into(), (&ZERO_IV).into())
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| {
            MegashareError::format(format!(
                "ciphertext of {} bytes is not block aligned",
                data.len()
            ))
        })?
        .len();
    buf.truncate(len);
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Key unwrap
// ---------------------------------------------------------------------------

/// Unwrap a 16-byte wrapped key with `unwrapping_key`.
pub fn unwrap128(wrapped: &[u8], unwrapping_key: &Key128) -> Result<Key128> {
    if wrapped.len() != Key128::BYTES {
        return Err(MegashareError::format(format!(
            "wrapped folder key must be 16 bytes, got {}",
            wrapped.len()
        )));
    }
    Key128::from_bytes(&cbc_decrypt_zero_iv(unwrapping_key, wrapped)?)
}

/// Unwrap a 32-byte wrapped file key with `unwrapping_key`.
///
/// The two halves are unwrapped independently, each from a fresh zero IV.
/// A single chained pass over 32 bytes would corrupt the second half.
pub fn unwrap256(wrapped: &[u8], unwrapping_key: &Key128) -> Result<Key256> {
    if wrapped.len() != Key256::BYTES {
        return Err(MegashareError::format(format!(
            "wrapped file key must be 32 bytes, got {}",
            wrapped.len()
        )));
    }
    let mut plain = Vec::with_capacity(Key256::BYTES);
    for half in wrapped.chunks_exact(BLOCK_LEN) {
        plain.extend_from_slice(&cbc_decrypt_zero_iv(unwrapping_key, half)?);
    }
    Key256::from_bytes(&plain)
}

// ---------------------------------------------------------------------------
// Stream and MAC primitives
// ---------------------------------------------------------------------------

/// Build the counter-mode cipher for a file.
pub(crate) fn ctr_cipher(key: &Key128, iv: &Key128) -> Aes128Ctr {
    let key_bytes = key.to_block();
    let iv_bytes = iv.to_block();
    Aes128Ctr::new((&key_bytes).into(), (&iv_bytes).into())
}

/// A keyed single-block encryptor for the CBC-MAC chain.
pub(crate) struct MacCipher(Aes128);

impl MacCipher {
    pub(crate) fn new(key: &Key128) -> Self {
        let key_bytes = key.to_block();
        Self(Aes128::new((&key_bytes).into()))
    }

    /// `state = AES_enc(state ^ block)`
    pub(crate) fn absorb(&self, state: &mut [u8; BLOCK_LEN], block: &[u8; BLOCK_LEN]) {
        for (s, b) in state.iter_mut().zip(block.iter()) {
            *s ^= b;
        }
        self.0.encrypt_block(GenericArray::from_mut_slice(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share_key() -> Key128 {
        Key128::from_bytes(&hex::decode("0f1e2d3c4b5a69788796a5b4c3d2e1f0").unwrap()).unwrap()
    }

    #[test]
    fn test_unwrap128_recovers_known_key() {
        let wrapped = crate::b64::decode("VsKE849W8RFEJpr2DmL3sw").unwrap();
        let key = unwrap128(&wrapped, &share_key()).unwrap();
        assert_eq!(hex::encode(key.to_bytes()), "00112233445566778899aabbccddeeff");
    }

    #[test]
    fn test_unwrap256_is_blockwise_not_chained() {
        let wrapped =
            hex::decode("364b4e70af6ad852af4b6b23828c99edf640323ca8117ba52a35d27b017be44d")
                .unwrap();
        let blockwise = unwrap256(&wrapped, &share_key()).unwrap();

        let chained = cbc_decrypt_zero_iv(&share_key(), &wrapped).unwrap();
        assert_eq!(&chained[..16], &blockwise.to_bytes()[..16]);
        assert_ne!(&chained[16..], &blockwise.to_bytes()[16..]);
    }

    #[test]
    fn test_wrapped_length_is_checked() {
        assert!(unwrap128(&[0u8; 32], &share_key()).is_err());
        assert!(unwrap256(&[0u8; 16], &share_key()).is_err());
        assert!(cbc_decrypt_zero_iv(&share_key(), &[0u8; 17]).is_err());
    }
}
