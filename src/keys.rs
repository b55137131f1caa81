//! Fixed-size key material and the 256 → 128 bit reduction.
//!
//! Keys are held as big-endian 32-bit words, which is the form every
//! derivation in the protocol is expressed in. Raw bytes are produced on
//! demand for cipher calls via `crate::words`.
//!
//! ## File key layout
//!
//! ```text
//! words:  [ k0 k1 k2 k3 | n0 n1 m0 m1 ]
//! key  =  [ k0^n0, k1^n1, k2^m0, k3^m1 ]
//! iv   =  [ n0, n1, 0, 0 ]
//! tag  =  [ m0, m1 ]
//! ```
//!
//! Key types are zeroised on drop and never print their contents.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{MegashareError, Result};
use crate::words;

/// A key made of `W` big-endian 32-bit words.
///
/// Equality is constant time.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key<const W: usize> {
    words: [u32; W],
}

/// 64-bit integrity tag of a file.
pub type Key64 = Key<2>;
/// 128-bit AES key or counter-mode IV.
pub type Key128 = Key<4>;
/// 256-bit wrapped file key payload.
pub type Key256 = Key<8>;

impl<const W: usize> Key<W> {
    /// Size of the key in bytes.
    pub const BYTES: usize = W * 4;

    pub fn from_word_array(words: [u32; W]) -> Self {
        Self { words }
    }

    /// Build a key from a word sequence. Fails unless exactly `W` words are given.
    pub fn from_words(words: &[u32]) -> Result<Self> {
        let words: [u32; W] = words.try_into().map_err(|_| {
            MegashareError::format(format!(
                "expected {W} key words, got {}",
                words.len()
            ))
        })?;
        Ok(Self { words })
    }

    /// Build a key from raw bytes. Fails unless exactly `4 * W` bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::BYTES {
            return Err(MegashareError::format(format!(
                "expected {} key bytes, got {}",
                Self::BYTES,
                bytes.len()
            )));
        }
        Self::from_words(&words::bytes_to_words(bytes))
    }

    pub fn zero() -> Self {
        Self { words: [0; W] }
    }

    pub fn words(&self) -> &[u32; W] {
        &self.words
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        words::words_to_bytes(&self.words)
    }
}

impl Key128 {
    /// Raw 16-byte form, for cipher construction.
    pub(crate) fn to_block(&self) -> [u8; 16] {
        let mut block = [0u8; 16];
        for (out, word) in block.chunks_exact_mut(4).zip(self.words.iter()) {
            out.copy_from_slice(&word.to_be_bytes());
        }
        block
    }
}

impl Key256 {
    /// XOR the two halves into the 128-bit content key.
    pub fn reduce_to_128(&self) -> Key128 {
        let w = &self.words;
        Key128::from_word_array([w[0] ^ w[4], w[1] ^ w[5], w[2] ^ w[6], w[3] ^ w[7]])
    }

    /// Counter-mode IV: the nonce words of the second half, zero-extended.
    pub fn iv(&self) -> Key128 {
        Key128::from_word_array([self.words[4], self.words[5], 0, 0])
    }

    /// The condensed integrity tag carried in the last two words.
    pub fn integrity_tag(&self) -> Key64 {
        Key64::from_word_array([self.words[6], self.words[7]])
    }
}

impl<const W: usize> PartialEq for Key<W> {
    fn eq(&self, other: &Self) -> bool {
        self.words[..].ct_eq(&other.words[..]).into()
    }
}

impl<const W: usize> Eq for Key<W> {}

impl<const W: usize> fmt::Debug for Key<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key{}(<redacted>)", W * 32)
    }
}
