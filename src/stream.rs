//! File content decryption and integrity verification.
//!
//! Content is AES-128-CTR under the node's content key, with the node IV as
//! the initial counter block. Counter mode keystream at byte `n` depends only
//! on `n`, so content can be decrypted in chunks of any size, including
//! unaligned ones, as long as chunks are fed in order (or after a `seek`).
//!
//! Integrity is a chunked CBC-MAC over the *plaintext*:
//!
//! ```text
//! chunk i (1-based) covers 128 KiB * min(i, 8) bytes
//! chunk_mac = CBC-MAC(key, start = nonce ‖ nonce, zero-padded chunk)
//! file_mac  = CBC-MAC(key, start = 0, chunk_mac_1 ‖ chunk_mac_2 ‖ …)
//! tag       = [ file_mac.w0 ^ w1, file_mac.w2 ^ w3 ]
//! ```
//!
//! Checking the tag is opt-in; decryption alone never fails on content.

use aes::cipher::{StreamCipher, StreamCipherSeek};

use crate::crypto::{self, Aes128Ctr, MacCipher, BLOCK_LEN};
use crate::error::{MegashareError, Result};
use crate::keys::{Key128, Key64};
use crate::node::ClearNode;
use crate::words;

/// Size unit of integrity chunks (128 KiB).
const MAC_CHUNK_UNIT: usize = 128 * 1024;
/// Chunks stop growing after this many units (1 MiB).
const MAC_CHUNK_MAX_UNITS: usize = 8;

/// Size of the `index`-th integrity chunk, 1-based.
pub fn mac_chunk_len(index: usize) -> usize {
    MAC_CHUNK_UNIT * index.clamp(1, MAC_CHUNK_MAX_UNITS)
}

fn ensure_file(node: &ClearNode) -> Result<()> {
    if node.is_file() {
        Ok(())
    } else {
        Err(MegashareError::NotSupported(format!(
            "node {} of type {} has no content",
            node.id, node.kind
        )))
    }
}

// ---------------------------------------------------------------------------
// Decryption
// ---------------------------------------------------------------------------

/// Incremental counter-mode decryptor.
pub struct FileStreamDecryptor {
    cipher: Aes128Ctr,
    offset: u64,
}

impl FileStreamDecryptor {
    pub fn new(key: &Key128, iv: &Key128) -> Self {
        Self {
            cipher: crypto::ctr_cipher(key, iv),
            offset: 0,
        }
    }

    pub fn for_node(node: &ClearNode) -> Result<Self> {
        ensure_file(node)?;
        Ok(Self::new(&node.key, &node.iv))
    }

    /// Decrypt the next chunk of the stream in place.
    pub fn decrypt_in_place(&mut self, chunk: &mut [u8]) {
        self.cipher.apply_keystream(chunk);
        self.offset += chunk.len() as u64;
    }

    /// Decrypt the next chunk of the stream.
    pub fn decrypt_chunk(&mut self, chunk: &[u8]) -> Vec<u8> {
        let mut out = chunk.to_vec();
        self.decrypt_in_place(&mut out);
        out
    }

    /// Jump to an absolute byte offset of the content.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.cipher
            .try_seek(offset)
            .map_err(|_| MegashareError::format(format!("cannot seek to offset {offset}")))?;
        self.offset = offset;
        Ok(())
    }

    /// Byte offset the next chunk is expected at.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Decrypt a whole ciphertext in one call.
pub fn decrypt(ciphertext: &[u8], key: &Key128, iv: &Key128) -> Vec<u8> {
    FileStreamDecryptor::new(key, iv).decrypt_chunk(ciphertext)
}

/// Decrypt downloaded content of a file node.
pub fn decrypt_file(ciphertext: &[u8], node: &ClearNode) -> Result<Vec<u8>> {
    Ok(FileStreamDecryptor::for_node(node)?.decrypt_chunk(ciphertext))
}

// ---------------------------------------------------------------------------
// Integrity
// ---------------------------------------------------------------------------

/// Incremental computation of a file's integrity tag over its plaintext.
pub struct IntegrityVerifier {
    mac: MacCipher,
    chunk_start: [u8; BLOCK_LEN],
    chunk_index: usize,
    chunk_remaining: usize,
    chunk_state: [u8; BLOCK_LEN],
    block: [u8; BLOCK_LEN],
    block_len: usize,
    file_state: [u8; BLOCK_LEN],
}

impl IntegrityVerifier {
    pub fn new(key: &Key128, iv: &Key128) -> Self {
        let iv_bytes = iv.to_block();
        let mut chunk_start = [0u8; BLOCK_LEN];
        chunk_start[..8].copy_from_slice(&iv_bytes[..8]);
        chunk_start[8..].copy_from_slice(&iv_bytes[..8]);
        Self {
            mac: MacCipher::new(key),
            chunk_start,
            chunk_index: 0,
            chunk_remaining: 0,
            chunk_state: [0u8; BLOCK_LEN],
            block: [0u8; BLOCK_LEN],
            block_len: 0,
            file_state: [0u8; BLOCK_LEN],
        }
    }

    pub fn for_node(node: &ClearNode) -> Result<Self> {
        ensure_file(node)?;
        Ok(Self::new(&node.key, &node.iv))
    }

    /// Feed the next run of plaintext.
    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            if self.chunk_remaining == 0 {
                self.start_chunk();
            }
            let take = self.chunk_remaining.min(data.len());
            self.absorb_bytes(&data[..take]);
            self.chunk_remaining -= take;
            data = &data[take..];
            if self.chunk_remaining == 0 {
                self.finish_chunk();
            }
        }
    }

    /// The condensed 64-bit tag of everything fed so far.
    pub fn finalize(mut self) -> Key64 {
        if self.chunk_remaining > 0 {
            self.finish_chunk();
        }
        let w = words::bytes_to_words(&self.file_state);
        Key64::from_word_array([w[0] ^ w[1], w[2] ^ w[3]])
    }

    /// Compare the computed tag against `expected`.
    pub fn verify(self, expected: &Key64) -> bool {
        self.finalize() == *expected
    }

    /// Check the computed tag against a file node's own.
    ///
    /// Fails with `NotSupported` if the node carries no tag, and with
    /// `Integrity` on a mismatch.
    pub fn verify_node(self, node: &ClearNode) -> Result<()> {
        let expected = node.integrity_tag.as_ref().ok_or_else(|| {
            MegashareError::NotSupported(format!("node {} carries no integrity tag", node.id))
        })?;
        if self.verify(expected) {
            Ok(())
        } else {
            Err(MegashareError::Integrity(node.id.clone()))
        }
    }

    fn start_chunk(&mut self) {
        self.chunk_index += 1;
        self.chunk_remaining = mac_chunk_len(self.chunk_index);
        self.chunk_state = self.chunk_start;
        self.block_len = 0;
    }

    fn absorb_bytes(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let take = (BLOCK_LEN - self.block_len).min(data.len());
            self.block[self.block_len..self.block_len + take].copy_from_slice(&data[..take]);
            self.block_len += take;
            data = &data[take..];
            if self.block_len == BLOCK_LEN {
                self.mac.absorb(&mut self.chunk_state, &self.block);
                self.block_len = 0;
            }
        }
    }

    fn finish_chunk(&mut self) {
        if self.block_len > 0 {
            self.block[self.block_len..].fill(0);
            self.mac.absorb(&mut self.chunk_state, &self.block);
            self.block_len = 0;
        }
        self.chunk_remaining = 0;
        self.mac.absorb(&mut self.file_state, &self.chunk_state);
    }
}

/// Check decrypted content against the node's integrity tag.
pub fn verify_file(plaintext: &[u8], node: &ClearNode) -> Result<()> {
    let mut verifier = IntegrityVerifier::for_node(node)?;
    verifier.update(plaintext);
    verifier.verify_node(node)
}
