//! Big-endian 32-bit word packing.
//!
//! Keys travel as word arrays wherever they are combined (XOR reduction, IV
//! extraction) and as raw bytes wherever they feed a cipher. These two
//! functions are the only bridge between the representations.

/// Pack words big-endian into a byte string.
pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Unpack a byte string into big-endian words.
///
/// The input is zero-padded on the right up to a multiple of four bytes, so
/// this never fails.
pub fn bytes_to_words(data: &[u8]) -> Vec<u32> {
    data.chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_big_endian_layout() {
        assert_eq!(
            words_to_bytes(&[0x0102_0304, 0xa0b0_c0d0]),
            vec![1, 2, 3, 4, 0xa0, 0xb0, 0xc0, 0xd0]
        );
    }

    #[test]
    fn test_short_tail_is_zero_padded() {
        assert_eq!(bytes_to_words(&[1, 2, 3, 4, 5]), vec![0x0102_0304, 0x0500_0000]);
        assert!(bytes_to_words(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn words_survive_a_byte_roundtrip(words in proptest::collection::vec(any::<u32>(), 4)) {
            prop_assert_eq!(bytes_to_words(&words_to_bytes(&words)), words);
        }
    }
}
