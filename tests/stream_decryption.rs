//! Chunked content decryption and integrity tags.

mod common;

use megashare::stream::{decrypt, FileStreamDecryptor, IntegrityVerifier};
use megashare::{decode_node_list, decrypt_file, verify_file, ClearNode, MegashareError};
use proptest::prelude::*;

fn file_node() -> ClearNode {
    let tree = decode_node_list(common::basic_records(), &common::container()).unwrap();
    tree.get(&common::id("FiLe0001")).unwrap().clone()
}

#[test]
fn test_unaligned_chunks_match_one_shot() {
    let node = file_node();
    let ciphertext = common::file_ciphertext();

    let mut decryptor = FileStreamDecryptor::for_node(&node).unwrap();
    let mut out = Vec::new();
    for chunk in ciphertext.chunks(7) {
        out.extend(decryptor.decrypt_chunk(chunk));
    }
    assert_eq!(out, common::file_plaintext());
    assert_eq!(decryptor.offset(), 300);
}

#[test]
fn test_seek_into_the_middle() {
    let node = file_node();
    let ciphertext = common::file_ciphertext();

    let mut decryptor = FileStreamDecryptor::for_node(&node).unwrap();
    decryptor.seek(123).unwrap();
    assert_eq!(
        decryptor.decrypt_chunk(&ciphertext[123..200]),
        common::file_plaintext()[123..200].to_vec()
    );
}

#[test]
fn test_folders_have_no_content() {
    let tree = decode_node_list(common::basic_records(), &common::container()).unwrap();
    let folder = tree.root();
    assert!(matches!(
        decrypt_file(b"abc", folder),
        Err(MegashareError::NotSupported(_))
    ));
    assert!(FileStreamDecryptor::for_node(folder).is_err());
}

#[test]
fn test_tampered_content_fails_verification() {
    let node = file_node();
    let mut plaintext = decrypt_file(&common::file_ciphertext(), &node).unwrap();
    plaintext[150] ^= 1;
    let err = verify_file(&plaintext, &node).unwrap_err();
    assert!(matches!(err, MegashareError::Integrity(id) if id.as_str() == "FiLe0001"));
}

#[test]
fn test_verifier_matches_node_tag_in_pieces() {
    let node = file_node();
    let plaintext = common::file_plaintext();
    let mut verifier = IntegrityVerifier::for_node(&node).unwrap();
    for piece in plaintext.chunks(33) {
        verifier.update(piece);
    }
    assert!(verifier.verify(node.integrity_tag.as_ref().unwrap()));
}

proptest! {
    #[test]
    fn prop_split_point_does_not_matter(split in 0usize..=300) {
        let node = file_node();
        let ciphertext = common::file_ciphertext();

        let mut decryptor = FileStreamDecryptor::for_node(&node).unwrap();
        let mut out = decryptor.decrypt_chunk(&ciphertext[..split]);
        out.extend(decryptor.decrypt_chunk(&ciphertext[split..]));
        prop_assert_eq!(out, decrypt(&ciphertext, &node.key, &node.iv));
    }

    #[test]
    fn prop_tag_independent_of_feed_sizes(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        step in 1usize..200,
    ) {
        let node = file_node();
        let mut whole = IntegrityVerifier::for_node(&node).unwrap();
        whole.update(&data);
        let mut pieces = IntegrityVerifier::for_node(&node).unwrap();
        for piece in data.chunks(step) {
            pieces.update(piece);
        }
        prop_assert_eq!(whole.finalize(), pieces.finalize());
    }
}
