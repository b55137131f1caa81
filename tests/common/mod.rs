//! Shared fixtures: a small share recorded from an independent AES
//! implementation.
//!
//! ```text
//! FoLdEr01  "Shared"     (container, key = share key)
//! ├── SuBdIr01  "photos"
//! │   └── NeStEd01  "cat.jpg"   (key wrapped under SuBdIr01)
//! └── FiLe0001  "hello.txt"     (300 bytes)
//! ```

#![allow(dead_code)]

use megashare::node::EncryptedNodeRecord;
use megashare::{b64, ClientConfig, Key128, NodeId, Region, ShareContainer};
use serde_json::json;

pub const SHARE_KEY_HEX: &str = "0f1e2d3c4b5a69788796a5b4c3d2e1f0";
pub const SHARE_LINK: &str = "https://mega.nz/folder/FoLdEr01#Dx4tPEtaaXiHlqW0w9Lh8A";

pub const FILE_CIPHERTEXT_B64: &str = "HwgAtelPRfBWAWuWrUUr/7yQz56ksmoe8ncv4ScywVs3dJU7Zm7KPIsKj4MCPX261X1fznND7tlgMI6vQr+B/ChwjfPQm+C1eIpsFKRdO9qz6c3e7aXesiMnbbqq8cKihGslh74VOGHYpKmHq0m/aEy4Hu518pT8BfWNnvQrFj7qdL/Ah4sn64mLoXckoFmgomrkrkkQOv+xEw2gecUZ5h/gF+iD79SxL+8fN42ng54r7GEw9QHt8kT1wxph6tc0DwC+yFXTxRSQ7TP88rvebKTIeSsxS/UDLs8iMynOpM0sURvc1e8fu4aY8K0xedxT2zgEaTOtoxHk2MN7a+QHw/eLxazbHuDndE/0+wbJ+sWLi2zEUAqE8ZvitKPpfB8hxOg44wkkrhQAqMP8";
pub const NESTED_CIPHERTEXT_HEX: &str = "6940732a2c01";

pub fn id(raw: &str) -> NodeId {
    NodeId::new(raw).unwrap()
}

pub fn share_key() -> Key128 {
    Key128::from_bytes(&hex::decode(SHARE_KEY_HEX).unwrap()).unwrap()
}

pub fn container() -> ShareContainer {
    ShareContainer::new(id("FoLdEr01"), share_key(), Region::Global)
}

pub fn config() -> ClientConfig {
    ClientConfig::default()
}

pub fn root_json() -> serde_json::Value {
    json!({
        "h": "FoLdEr01", "p": "PaReNt00", "u": "UsEr0123456", "t": 1,
        "a": "ah97Z4ZQ508kk1Uf547VI6iiHIvkjRBs82vcIKC51TA",
        "k": "FoLdEr01:I2_pVAnMW94vn4-zunK1PQ",
        "ts": 1_500_000_000
    })
}

pub fn subdir_json() -> serde_json::Value {
    json!({
        "h": "SuBdIr01", "p": "FoLdEr01", "u": "UsEr0123456", "t": 1,
        "a": "RrKU9KZ775j1vq5gl0UgEEC6meUK41iRlkERfW_-19E",
        "k": "FoLdEr01:VsKE849W8RFEJpr2DmL3sw",
        "ts": 1_500_000_000
    })
}

pub fn file_json() -> serde_json::Value {
    json!({
        "h": "FiLe0001", "p": "FoLdEr01", "u": "UsEr0123456", "t": 0, "s": 300,
        "a": "uvJzUKAO8zY4XEiDWc3-ghL7LEIby-afCk6lN_N4U8sCVOgB34c8lqKNi90xd3bFiSlzGIZa8jxqZ8bWxDy6cw",
        "k": "FoLdEr01:NktOcK9q2FKvS2sjgoyZ7fZAMjyoEXulKjXSewF75E0",
        "ts": 1_500_000_000
    })
}

pub fn nested_json() -> serde_json::Value {
    json!({
        "h": "NeStEd01", "p": "SuBdIr01", "u": "UsEr0123456", "t": 0, "s": 6,
        "a": "G7kubHjLEboU_EoM6bIyOtgloakAHV3D83di6JbzKCo",
        "k": "SuBdIr01:lebEo_1j3ziEAOn_NmSCAmjb0PjBcYXakw6qNGz-cHk",
        "ts": 1_500_000_000
    })
}

pub fn record(value: serde_json::Value) -> EncryptedNodeRecord {
    EncryptedNodeRecord::from_json(value).unwrap()
}

/// Root, subfolder and top-level file, in wire order.
pub fn basic_records() -> Vec<EncryptedNodeRecord> {
    vec![record(root_json()), record(subdir_json()), record(file_json())]
}

pub fn file_plaintext() -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. ".repeat(7)[..300].to_vec()
}

pub fn file_ciphertext() -> Vec<u8> {
    b64::decode(FILE_CIPHERTEXT_B64).unwrap()
}

pub fn nested_ciphertext() -> Vec<u8> {
    hex::decode(NESTED_CIPHERTEXT_HEX).unwrap()
}
