//! # megashare
//!
//! Client core for reading public shared folders of an end-to-end encrypted
//! cloud store.
//!
//! A share link carries the folder's id and its 128-bit key. Every node
//! below it has its own key, wrapped under the key of some other node, and
//! encrypted attributes (its name). Decoding a share is a chain:
//!
//! ```text
//! link ──▶ container key ──▶ node keys ──▶ attributes ──▶ tree
//!                                   └──▶ file content (AES-CTR)
//! ```
//!
//! The crate does no I/O. Callers fetch the node list and file bytes,
//! either by hand or through a [`api::Transport`] passed to
//! [`api::ShareClient`].
//!
//! ## Public API
//!
//! The three driver entry points are re-exported at the root:
//! [`parse_share_link`], [`decode_node_list`] and [`decrypt_file`].
//! [`verify_file`] checks decrypted content against its integrity tag.
//! [`unwrap128`] and [`unwrap256`] expose the key unwrap step on its own.

pub mod api;
pub mod assembly;
pub mod attributes;
pub mod b64;
pub mod config;
pub(crate) mod crypto;
pub mod decoder;
pub mod error;
pub mod ids;
pub(crate) mod keys;
pub mod link;
pub mod node;
pub mod stream;
pub mod tree;
pub mod words;

pub use assembly::decode_node_list;
pub use config::{ClientConfig, Region};
pub use crypto::{unwrap128, unwrap256};
pub use error::{MegashareError, Result};
pub use ids::{NodeId, UserId};
pub use keys::{Key, Key128, Key256, Key64};
pub use link::{parse_share_link, ShareContainer};
pub use node::ClearNode;
pub use stream::{decrypt_file, verify_file};
pub use tree::NodeTree;
