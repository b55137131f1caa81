//! Share link parsing.
//!
//! A folder share link carries everything needed to start decrypting: the
//! container (root folder) handle and the 128-bit container key. Two link
//! shapes are accepted:
//!
//! ```text
//! https://mega.nz/#F!<8-char id>!<22-char key>      legacy
//! https://mega.nz/folder/<8-char id>#<22-char key>  current
//! ```

use tracing::debug;
use url::Url;

use crate::b64;
use crate::config::{ClientConfig, Region};
use crate::error::{MegashareError, Result};
use crate::ids::NodeId;
use crate::keys::Key128;

/// Length of the base64 container key in a link.
const LINK_KEY_LEN: usize = 22;

/// The target of a share link. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareContainer {
    id: NodeId,
    key: Key128,
    region: Region,
}

impl ShareContainer {
    pub fn new(id: NodeId, key: Key128, region: Region) -> Self {
        Self { id, key, region }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn key(&self) -> &Key128 {
        &self.key
    }

    /// The API region commands for this share go to.
    pub fn region(&self) -> Region {
        self.region
    }
}

/// Parse a share link, falling back to `config.default_region` when the link
/// host does not pin a region.
pub fn parse_share_link(link: &str, config: &ClientConfig) -> Result<ShareContainer> {
    let (host, path, fragment) = split_link(link)?;

    let (id, key) = match fragment.strip_prefix("F!") {
        Some(legacy) => parse_legacy_fragment(legacy)?,
        None => parse_folder_path(&path, &fragment)?,
    };

    let region = host
        .as_deref()
        .and_then(Region::from_host)
        .unwrap_or(config.default_region);
    debug!(container = %id, ?region, "parsed share link");

    Ok(ShareContainer::new(id, decode_link_key(key)?, region))
}

/// Split a link into (host, path, fragment). Bare `#fragment` input is
/// accepted without a host.
fn split_link(link: &str) -> Result<(Option<String>, String, String)> {
    match Url::parse(link) {
        Ok(url) => {
            let fragment = url
                .fragment()
                .filter(|f| !f.is_empty())
                .ok_or_else(|| MegashareError::format("share link has no fragment"))?;
            Ok((
                url.host_str().map(str::to_string),
                url.path().to_string(),
                fragment.to_string(),
            ))
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let (path, fragment) = link
                .split_once('#')
                .filter(|(_, f)| !f.is_empty())
                .ok_or_else(|| MegashareError::format("share link has no fragment"))?;
            Ok((None, path.to_string(), fragment.to_string()))
        }
        Err(err) => Err(MegashareError::format(format!("invalid share link: {err}"))),
    }
}

/// `<id>!<key>` after the `F!` marker, up to any `!<subfolder>` suffix.
fn parse_legacy_fragment(rest: &str) -> Result<(NodeId, &str)> {
    let (id, key) = rest
        .split_once('!')
        .ok_or_else(|| MegashareError::format("share fragment must be F!<id>!<key>"))?;
    let key = key.split('!').next().unwrap_or(key);
    Ok((NodeId::new(id)?, key))
}

/// `/folder/<id>` with the key as the whole fragment, up to any sub-path.
fn parse_folder_path<'a>(path: &str, fragment: &'a str) -> Result<(NodeId, &'a str)> {
    let id = path
        .strip_prefix("/folder/")
        .map(|rest| rest.trim_end_matches('/'))
        .ok_or_else(|| MegashareError::format("not a folder share link"))?;
    let key = fragment.split('/').next().unwrap_or(fragment);
    Ok((NodeId::new(id)?, key))
}

fn decode_link_key(encoded: &str) -> Result<Key128> {
    let well_formed = encoded.len() == LINK_KEY_LEN
        && encoded
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b','));
    if !well_formed {
        return Err(MegashareError::format("share key must be 22 base64 characters"));
    }
    Key128::from_bytes(&b64::decode(encoded)?)
}
