//! Client configuration.
//!
//! Everything a session needs to know up front lives in one value that the
//! caller builds and passes in. There is no process-wide default.

use serde::{Deserialize, Serialize};

/// Default download chunk size (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// One of the two regional API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Global,
    Europe,
}

impl Region {
    pub fn api_host(&self) -> &'static str {
        match self {
            Self::Global => "g.api.mega.co.nz",
            Self::Europe => "eu.api.mega.co.nz",
        }
    }

    /// Command endpoint for this region.
    pub fn api_url(&self) -> String {
        format!("https://{}/cs", self.api_host())
    }

    /// Region pinned by a link host, if the host names one.
    pub fn from_host(host: &str) -> Option<Self> {
        let host = host.to_ascii_lowercase();
        if host.starts_with("eu.") {
            Some(Self::Europe)
        } else if host.starts_with("g.api.") {
            Some(Self::Global)
        } else {
            None
        }
    }
}

/// Settings for a share client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Region used when the share link does not pin one.
    pub default_region: Region,
    /// Chunk size used when decrypting downloaded content.
    pub chunk_size: usize,
    /// Check each download against its integrity tag.
    pub verify_integrity: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_region: Region::Global,
            chunk_size: DEFAULT_CHUNK_SIZE,
            verify_integrity: false,
        }
    }
}
