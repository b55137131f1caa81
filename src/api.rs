//! Service commands and the share client session.
//!
//! The core never does I/O itself. A [`Transport`] posts JSON commands and
//! fetches content bytes; [`ShareClient`] builds the commands, checks the
//! responses for service errors and hands the payloads to the decoding
//! pipeline. Nothing here retries: a retryable [`RemoteError`] is returned
//! to the caller as is.

use std::sync::atomic::{AtomicU64, Ordering};

use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::assembly::{self, Assembly};
use crate::config::ClientConfig;
use crate::error::{MegashareError, RemoteError, Result};
use crate::ids::NodeId;
use crate::link::{self, ShareContainer};
use crate::node::ClearNode;
use crate::stream::{FileStreamDecryptor, IntegrityVerifier};
use crate::tree::NodeTree;

/// Command listing every node under the share container.
pub fn fetch_nodes_command() -> Value {
    json!({ "a": "f", "c": 1, "r": 1 })
}

/// Command asking for the download location of a file node.
pub fn download_url_command(id: &NodeId) -> Value {
    json!({ "a": "g", "g": 1, "n": id.as_str() })
}

/// Payload of a fetch-nodes command.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeListResponse {
    /// Node records in wire order, left raw so one malformed record does
    /// not reject the whole listing.
    pub f: Vec<Value>,
    /// Sequence reference for later change polling. Unused here.
    #[serde(default)]
    pub sn: Option<String>,
    #[serde(default)]
    pub noc: Option<i64>,
}

/// Payload of a download-url command.
#[derive(Debug, Clone, Deserialize)]
pub struct FileLocation {
    /// Temporary content URL.
    pub g: String,
    #[serde(default)]
    pub s: Option<u64>,
    /// Encrypted attributes, as in the node record.
    #[serde(default)]
    pub at: Option<String>,
    #[serde(default)]
    pub fa: Option<String>,
    #[serde(default)]
    pub e: Option<i64>,
    #[serde(default)]
    pub msd: Option<i64>,
    #[serde(default)]
    pub tl: Option<i64>,
}

fn remote_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().filter(|code| *code < 0),
        Value::Object(map) => map.get("e").and_then(Value::as_i64).filter(|code| *code < 0),
        _ => None,
    }
}

/// Fail if a response is a service error: a bare negative number or an
/// object carrying a negative `e`, at the top level or one level inside a
/// response array.
pub fn check_remote_error(response: &Value) -> Result<()> {
    let nested = match response {
        Value::Array(items) => items.iter().find_map(remote_code),
        _ => None,
    };
    match remote_code(response).or(nested) {
        Some(code) => Err(RemoteError::from_code(code).into()),
        None => Ok(()),
    }
}

/// Check a batch response and take out the payload of its only command.
pub fn unwrap_response(response: Value) -> Result<Value> {
    check_remote_error(&response)?;
    match response {
        Value::Array(mut items) => {
            if items.len() != 1 {
                return Err(MegashareError::format(format!(
                    "expected one command result, got {}",
                    items.len()
                )));
            }
            Ok(items.swap_remove(0))
        }
        other => Ok(other),
    }
}

/// One command as it goes over the wire.
#[derive(Debug, Clone)]
pub struct CommandRequest<'a> {
    /// Regional command endpoint.
    pub endpoint: String,
    pub seq: u64,
    pub container: &'a NodeId,
    pub command: Value,
}

impl CommandRequest<'_> {
    /// Endpoint with the `id` and `n` query parameters.
    pub fn url(&self) -> Result<Url> {
        let seq = self.seq.to_string();
        Url::parse_with_params(
            &self.endpoint,
            [("id", seq.as_str()), ("n", self.container.as_str())],
        )
        .map_err(|err| MegashareError::Transport(format!("invalid endpoint: {err}")))
    }

    /// Commands are always posted as a batch of one.
    pub fn body(&self) -> Value {
        Value::Array(vec![self.command.clone()])
    }
}

/// Network access, supplied by the caller.
///
/// Implementations report their own failures as
/// [`MegashareError::Transport`]. Service errors inside a successful HTTP
/// exchange are left in the returned value for the client to detect.
pub trait Transport {
    fn post_command(&self, request: &CommandRequest<'_>) -> Result<Value>;
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// A session against one shared folder.
pub struct ShareClient<T: Transport> {
    config: ClientConfig,
    container: ShareContainer,
    transport: T,
    seq: AtomicU64,
}

impl<T: Transport> ShareClient<T> {
    /// Open a session for a share link.
    pub fn new(link: &str, config: ClientConfig, transport: T) -> Result<Self> {
        let container = link::parse_share_link(link, &config)?;
        Self::with_container(container, config, transport)
    }

    pub fn with_container(
        container: ShareContainer,
        config: ClientConfig,
        transport: T,
    ) -> Result<Self> {
        Ok(Self {
            config,
            container,
            transport,
            seq: AtomicU64::new(initial_seq()?),
        })
    }

    pub fn container(&self) -> &ShareContainer {
        &self.container
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch and decode the whole shared tree, failing if any record could
    /// not be placed.
    pub fn list(&self) -> Result<NodeTree> {
        self.list_partial()?.into_tree()
    }

    /// Fetch the shared tree, keeping every node that could be placed and
    /// reporting the records that could not.
    pub fn list_partial(&self) -> Result<Assembly> {
        let payload = self.send(fetch_nodes_command())?;
        let response: NodeListResponse = serde_json::from_value(payload)?;
        debug!(
            container = %self.container.id(),
            records = response.f.len(),
            "node list fetched"
        );
        assembly::assemble_values(response.f, &self.container)
    }

    /// Download and decrypt a file node's content.
    pub fn download(&self, node: &ClearNode) -> Result<Vec<u8>> {
        let mut decryptor = FileStreamDecryptor::for_node(node)?;
        let payload = self.send(download_url_command(&node.id))?;
        let location: FileLocation = serde_json::from_value(payload)?;

        let mut content = self.transport.fetch_bytes(&location.g)?;
        if let Some(expected) = location.s {
            if expected != content.len() as u64 {
                return Err(MegashareError::Transport(format!(
                    "content of {} is {} bytes, expected {expected}",
                    node.id,
                    content.len()
                )));
            }
        }

        let mut verifier = if self.config.verify_integrity {
            Some(IntegrityVerifier::for_node(node)?)
        } else {
            None
        };
        for chunk in content.chunks_mut(self.config.chunk_size.max(1)) {
            decryptor.decrypt_in_place(chunk);
            if let Some(verifier) = verifier.as_mut() {
                verifier.update(chunk);
            }
        }

        if let Some(verifier) = verifier {
            verifier.verify_node(node)?;
        }
        debug!(node = %node.id, bytes = content.len(), "file downloaded");
        Ok(content)
    }

    fn send(&self, command: Value) -> Result<Value> {
        let request = CommandRequest {
            endpoint: self.container.region().api_url(),
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            container: self.container.id(),
            command,
        };
        let response = self.transport.post_command(&request)?;
        unwrap_response(response)
    }
}

fn initial_seq() -> Result<u64> {
    let mut seed = [0u8; 4];
    SystemRandom::new()
        .fill(&mut seed)
        .map_err(|_| MegashareError::Transport("system randomness unavailable".into()))?;
    Ok(u64::from(u32::from_be_bytes(seed)))
}
