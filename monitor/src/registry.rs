//! Endpoint registry.
//!
//! The registry is the ordered list of named RPC endpoints to probe. It is
//! loaded once at startup from a YAML file of the form:
//!
//! ```yaml
//! rpc_endpoints:
//!   - name: ankr
//!     url: https://rpc.ankr.com/eth
//!   - name: llamarpc
//!     url: https://eth.llamarpc.com
//! ```
//!
//! The first entry doubles as the reference endpoint whose chain height
//! drives the monitor.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ConfigError;

/// A named RPC endpoint.
///
/// Identity is the `(name, url)` pair. Duplicates are kept and probed as
/// separate targets.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// On-disk layout of the endpoint list.
#[derive(Debug, Deserialize)]
struct EndpointFile {
    #[serde(default)]
    rpc_endpoints: Vec<Endpoint>,
}

/// Immutable, non-empty, ordered list of endpoints.
///
/// Cloning is cheap; all clones share the same list.
#[derive(Clone, Debug)]
pub struct EndpointRegistry {
    endpoints: Arc<[Endpoint]>,
}

impl EndpointRegistry {
    /// Reads and parses the endpoint list at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let file: EndpointFile =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Self::build(file.rpc_endpoints, || path.display().to_string())
    }

    /// Builds a registry from an in-memory list.
    pub fn from_endpoints(endpoints: Vec<Endpoint>) -> Result<Self, ConfigError> {
        Self::build(endpoints, || "endpoint list".to_string())
    }

    fn build(
        endpoints: Vec<Endpoint>,
        origin: impl FnOnce() -> String,
    ) -> Result<Self, ConfigError> {
        if endpoints.is_empty() {
            return Err(ConfigError::Empty(origin()));
        }
        Ok(Self {
            endpoints: endpoints.into(),
        })
    }

    /// The endpoint polled for chain height (always the first entry).
    pub fn reference(&self) -> &Endpoint {
        &self.endpoints[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always `false`: an empty registry cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
