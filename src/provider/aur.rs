// src/provider/aur.rs

//! AUR package provider
//!
//! Resolves package names against the aurweb RPC v5 interface. The RPC
//! speaks two query shapes: a search endpoint returning abbreviated records
//! and a bulk info endpoint returning complete ones. Resolution therefore
//! runs in two phases:
//!
//! 1. **Direct**: bulk-info every requested name not already indexed by
//!    display name.
//! 2. **Virtual**: for names still missing, search by the `provides`
//!    attribute, then bulk-info the hits so their provides lists are known
//!    and indexed.
//!
//! Names that no package carries or provides are returned to the caller as
//! the unresolved set; that is a normal outcome, not an error.

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::PackageProvider;
use crate::error::Result as ForgeResult;
use crate::index::PackageIndex;
use crate::package::{PackageFields, PackageId, PackageRecord};

/// Production registry endpoint.
pub const AUR_BASE_URL: &str = "https://aur.archlinux.org";

/// RPC protocol version this client understands.
const RPC_VERSION: i64 = 5;

/// Timeout for RPC requests.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the remote registry.
///
/// All variants are raised by a single failed query and are not retried by
/// the engine; records materialized by earlier queries stay in the index.
#[derive(Error, Debug)]
pub enum AurError {
    /// Connection or protocol-level failure, including undecodable bodies
    #[error("AUR request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The registry answered with a non-success HTTP status
    #[error("AUR returned HTTP {status} from {url}")]
    Http { status: StatusCode, url: String },

    /// The registry answered with its own error payload
    #[error("AUR RPC error from {url}: {message}")]
    Rpc { url: String, message: String },

    /// The registry speaks a protocol version this client does not
    #[error("unexpected AUR RPC version {version} from {url}")]
    Version { url: String, version: i64 },

    /// The response kind did not match the query that was sent
    #[error("unexpected AUR response kind from {url}")]
    UnexpectedResponse { url: String },
}

/// Attribute the search endpoint can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    /// Exact package name
    Name,
    /// Provided virtual name
    Provides,
}

impl SearchField {
    /// Value of the `by` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Provides => "provides",
        }
    }
}

/// Abbreviated record from the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRecord {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "PackageBaseID")]
    pub package_base_id: i64,
    #[serde(rename = "PackageBase")]
    pub package_base: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
}

impl SearchRecord {
    fn to_record(&self) -> PackageRecord {
        PackageRecord {
            base_id: PackageId::Registry(self.package_base_id),
            name_id: PackageId::Registry(self.id),
            base: self.package_base.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            fields: None,
        }
    }
}

/// Complete record from the bulk info endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct InfoRecord {
    #[serde(flatten)]
    pub summary: SearchRecord,
    #[serde(rename = "Depends", default)]
    pub depends: Vec<String>,
    #[serde(rename = "MakeDepends", default)]
    pub makedepends: Vec<String>,
    #[serde(rename = "OptDepends", default)]
    pub optdepends: Vec<String>,
    #[serde(rename = "Provides", default)]
    pub provides: Vec<String>,
}

impl InfoRecord {
    fn to_record(&self) -> PackageRecord {
        PackageRecord {
            fields: Some(PackageFields {
                depends: self.depends.clone(),
                makedepends: self.makedepends.clone(),
                optdepends: self.optdepends.clone(),
                provides: self.provides.clone(),
            }),
            ..self.summary.to_record()
        }
    }
}

/// RPC response envelope, discriminated by the registry's `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RpcResponse {
    #[serde(rename = "error")]
    Error { version: i64, error: String },
    #[serde(rename = "search")]
    Search {
        version: i64,
        resultcount: usize,
        results: Vec<SearchRecord>,
    },
    #[serde(rename = "multiinfo")]
    Multiinfo {
        version: i64,
        resultcount: usize,
        results: Vec<InfoRecord>,
    },
}

impl RpcResponse {
    fn version(&self) -> i64 {
        match self {
            Self::Error { version, .. }
            | Self::Search { version, .. }
            | Self::Multiinfo { version, .. } => *version,
        }
    }
}

/// The remote-query collaborator: one search call, one bulk info call.
///
/// Implemented over HTTP by [`AurClient`]; tests substitute an in-memory
/// registry.
pub trait AurRpc {
    /// Search for packages whose `by` attribute matches `query`.
    fn search(&self, by: SearchField, query: &str) -> Result<Vec<SearchRecord>, AurError>;

    /// Fetch complete records for the given display names.
    fn info(&self, names: &[String]) -> Result<Vec<InfoRecord>, AurError>;
}

/// Blocking HTTP client for the aurweb RPC.
pub struct AurClient {
    client: Client,
    base_url: String,
}

impl AurClient {
    /// Create a client against the production registry.
    pub fn new() -> Result<Self, AurError> {
        Self::with_base_url(AUR_BASE_URL)
    }

    /// Create a client against a custom registry endpoint.
    pub fn with_base_url(base_url: &str) -> Result<Self, AurError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AurError::Transport {
                url: base_url.clone(),
                source: e,
            })?;
        Ok(Self { client, base_url })
    }

    /// Validate the envelope: protocol version, then registry error payload.
    fn check(&self, response: RpcResponse, url: &str) -> Result<RpcResponse, AurError> {
        let version = response.version();
        if version != RPC_VERSION {
            return Err(AurError::Version {
                url: url.to_string(),
                version,
            });
        }
        if let RpcResponse::Error { error, .. } = response {
            return Err(AurError::Rpc {
                url: url.to_string(),
                message: error,
            });
        }
        Ok(response)
    }

    fn decode(
        &self,
        response: reqwest::blocking::Response,
        url: &str,
    ) -> Result<RpcResponse, AurError> {
        let status = response.status();
        if !status.is_success() {
            return Err(AurError::Http {
                status,
                url: url.to_string(),
            });
        }
        let payload: RpcResponse = response.json().map_err(|e| AurError::Transport {
            url: url.to_string(),
            source: e,
        })?;
        self.check(payload, url)
    }
}

impl AurRpc for AurClient {
    fn search(&self, by: SearchField, query: &str) -> Result<Vec<SearchRecord>, AurError> {
        let url = format!("{}/rpc/v5/search/{}?by={}", self.base_url, query, by.as_str());
        debug!("AUR search: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AurError::Transport {
                url: url.clone(),
                source: e,
            })?;

        match self.decode(response, &url)? {
            RpcResponse::Search {
                resultcount,
                results,
                ..
            } => {
                debug!("AUR search returned {} results", resultcount);
                Ok(results)
            }
            _ => Err(AurError::UnexpectedResponse { url }),
        }
    }

    fn info(&self, names: &[String]) -> Result<Vec<InfoRecord>, AurError> {
        let url = format!("{}/rpc/v5/info", self.base_url);
        debug!("AUR info: {} names", names.len());

        let form: Vec<(&str, &str)> = names.iter().map(|n| ("arg[]", n.as_str())).collect();
        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .map_err(|e| AurError::Transport {
                url: url.clone(),
                source: e,
            })?;

        match self.decode(response, &url)? {
            RpcResponse::Multiinfo {
                resultcount,
                results,
                ..
            } => {
                debug!("AUR info returned {} results", resultcount);
                Ok(results)
            }
            _ => Err(AurError::UnexpectedResponse { url }),
        }
    }
}

/// Package source backed by the remote registry.
pub struct AurProvider<R = AurClient> {
    rpc: R,
    index: PackageIndex,
}

impl AurProvider<AurClient> {
    /// Create a provider against the registry endpoint in `config`.
    pub fn new(config: &crate::config::Config) -> Result<Self, AurError> {
        Ok(Self::with_rpc(AurClient::with_base_url(&config.aur_url)?))
    }
}

impl<R: AurRpc> AurProvider<R> {
    /// Create a provider over any remote-query implementation.
    pub fn with_rpc(rpc: R) -> Self {
        Self {
            rpc,
            index: PackageIndex::new("aur"),
        }
    }

    pub fn index(&self) -> &PackageIndex {
        &self.index
    }

    /// Resolve the requested display names against the registry.
    ///
    /// Materializes every record the registry returns into the index and
    /// returns the subset of names that matched nothing, neither by display
    /// name nor by provided virtual name. A failure in the virtual phase
    /// does not roll back records materialized in the direct phase.
    pub fn resolve(&mut self, pkgnames: &BTreeSet<String>) -> Result<BTreeSet<String>, AurError> {
        // phase 1: direct lookup by display name
        let direct_targets: Vec<String> = pkgnames
            .iter()
            .filter(|name| !self.index.has_name(name))
            .cloned()
            .collect();
        for record in self.bulk_info(&direct_targets)? {
            self.index.materialize(&record.to_record());
        }
        let direct_missing: Vec<String> = direct_targets
            .into_iter()
            .filter(|name| !self.index.has_name(name))
            .collect();

        // phase 2: lookup by provided virtual name
        let virtual_targets: Vec<String> = direct_missing
            .into_iter()
            .filter(|name| !self.index.has_provider(name))
            .collect();
        let mut hits: BTreeSet<String> = BTreeSet::new();
        for name in &virtual_targets {
            for record in self.rpc.search(SearchField::Provides, name)? {
                self.index.materialize(&record.to_record());
                hits.insert(record.name.clone());
            }
        }
        // search results are abbreviated; fetch complete records so the
        // provides lists become known and indexed
        let hits: Vec<String> = hits.into_iter().collect();
        for record in self.bulk_info(&hits)? {
            self.index.materialize(&record.to_record());
        }

        let unresolved: BTreeSet<String> = virtual_targets
            .into_iter()
            .filter(|name| !self.index.has_provider(name))
            .collect();
        if unresolved.is_empty() {
            info!("resolved all {} requested names", pkgnames.len());
        } else {
            warn!("{} names unresolved: {:?}", unresolved.len(), unresolved);
        }
        Ok(unresolved)
    }

    /// Bulk info lookup, skipping the call entirely for an empty batch.
    fn bulk_info(&self, names: &[String]) -> Result<Vec<InfoRecord>, AurError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        self.rpc.info(names)
    }
}

impl<R: AurRpc> PackageProvider for AurProvider<R> {
    fn id(&self) -> &'static str {
        "aur"
    }

    fn index(&self) -> &PackageIndex {
        &self.index
    }

    fn resolve(&mut self, pkgnames: &BTreeSet<String>) -> ForgeResult<BTreeSet<String>> {
        Ok(AurProvider::resolve(self, pkgnames)?)
    }
}
