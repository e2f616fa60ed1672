//! The registry client.
//!
//! [`RegistryClient`] owns the configuration, the payload resolver and a
//! [`Transport`]. Its commands live in [`crate::datasets`], [`crate::models`]
//! and [`crate::users`]; each one validates its arguments, resolves inputs,
//! builds one request, dispatches it and decodes the answer.
//!
//! # Example
//!
//! ```rust,ignore
//! use weles_sdk::{ClientConfig, Credentials, Input, RegistryClient, Table};
//!
//! let client = RegistryClient::new(ClientConfig::from_env()?)?;
//! let data = Table::from_rows(vec![vec![1, 2], vec![3, 4]])?;
//! let hash = client.upload_dataset(
//!     Input::Object(data),
//!     "d1",
//!     "two rows",
//!     &Credentials::new("alice", "secret"),
//! )?;
//! ```

use log::debug;

use weles_core::{
    ArtifactManager, EnvironmentInfo, HttpResponse, OutboundRequest, PayloadResolver, Transport,
    UreqTransport, WelesError, WelesResult,
};

use crate::config::ClientConfig;

/// Length of a dataset hash.
pub const DATASET_ID_LEN: usize = 64;

/// Client for a weles server.
pub struct RegistryClient<T: Transport = UreqTransport> {
    config: ClientConfig,
    resolver: PayloadResolver,
    transport: T,
    environment: Option<EnvironmentInfo>,
}

impl RegistryClient<UreqTransport> {
    /// Create a client talking HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> WelesResult<Self> {
        let transport =
            UreqTransport::new(&config.base_url, config.timeout(), config.connect_timeout())?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> WelesResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: Transport> RegistryClient<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let resolver = PayloadResolver::new(ArtifactManager::new(config.work_dir.clone()));
        debug!(
            "RegistryClient created for {}, work_dir={}",
            config.base_url,
            config.work_dir.display()
        );
        Self {
            config,
            resolver,
            transport,
            environment: None,
        }
    }

    /// Report fixed environment descriptors on model upload instead of
    /// detecting them.
    pub fn with_environment(mut self, environment: EnvironmentInfo) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn resolver(&self) -> &PayloadResolver {
        &self.resolver
    }

    pub(crate) fn environment(&self) -> EnvironmentInfo {
        self.environment
            .clone()
            .unwrap_or_else(EnvironmentInfo::detect)
    }

    /// Execute `request` and release its artifacts, whatever the outcome.
    pub(crate) fn dispatch(&self, request: OutboundRequest) -> WelesResult<HttpResponse> {
        let result = self.transport.execute(&request);
        drop(request);
        result
    }
}

/// Reject names that cannot be used as a URL path segment.
pub(crate) fn validate_segment(kind: &str, value: &str) -> WelesResult<()> {
    if value.trim().is_empty() {
        return Err(WelesError::invalid(format!("{} must not be empty", kind)));
    }
    if value.contains(['/', '?', '#']) {
        return Err(WelesError::invalid(format!(
            "{} must not contain '/', '?' or '#': '{}'",
            kind, value
        )));
    }
    Ok(())
}

pub(crate) fn validate_dataset_id(id: &str) -> WelesResult<()> {
    if id.chars().count() != DATASET_ID_LEN {
        return Err(WelesError::invalid(format!(
            "dataset_id must be {} characters long, got {}",
            DATASET_ID_LEN,
            id.chars().count()
        )));
    }
    validate_segment("dataset_id", id)
}

pub(crate) fn require_non_empty(kind: &str, value: &str) -> WelesResult<()> {
    if value.trim().is_empty() {
        return Err(WelesError::invalid(format!("{} must not be empty", kind)));
    }
    Ok(())
}
