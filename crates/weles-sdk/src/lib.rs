//! Weles SDK - client for the weles model governance base.
//!
//! Upload datasets and models, run hosted models, search the registry and
//! audit models against new data.
//!
//! ## Modules
//! - [`client`] - [`RegistryClient`] and its transport
//! - [`config`] - [`ClientConfig`] and environment overrides
//! - [`credentials`] - [`Credentials`] and where they come from
//! - [`datasets`], [`models`], [`users`] - the commands

pub mod client;
pub mod config;
pub mod credentials;
pub mod datasets;
pub mod models;
pub mod users;

pub use client::{RegistryClient, DATASET_ID_LEN};
pub use config::{ClientConfig, PredictionType, DEFAULT_BASE_URL};
pub use credentials::{CredentialSource, Credentials, EnvCredentials, StaticCredentials};
pub use datasets::{DatasetInfo, DEFAULT_HEAD_ROWS};
pub use models::{
    is_valid_model_name, AuditRequest, ModelInfo, ModelUpload, PredictOptions, UploadOutcome,
    NAME_REJECTED_MESSAGE,
};

pub use weles_core::{
    Cell, EnvironmentInfo, HttpResponse, Input, RangeFilter, SearchQuery, Table, TagMatch,
    Transport, UreqTransport, Version, WelesError, WelesResult,
};
