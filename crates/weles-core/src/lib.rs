//! Weles Core - payload resolution, request assembly and transport for the
//! weles model registry client.
//!
//! ## Module Organization
//!
//! ### Inputs
//! - [`payload`] - Polymorphic inputs (reference, path, object) and the resolver
//! - [`artifact`] - Temporary files written for in-memory inputs
//! - [`table`] - Rectangular tables and their CSV/JSON encodings
//!
//! ### Requests
//! - [`request`] - Metadata, reference styles and the request builder
//! - [`multipart`] - `multipart/form-data` encoding
//! - [`transport`] - The `Transport` seam and the default HTTP implementation
//!
//! ### Descriptors
//! - [`search`] - Range filters and search queries
//! - [`environment`] - Host descriptors sent with model uploads

pub mod artifact;
pub mod environment;
pub mod error;
pub mod multipart;
pub mod payload;
pub mod request;
pub mod search;
pub mod table;
pub mod transport;

pub use artifact::{ArtifactManager, TemporaryArtifact};
pub use environment::EnvironmentInfo;
pub use error::{WelesError, WelesResult};
pub use payload::{decode_model, resolve_description, Input, PayloadResolver, PayloadSource, ResolvedPayload, Role};
pub use request::{FieldValue, Metadata, Method, OutboundRequest, ReferenceStyle, RequestBuilder};
pub use search::{RangeFilter, SearchQuery, TagMatch, Version};
pub use table::{Cell, Table};
pub use transport::{HttpResponse, Transport, UreqTransport};
