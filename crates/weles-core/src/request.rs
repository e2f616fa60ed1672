//! Outbound request assembly.
//!
//! A command collects its scalar arguments into [`Metadata`], resolves its
//! polymorphic inputs into [`ResolvedPayload`]s, and hands both to
//! [`RequestBuilder`]. The resulting [`OutboundRequest`] holds plain fields,
//! file parts, and the temporary artifacts backing those file parts; the
//! artifacts are removed when the request is dropped.

use log::debug;
use std::path::PathBuf;

use crate::artifact::TemporaryArtifact;
use crate::payload::{PayloadSource, ResolvedPayload};

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Value of a plain form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Sent as the same field name repeated once per item.
    List(Vec<String>),
}

impl FieldValue {
    /// Flatten into `(value, ...)` strings in wire order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(s) => vec![s.as_str()],
            FieldValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

impl From<bool> for FieldValue {
    fn from(flag: bool) -> Self {
        FieldValue::Text(if flag { "1" } else { "0" }.to_string())
    }
}

impl From<usize> for FieldValue {
    fn from(n: usize) -> Self {
        FieldValue::Text(n.to_string())
    }
}

/// Ordered field name → value mapping. Inserting an existing name replaces
/// the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    fields: Vec<(String, FieldValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Insert only when a value is present. Absent optional fields are left
    /// out of the body entirely.
    pub fn insert_opt<V: Into<FieldValue>>(&mut self, name: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(name, value);
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Convenience accessor for single-valued text fields.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Form pairs in wire order; list values expand to repeated pairs.
    pub fn form_pairs(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .flat_map(|(name, value)| {
                value
                    .values()
                    .into_iter()
                    .map(move |v| (name.as_str(), v))
            })
            .collect()
    }
}

/// How a reference payload is announced to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceStyle {
    /// `flag=1` plus `value=<id>` for references; `flag=0` plus a file part
    /// otherwise. Used by predict and audit (`is_hash` / `hash`).
    Flagged {
        flag: &'static str,
        value: &'static str,
    },
    /// `field=<id>` for references; `field=0` plus a file part otherwise.
    /// Used by model upload (`train_dataset_hash`).
    Inline { field: &'static str },
    /// References are not accepted; only file parts are emitted.
    FileOnly,
}

impl ReferenceStyle {
    /// The `is_hash` / `hash` pair.
    pub const HASH: ReferenceStyle = ReferenceStyle::Flagged {
        flag: "is_hash",
        value: "hash",
    };
}

/// A file streamed as one multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub path: PathBuf,
}

/// A fully assembled request, ready for a [`crate::transport::Transport`].
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    /// Path relative to the server base URL, without a leading slash.
    pub path: String,
    pub fields: Metadata,
    pub files: Vec<FilePart>,
    artifacts: Vec<TemporaryArtifact>,
}

impl OutboundRequest {
    pub fn is_multipart(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn file(&self, field: &str) -> Option<&FilePart> {
        self.files.iter().find(|f| f.field == field)
    }

    /// Temporary artifacts that will be removed when this request drops.
    pub fn artifacts(&self) -> &[TemporaryArtifact] {
        &self.artifacts
    }
}

/// Merges metadata and resolved payloads into an [`OutboundRequest`].
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    fields: Metadata,
    files: Vec<FilePart>,
    artifacts: Vec<TemporaryArtifact>,
}

impl RequestBuilder {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into().trim_start_matches('/').to_string(),
            fields: Metadata::new(),
            files: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Merge a metadata bundle; later values win on name clashes.
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        for (name, value) in metadata.fields {
            self.fields.insert(name, value);
        }
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name, value);
        self
    }

    /// Add a resolved payload. File payloads become a part named after the
    /// payload's role; references are written according to `style`.
    pub fn payload(mut self, payload: ResolvedPayload, style: ReferenceStyle) -> Self {
        let (role, source, cleanup) = payload.into_parts();

        match source {
            PayloadSource::Reference(id) => match style {
                ReferenceStyle::Flagged { flag, value } => {
                    self.fields.insert(flag, true);
                    self.fields.insert(value, id);
                }
                ReferenceStyle::Inline { field } => {
                    self.fields.insert(field, id);
                }
                ReferenceStyle::FileOnly => {
                    // Callers validate before resolving; keep the id visible
                    // under the role's name rather than dropping it.
                    self.fields.insert(role.field_name(), id);
                }
            },
            PayloadSource::File { path, file_name } => {
                match style {
                    ReferenceStyle::Flagged { flag, .. } => self.fields.insert(flag, false),
                    ReferenceStyle::Inline { field } => self.fields.insert(field, false),
                    ReferenceStyle::FileOnly => {}
                }
                self.files.push(FilePart {
                    field: role.field_name().to_string(),
                    file_name,
                    path,
                });
            }
        }

        if let Some(artifact) = cleanup {
            self.artifacts.push(artifact);
        }
        self
    }

    pub fn build(self) -> OutboundRequest {
        debug!(
            "Built {} /{} with {} fields, {} files",
            self.method.as_str(),
            self.path,
            self.fields.len(),
            self.files.len()
        );
        OutboundRequest {
            method: self.method,
            path: self.path,
            fields: self.fields,
            files: self.files,
            artifacts: self.artifacts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactManager;
    use crate::payload::{Input, PayloadResolver, Role};
    use crate::table::Table;
    use tempfile::TempDir;

    #[test]
    fn test_metadata_replaces_in_place() {
        let mut meta = Metadata::new()
            .with("a", "1")
            .with("b", "2");
        meta.insert("a", "3");
        assert_eq!(meta.form_pairs(), vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_list_values_repeat() {
        let meta = Metadata::new().with("tags", vec!["x".to_string(), "y".to_string()]);
        assert_eq!(meta.form_pairs(), vec![("tags", "x"), ("tags", "y")]);
    }

    #[test]
    fn test_insert_opt_skips_none() {
        let mut meta = Metadata::new();
        meta.insert_opt::<String>("owner", None);
        meta.insert_opt("regex", Some("^lr_"));
        assert!(meta.get("owner").is_none());
        assert_eq!(meta.text("regex"), Some("^lr_"));
    }

    #[test]
    fn test_flagged_reference() {
        let dir = TempDir::new().unwrap();
        let resolver = PayloadResolver::new(ArtifactManager::new(dir.path()));
        let payload = resolver
            .resolve_table(Input::reference("abc"), Role::Dataset)
            .unwrap();

        let request = RequestBuilder::get("/models/m1/predict/exact")
            .payload(payload, ReferenceStyle::HASH)
            .build();
        assert_eq!(request.path, "models/m1/predict/exact");
        assert_eq!(request.fields.text("is_hash"), Some("1"));
        assert_eq!(request.fields.text("hash"), Some("abc"));
        assert!(!request.is_multipart());
    }

    #[test]
    fn test_inline_reference_and_file() {
        let dir = TempDir::new().unwrap();
        let resolver = PayloadResolver::new(ArtifactManager::new(dir.path()));
        let table = Table::from_rows(vec![vec![1.5, 2.5]]).unwrap();

        let by_ref = resolver
            .resolve_table(Input::reference("h1"), Role::TrainDataset)
            .unwrap();
        let request = RequestBuilder::post("models/post")
            .payload(
                by_ref,
                ReferenceStyle::Inline {
                    field: "train_dataset_hash",
                },
            )
            .build();
        assert_eq!(request.fields.text("train_dataset_hash"), Some("h1"));

        let by_value = resolver
            .resolve_table(Input::Object(table), Role::TrainDataset)
            .unwrap();
        let request = RequestBuilder::post("models/post")
            .payload(
                by_value,
                ReferenceStyle::Inline {
                    field: "train_dataset_hash",
                },
            )
            .build();
        assert_eq!(request.fields.text("train_dataset_hash"), Some("0"));
        let part = request.file("train_dataset").unwrap();
        assert!(part.path.exists());
        assert_eq!(request.artifacts().len(), 1);

        drop(request);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
