//! Polymorphic inputs and the resolver that turns them into request payloads.
//!
//! Every dataset, model or requirements argument accepted by the client can be
//! given in one of three shapes:
//!
//! | Shape | Example | Sent as |
//! |-------|---------|---------|
//! | [`Input::Reference`] | `"3f9a…c1"` | plain field, no file |
//! | [`Input::Path`] | `"./data/train.csv"` | file part streamed from that path |
//! | [`Input::Object`] | a [`Table`] or any `Serialize` model | file part streamed from a temporary artifact |
//!
//! Strings coming from users (CLI arguments, config files) are classified once
//! with [`Input::infer`]; commands never look at string contents themselves.
//!
//! # Example
//!
//! ```rust,no_run
//! use weles_core::artifact::ArtifactManager;
//! use weles_core::payload::{Input, PayloadResolver, Role};
//! use weles_core::table::Table;
//!
//! let resolver = PayloadResolver::new(ArtifactManager::new("."));
//! let table = Table::from_rows(vec![vec![1, 2], vec![3, 4]])?;
//!
//! let payload = resolver.resolve_table(Input::Object(table), Role::Dataset)?;
//! assert!(payload.is_file());
//! # Ok::<(), weles_core::WelesError>(())
//! ```

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::artifact::{ArtifactManager, TemporaryArtifact};
use crate::error::{WelesError, WelesResult};
use crate::table::Table;

/// What a resolved payload is for. Decides the wire field name of file parts
/// and the naming of temporary artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A standalone dataset (dataset upload, prediction input, audit data).
    Dataset,
    /// The dataset a model was trained on.
    TrainDataset,
    /// A held-out dataset uploaded with a model.
    TestDataset,
    /// A trained model.
    Model,
    /// A requirements file describing the model's environment.
    Requirements,
}

impl Role {
    /// Multipart field name used when this payload is a file.
    pub fn field_name(&self) -> &'static str {
        match self {
            Role::Dataset => "data",
            Role::TrainDataset => "train_dataset",
            Role::TestDataset => "test_dataset",
            Role::Model => "model",
            Role::Requirements => "requirements",
        }
    }

    pub(crate) fn artifact_prefix(&self) -> &'static str {
        match self {
            Role::Dataset => ".tmp_data_",
            Role::TrainDataset => ".tmp_train_data_",
            Role::TestDataset => ".tmp_test_data_",
            Role::Model => ".tmp_model_",
            Role::Requirements => ".tmp_requirements_",
        }
    }

    pub(crate) fn artifact_extension(&self) -> &'static str {
        match self {
            Role::Dataset | Role::TrainDataset | Role::TestDataset => "csv",
            Role::Model => "bin",
            Role::Requirements => "txt",
        }
    }

    /// True for roles whose in-memory form is a [`Table`].
    pub fn is_tabular(&self) -> bool {
        matches!(self, Role::Dataset | Role::TrainDataset | Role::TestDataset)
    }
}

/// A dataset, model or file given by reference, by path or by value.
#[derive(Debug, Clone, PartialEq)]
pub enum Input<T> {
    /// Content identifier of something already stored on the server.
    Reference(String),
    /// A local file the caller owns.
    Path(PathBuf),
    /// An in-memory value that has to be serialized before upload.
    Object(T),
}

impl<T> Input<T> {
    /// Classify a user-supplied string.
    ///
    /// A string containing a path separator is a path; anything else is a
    /// reference hash.
    pub fn infer(value: &str) -> Self {
        if has_path_separator(value) {
            Input::Path(PathBuf::from(value))
        } else {
            Input::Reference(value.to_string())
        }
    }

    pub fn reference(id: impl Into<String>) -> Self {
        Input::Reference(id.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Input::Path(path.into())
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Input::Reference(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Input::Object(_))
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Input::Reference(_) => "reference",
            Input::Path(_) => "path",
            Input::Object(_) => "object",
        }
    }
}

impl From<Table> for Input<Table> {
    fn from(table: Table) -> Self {
        Input::Object(table)
    }
}

/// Where the bytes of a resolved payload come from.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadSource {
    /// Sent as a plain field; the server already holds the content.
    Reference(String),
    /// Streamed as a multipart file part.
    File { path: PathBuf, file_name: String },
}

/// The outcome of resolving one polymorphic input.
#[derive(Debug)]
pub struct ResolvedPayload {
    role: Role,
    source: PayloadSource,
    cleanup: Option<TemporaryArtifact>,
}

impl ResolvedPayload {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn source(&self) -> &PayloadSource {
        &self.source
    }

    pub fn is_file(&self) -> bool {
        matches!(self.source, PayloadSource::File { .. })
    }

    pub fn reference(&self) -> Option<&str> {
        match &self.source {
            PayloadSource::Reference(id) => Some(id),
            PayloadSource::File { .. } => None,
        }
    }

    /// The temporary artifact backing this payload, if the resolver created one.
    pub fn cleanup(&self) -> Option<&TemporaryArtifact> {
        self.cleanup.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Role, PayloadSource, Option<TemporaryArtifact>) {
        (self.role, self.source, self.cleanup)
    }
}

/// Decides, per input, whether to send a reference, stream a file or write a
/// temporary artifact first.
#[derive(Debug, Clone, Default)]
pub struct PayloadResolver {
    artifacts: ArtifactManager,
}

impl PayloadResolver {
    pub fn new(artifacts: ArtifactManager) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &ArtifactManager {
        &self.artifacts
    }

    /// Resolve a tabular input. In-memory tables become delimited text.
    pub fn resolve_table(&self, input: Input<Table>, role: Role) -> WelesResult<ResolvedPayload> {
        self.resolve_with(input, role, |table| table.to_csv())
    }

    /// Resolve a model. In-memory models are bincode-encoded.
    pub fn resolve_model<M: Serialize>(
        &self,
        input: Input<M>,
        role: Role,
    ) -> WelesResult<ResolvedPayload> {
        self.resolve_with(input, role, |model| {
            bincode::serialize(model).map_err(WelesError::from)
        })
    }

    /// Resolve a text document (requirements). In-memory text is written as-is.
    pub fn resolve_text(&self, input: Input<String>, role: Role) -> WelesResult<ResolvedPayload> {
        self.resolve_with(input, role, |text| Ok(text.as_bytes().to_vec()))
    }

    /// The single decision procedure behind every `resolve_*` method.
    fn resolve_with<T, F>(&self, input: Input<T>, role: Role, encode: F) -> WelesResult<ResolvedPayload>
    where
        F: FnOnce(&T) -> WelesResult<Vec<u8>>,
    {
        debug!("Resolving {} input for '{}'", input.kind(), role.field_name());

        match input {
            Input::Reference(id) => {
                if id.trim().is_empty() {
                    return Err(WelesError::invalid(format!(
                        "{} reference must not be empty",
                        role.field_name()
                    )));
                }
                Ok(ResolvedPayload {
                    role,
                    source: PayloadSource::Reference(id),
                    cleanup: None,
                })
            }
            Input::Path(path) => {
                let source = file_source(&path)?;
                Ok(ResolvedPayload {
                    role,
                    source,
                    cleanup: None,
                })
            }
            Input::Object(value) => {
                let bytes = encode(&value)?;
                let artifact = self.artifacts.create(&bytes, role)?;
                let source = file_source(artifact.path())?;
                Ok(ResolvedPayload {
                    role,
                    source,
                    cleanup: Some(artifact),
                })
            }
        }
    }
}

/// Decode a model previously encoded by [`PayloadResolver::resolve_model`].
pub fn decode_model<M: DeserializeOwned>(bytes: &[u8]) -> WelesResult<M> {
    bincode::deserialize(bytes).map_err(WelesError::from)
}

/// Resolve a description argument.
///
/// A description containing a path separator is taken as the path of a text
/// file and replaced by that file's contents. Any other string is used as-is.
///
/// NOTE: a description that merely contains a `/` (a URL, "train/test split")
/// fails with `NotFound`.
pub fn resolve_description(description: &str) -> WelesResult<String> {
    if !has_path_separator(description) {
        return Ok(description.to_string());
    }
    let path = Path::new(description);
    if !path.is_file() {
        return Err(WelesError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| {
        WelesError::Serialization(format!(
            "description file {} is not valid UTF-8: {}",
            path.display(),
            e.utf8_error()
        ))
    })
}

fn has_path_separator(value: &str) -> bool {
    value.contains('/') || value.contains(MAIN_SEPARATOR)
}

fn file_source(path: &Path) -> WelesResult<PayloadSource> {
    if !path.is_file() {
        return Err(WelesError::NotFound(path.to_path_buf()));
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(PayloadSource::File {
        path: path.to_path_buf(),
        file_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use tempfile::TempDir;

    const HASH: &str = "8f434346648f6b96df89dda901c5176b10a6d83961dd3c1ac88b59b2dc327aa4";

    fn resolver(dir: &TempDir) -> PayloadResolver {
        PayloadResolver::new(ArtifactManager::new(dir.path()))
    }

    fn entries(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[derive(Serialize)]
    struct Stump {
        feature: usize,
        threshold: f64,
    }

    #[test]
    fn test_infer_classification() {
        assert_eq!(Input::<Table>::infer(HASH), Input::Reference(HASH.to_string()));
        assert_eq!(
            Input::<Table>::infer("./train.csv"),
            Input::Path(PathBuf::from("./train.csv"))
        );
        assert_eq!(
            Input::<Table>::infer("data/train.csv"),
            Input::Path(PathBuf::from("data/train.csv"))
        );
        // No separator: a bare file name is still a reference.
        assert!(Input::<Table>::infer("train.csv").is_reference());
    }

    #[test]
    fn test_reference_never_creates_artifact() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir);

        for role in [Role::Dataset, Role::TrainDataset, Role::Model] {
            let payload = resolver
                .resolve_table(Input::reference(HASH), role)
                .unwrap();
            assert_eq!(payload.reference(), Some(HASH));
            assert!(payload.cleanup().is_none());
        }
        let payload = resolver
            .resolve_model::<Stump>(Input::reference("abc"), Role::Model)
            .unwrap();
        assert!(payload.cleanup().is_none());
        assert_eq!(entries(&dir), 0);
    }

    #[test]
    fn test_empty_reference_rejected() {
        let dir = TempDir::new().unwrap();
        let err = resolver(&dir)
            .resolve_table(Input::reference("  "), Role::Dataset)
            .unwrap_err();
        assert!(matches!(err, WelesError::Validation(_)));
    }

    #[test]
    fn test_existing_path_streams_that_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let payload = resolver(&dir)
            .resolve_table(Input::Path(path.clone()), Role::TrainDataset)
            .unwrap();
        assert_eq!(
            payload.source(),
            &PayloadSource::File {
                path: path.clone(),
                file_name: "train.csv".to_string()
            }
        );
        assert!(payload.cleanup().is_none());
        drop(payload);
        assert!(path.exists(), "caller-owned files must survive");
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.csv");
        let err = resolver(&dir)
            .resolve_table(Input::Path(missing.clone()), Role::Dataset)
            .unwrap_err();
        match err {
            WelesError::NotFound(p) => assert_eq!(p, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_table_object_becomes_csv_artifact() {
        let dir = TempDir::new().unwrap();
        let table = Table::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();

        let payload = resolver(&dir)
            .resolve_table(Input::Object(table.clone()), Role::Dataset)
            .unwrap();
        let artifact = payload.cleanup().expect("artifact expected");
        let written = std::fs::read(artifact.path()).unwrap();
        assert_eq!(Table::from_csv(&written).unwrap(), table);
        assert_eq!(entries(&dir), 1);

        drop(payload);
        assert_eq!(entries(&dir), 0);
    }

    #[test]
    fn test_model_object_is_bincode() {
        let dir = TempDir::new().unwrap();
        let stump = Stump {
            feature: 3,
            threshold: 0.5,
        };

        let payload = resolver(&dir)
            .resolve_model(Input::Object(stump), Role::Model)
            .unwrap();
        let artifact = payload.cleanup().unwrap();
        assert!(artifact.path().to_string_lossy().ends_with(".bin"));
        let bytes = std::fs::read(artifact.path()).unwrap();
        let decoded: (u64, f64) = decode_model(&bytes).unwrap();
        assert_eq!(decoded, (3, 0.5));
        assert!(decode_model::<(u64, f64)>(&bytes[..4]).is_err());
    }

    #[test]
    fn test_unserializable_model() {
        struct Opaque;
        impl Serialize for Opaque {
            fn serialize<S: serde::Serializer>(&self, _s: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("weights live on the GPU"))
            }
        }

        let dir = TempDir::new().unwrap();
        let err = resolver(&dir)
            .resolve_model(Input::Object(Opaque), Role::Model)
            .unwrap_err();
        assert!(matches!(err, WelesError::Serialization(_)));
        assert_eq!(entries(&dir), 0);
    }

    #[test]
    fn test_requirements_text() {
        let dir = TempDir::new().unwrap();
        let payload = resolver(&dir)
            .resolve_text(Input::Object("serde==1.0\n".to_string()), Role::Requirements)
            .unwrap();
        let artifact = payload.cleanup().unwrap();
        assert_eq!(std::fs::read_to_string(artifact.path()).unwrap(), "serde==1.0\n");
    }

    #[test]
    fn test_description_plain_and_file() {
        assert_eq!(resolve_description("linear model").unwrap(), "linear model");

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desc.md");
        std::fs::write(&path, "Gradient boosting on credit data").unwrap();
        assert_eq!(
            resolve_description(path.to_str().unwrap()).unwrap(),
            "Gradient boosting on credit data"
        );

        let missing = dir.path().join("nope.md");
        assert!(matches!(
            resolve_description(missing.to_str().unwrap()),
            Err(WelesError::NotFound(_))
        ));
    }

    #[test]
    fn test_description_file_must_be_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desc.bin");
        std::fs::write(&path, [0x66, 0x6f, 0xff, 0xfe]).unwrap();
        assert!(matches!(
            resolve_description(path.to_str().unwrap()),
            Err(WelesError::Serialization(_))
        ));
    }
}
