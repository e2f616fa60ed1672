//! Model commands: upload, predict, info, requirements, search and audit.

use log::{debug, info};
use serde::Serialize;
use serde_json::{Map, Value};

use weles_core::{
    resolve_description, Cell, Input, Metadata, ReferenceStyle, RequestBuilder, Role,
    SearchQuery, Table, Transport, WelesError, WelesResult,
};

use crate::client::{require_non_empty, validate_segment, RegistryClient};
use crate::config::PredictionType;
use crate::credentials::Credentials;

/// Message returned when a model name fails the local check.
pub const NAME_REJECTED_MESSAGE: &str = "Your model name contains non alphanumerical signs.";

/// Result of a model upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The request was sent; carries the server's message.
    Submitted(String),
    /// The model name was rejected locally and nothing was sent.
    NameRejected(String),
}

impl UploadOutcome {
    pub fn message(&self) -> &str {
        match self {
            UploadOutcome::Submitted(msg) | UploadOutcome::NameRejected(msg) => msg,
        }
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self, UploadOutcome::Submitted(_))
    }
}

/// Model names may only contain ASCII letters, digits and underscores.
pub fn is_valid_model_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Everything sent with a model upload.
#[derive(Debug, Clone)]
pub struct ModelUpload<M> {
    pub model: Input<M>,
    pub name: String,
    /// Inline text, or a path to a text file holding the description.
    pub description: String,
    pub target: String,
    pub tags: Vec<String>,
    pub train_dataset: Input<Table>,
    pub train_dataset_name: String,
    /// Inline text, or a path to a text file holding the description.
    pub dataset_description: String,
    pub test_dataset: Option<Input<Table>>,
    pub requirements: Input<String>,
    pub credentials: Credentials,
}

impl<M> ModelUpload<M> {
    pub fn new(
        model: Input<M>,
        name: impl Into<String>,
        target: impl Into<String>,
        train_dataset: Input<Table>,
        requirements: Input<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            model,
            name: name.into(),
            description: String::new(),
            target: target.into(),
            tags: Vec::new(),
            train_dataset,
            train_dataset_name: String::new(),
            dataset_description: String::new(),
            test_dataset: None,
            requirements,
            credentials,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_train_dataset_name(mut self, name: impl Into<String>) -> Self {
        self.train_dataset_name = name.into();
        self
    }

    pub fn with_dataset_description(mut self, description: impl Into<String>) -> Self {
        self.dataset_description = description.into();
        self
    }

    pub fn with_test_dataset(mut self, test_dataset: Input<Table>) -> Self {
        self.test_dataset = Some(test_dataset);
        self
    }
}

/// Per-call prediction settings. Unset values fall back to the client
/// configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictOptions {
    pub prediction_type: Option<PredictionType>,
    pub prepare_columns: Option<bool>,
}

impl PredictOptions {
    pub fn prediction_type(mut self, prediction_type: PredictionType) -> Self {
        self.prediction_type = Some(prediction_type);
        self
    }

    pub fn prepare_columns(mut self, prepare: bool) -> Self {
        self.prepare_columns = Some(prepare);
        self
    }
}

/// Model metadata as stored by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub model: Map<String, Value>,
    /// Metadata of the training dataset.
    pub data: Map<String, Value>,
    /// One row per training column (`id`, `name`, ...).
    pub columns: Table,
    /// One row per audit run against the model.
    pub audits: Table,
    /// Any other top-level fields.
    pub extra: Map<String, Value>,
}

impl ModelInfo {
    pub(crate) fn from_json(value: Value) -> WelesResult<Self> {
        let mut fields = match value {
            Value::Object(map) => map,
            _ => {
                return Err(WelesError::Parse(
                    "model info must be a JSON object".to_string(),
                ))
            }
        };
        let model = take_object(&mut fields, "model")?;
        let data = take_object(&mut fields, "data")?;
        let columns = take_table(&mut fields, "columns")?;
        let audits = take_table(&mut fields, "audits")?;
        Ok(Self {
            model,
            data,
            columns,
            audits,
            extra: fields,
        })
    }

    /// Name of the target column.
    pub fn target(&self) -> Option<&str> {
        self.model.get("target").and_then(Value::as_str)
    }

    /// Feature column names in training order, target excluded.
    pub fn feature_columns(&self) -> WelesResult<Vec<String>> {
        let name_idx = self
            .columns
            .column_index("name")
            .ok_or_else(|| WelesError::Parse("model columns have no 'name' field".to_string()))?;
        let id_idx = self.columns.column_index("id");
        let target = self.target();

        let mut rows: Vec<&Vec<Cell>> = self.columns.rows().iter().collect();
        if let Some(id_idx) = id_idx {
            rows.sort_by(|a, b| {
                let a = a[id_idx].as_f64().unwrap_or(f64::MAX);
                let b = b[id_idx].as_f64().unwrap_or(f64::MAX);
                a.total_cmp(&b)
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| row[name_idx].to_string())
            .filter(|name| Some(name.as_str()) != target)
            .collect())
    }
}

fn take_object(fields: &mut Map<String, Value>, key: &str) -> WelesResult<Map<String, Value>> {
    match fields.remove(key) {
        Some(Value::Object(map)) => Ok(map),
        Some(Value::Null) | None => Ok(Map::new()),
        Some(_) => Err(WelesError::Parse(format!("'{}' must be a JSON object", key))),
    }
}

fn take_table(fields: &mut Map<String, Value>, key: &str) -> WelesResult<Table> {
    match fields.remove(key) {
        Some(Value::Null) | None => Ok(Table::default()),
        Some(value) => Table::from_json(&value),
    }
}

/// An audit of a model against a dataset.
#[derive(Debug, Clone)]
pub struct AuditRequest {
    pub model_name: String,
    /// Name of a measure supported by the server, e.g. `acc` or `mse`.
    pub measure: String,
    pub target: String,
    pub data: Input<Table>,
    /// Name for a newly uploaded audit dataset. Ignored for references.
    pub data_name: Option<String>,
    pub data_desc: Option<String>,
    pub credentials: Credentials,
}

impl AuditRequest {
    pub fn new(
        model_name: impl Into<String>,
        measure: impl Into<String>,
        target: impl Into<String>,
        data: Input<Table>,
        credentials: Credentials,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            measure: measure.into(),
            target: target.into(),
            data,
            data_name: None,
            data_desc: None,
            credentials,
        }
    }

    pub fn with_data_name(mut self, name: impl Into<String>) -> Self {
        self.data_name = Some(name.into());
        self
    }

    pub fn with_data_desc(mut self, desc: impl Into<String>) -> Self {
        self.data_desc = Some(desc.into());
        self
    }
}

impl<T: Transport> RegistryClient<T> {
    /// Upload a model together with its training dataset, optional test
    /// dataset and requirements.
    ///
    /// A model name outside `[A-Za-z0-9_]+` yields
    /// [`UploadOutcome::NameRejected`] without contacting the server.
    pub fn upload_model<M: Serialize>(&self, upload: ModelUpload<M>) -> WelesResult<UploadOutcome> {
        upload.credentials.validate()?;
        require_non_empty("target", &upload.target)?;
        if upload.model.is_reference() {
            return Err(WelesError::invalid(
                "model must be an object or a file path",
            ));
        }
        if upload.requirements.is_reference() {
            return Err(WelesError::invalid(
                "requirements must be text or a file path",
            ));
        }
        if !is_valid_model_name(&upload.name) {
            info!("Model name '{}' rejected locally", upload.name);
            return Ok(UploadOutcome::NameRejected(NAME_REJECTED_MESSAGE.to_string()));
        }

        let model_desc = resolve_description(&upload.description)?;
        let dataset_desc = resolve_description(&upload.dataset_description)?;

        let resolver = self.resolver();
        let model = resolver.resolve_model(upload.model, Role::Model)?;
        let train = resolver.resolve_table(upload.train_dataset, Role::TrainDataset)?;
        let test = upload
            .test_dataset
            .map(|input| resolver.resolve_table(input, Role::TestDataset))
            .transpose()?;
        let requirements = resolver.resolve_text(upload.requirements, Role::Requirements)?;

        let metadata = Metadata::new()
            .with("model_name", upload.name.as_str())
            .with("model_desc", model_desc)
            .with("train_data_name", upload.train_dataset_name)
            .with("dataset_desc", dataset_desc)
            .with("target", upload.target)
            .with("tags", upload.tags)
            .with("is_test_dataset", test.is_some())
            .with("is_sessionInfo", false)
            .with("user_name", upload.credentials.user_name)
            .with("password", upload.credentials.password);

        let mut builder = RequestBuilder::post("models/post")
            .metadata(metadata)
            .metadata(self.environment().to_metadata())
            .payload(model, ReferenceStyle::FileOnly)
            .payload(
                train,
                ReferenceStyle::Inline {
                    field: "train_dataset_hash",
                },
            );
        if let Some(test) = test {
            builder = builder.payload(
                test,
                ReferenceStyle::Inline {
                    field: "test_dataset_hash",
                },
            );
        }
        let request = builder
            .payload(requirements, ReferenceStyle::FileOnly)
            .build();

        let response = self.dispatch(request)?;
        info!("Uploaded model '{}' (status {})", upload.name, response.status);
        Ok(UploadOutcome::Submitted(response.body))
    }

    /// Run a hosted model on `data`.
    ///
    /// When column preparation is on and `data` is an in-memory table, its
    /// columns are renamed to the model's training columns (in training order,
    /// target excluded) before upload. The result is a headerless table.
    pub fn predict(
        &self,
        model_name: &str,
        data: Input<Table>,
        options: PredictOptions,
    ) -> WelesResult<Table> {
        validate_segment("model_name", model_name)?;
        let prediction_type = options
            .prediction_type
            .unwrap_or(self.config().prediction_type);
        let prepare = options
            .prepare_columns
            .unwrap_or(self.config().prepare_columns);

        let data = match data {
            Input::Object(mut table) if prepare => {
                let columns = self.model_info(model_name)?.feature_columns()?;
                debug!("Aligning prediction input to columns {:?}", columns);
                table.set_columns(columns)?;
                Input::Object(table)
            }
            other => other,
        };

        let payload = self.resolver().resolve_table(data, Role::Dataset)?;
        let request = RequestBuilder::get(format!(
            "models/{}/predict/{}",
            model_name,
            prediction_type.as_str()
        ))
        .payload(payload, ReferenceStyle::HASH)
        .build();

        let response = self.dispatch(request)?.error_for_status()?;
        Table::from_csv_headerless(response.body.as_bytes())
    }

    /// Fetch model metadata.
    pub fn model_info(&self, model_name: &str) -> WelesResult<ModelInfo> {
        validate_segment("model_name", model_name)?;
        let request = RequestBuilder::get(format!("models/{}/info", model_name)).build();
        let response = self.dispatch(request)?.error_for_status()?;
        ModelInfo::from_json(response.json()?)
    }

    /// Fetch the package requirements recorded for a model.
    pub fn model_requirements(&self, model_name: &str) -> WelesResult<Value> {
        validate_segment("model_name", model_name)?;
        let request = RequestBuilder::get(format!("models/{}/requirements", model_name)).build();
        let response = self.dispatch(request)?.error_for_status()?;
        response.json()
    }

    /// Names of the models matching `query`.
    pub fn search_models(&self, query: &SearchQuery) -> WelesResult<Vec<String>> {
        let request = RequestBuilder::get("models/search")
            .metadata(query.to_metadata(self.config().tag_match))
            .build();
        let response = self.dispatch(request)?.error_for_status()?;

        let mut body: Map<String, Value> = response.json()?;
        let models = body
            .remove("models")
            .ok_or_else(|| WelesError::Parse("search response has no 'models' field".to_string()))?;
        serde_json::from_value(models)
            .map_err(|e| WelesError::Parse(format!("invalid 'models' list: {}", e)))
    }

    /// Audit a model on a dataset given by hash, path or table.
    pub fn audit_model(&self, audit: AuditRequest) -> WelesResult<Table> {
        validate_segment("model_name", &audit.model_name)?;
        require_non_empty("measure", &audit.measure)?;
        require_non_empty("target", &audit.target)?;
        audit.credentials.validate()?;

        let mut metadata = Metadata::new()
            .with("model_name", audit.model_name.as_str())
            .with("measure", audit.measure.as_str())
            .with("user", audit.credentials.user_name.as_str())
            .with("password", audit.credentials.password.as_str())
            .with("target", audit.target.as_str());
        if !audit.data.is_reference() {
            metadata.insert_opt("data_name", audit.data_name);
            metadata.insert_opt("data_desc", audit.data_desc);
        }

        let payload = self.resolver().resolve_table(audit.data, Role::Dataset)?;
        let request = RequestBuilder::post("models/audit")
            .metadata(metadata)
            .payload(payload, ReferenceStyle::HASH)
            .build();

        let response = self.dispatch(request)?.error_for_status()?;
        info!("Audited model '{}' with '{}'", audit.model_name, audit.measure);
        Table::from_csv_headerless(response.body.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{
        client, entries, FailingTransport, RecordingTransport, HASH,
    };
    use tempfile::TempDir;
    use weles_core::{HttpResponse, Method, TagMatch};

    #[derive(Serialize)]
    struct LinearModel {
        weights: Vec<f64>,
        bias: f64,
    }

    fn creds() -> Credentials {
        Credentials::new("u", "p")
    }

    fn upload(name: &str) -> ModelUpload<LinearModel> {
        ModelUpload::new(
            Input::Object(LinearModel {
                weights: vec![0.5, -1.0],
                bias: 0.1,
            }),
            name,
            "y",
            Input::Object(Table::from_rows(vec![vec![1, 2, 0], vec![3, 4, 1]]).unwrap()),
            Input::Object("serde==1.0\n".to_string()),
            creds(),
        )
        .with_description("a linear model")
        .with_tags(["linear", "toy"])
        .with_train_dataset_name("toy_train")
        .with_dataset_description("toy data")
    }

    const INFO: &str = r#"{
        "model": {"name": "m1", "target": "y"},
        "data": {"name": "toy_train"},
        "columns": [
            {"id": 2, "name": "y"},
            {"id": 1, "name": "b"},
            {"id": 0, "name": "a"}
        ],
        "audits": []
    }"#;

    #[test]
    fn test_name_check() {
        assert!(is_valid_model_name("lr_model_2"));
        assert!(!is_valid_model_name("my model!"));
        assert!(!is_valid_model_name(""));
        assert!(!is_valid_model_name("zażółć"));
    }

    #[test]
    fn test_rejected_name_sends_nothing() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, "ok"));

        let outcome = client.upload_model(upload("my model!")).unwrap();
        assert_eq!(
            outcome,
            UploadOutcome::NameRejected(NAME_REJECTED_MESSAGE.to_string())
        );
        assert!(client.transport().recorded().is_empty());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_upload_model_fields_and_files() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, "model uploaded"));

        let outcome = client.upload_model(upload("lr_model")).unwrap();
        assert_eq!(outcome, UploadOutcome::Submitted("model uploaded".to_string()));

        let request = &client.transport().recorded()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path, "models/post");

        let fields = &request.fields;
        assert_eq!(fields.text("model_name"), Some("lr_model"));
        assert_eq!(fields.text("model_desc"), Some("a linear model"));
        assert_eq!(fields.text("train_data_name"), Some("toy_train"));
        assert_eq!(fields.text("dataset_desc"), Some("toy data"));
        assert_eq!(fields.text("target"), Some("y"));
        assert_eq!(fields.text("train_dataset_hash"), Some("0"));
        assert_eq!(fields.text("is_test_dataset"), Some("0"));
        assert_eq!(fields.text("is_sessionInfo"), Some("0"));
        assert_eq!(fields.text("user_name"), Some("u"));
        assert_eq!(fields.text("password"), Some("p"));
        assert_eq!(fields.text("language"), Some("rust"));
        assert_eq!(fields.text("processor"), Some("x86_64"));
        assert!(fields.get("test_dataset_hash").is_none());

        let tags: Vec<(&str, &str)> = fields
            .form_pairs()
            .into_iter()
            .filter(|(k, _)| *k == "tags")
            .collect();
        assert_eq!(tags, vec![("tags", "linear"), ("tags", "toy")]);

        assert_eq!(request.file("train_dataset"), Some("0,1,2\n1,2,0\n3,4,1\n"));
        assert_eq!(request.file("requirements"), Some("serde==1.0\n"));
        assert!(request.file("model").is_some());
        assert!(request.file("test_dataset").is_none());

        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_upload_model_with_hashes() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, "ok"));

        let mut upload = upload("lr_model").with_test_dataset(Input::reference("t".repeat(64)));
        upload.train_dataset = Input::reference(HASH);
        client.upload_model(upload).unwrap();

        let request = &client.transport().recorded()[0];
        assert_eq!(request.fields.text("train_dataset_hash"), Some(HASH));
        assert_eq!(request.fields.text("is_test_dataset"), Some("1"));
        assert_eq!(
            request.fields.text("test_dataset_hash"),
            Some("t".repeat(64).as_str())
        );
        assert!(request.file("train_dataset").is_none());
        assert!(request.file("test_dataset").is_none());
    }

    #[test]
    fn test_upload_model_test_dataset_file() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, "ok"));

        let upload = upload("lr_model")
            .with_test_dataset(Input::Object(Table::from_rows(vec![vec![5, 6, 1]]).unwrap()));
        client.upload_model(upload).unwrap();

        let request = &client.transport().recorded()[0];
        assert_eq!(request.fields.text("test_dataset_hash"), Some("0"));
        assert_eq!(request.file("test_dataset"), Some("0,1,2\n5,6,1\n"));
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_upload_model_cleans_up_on_failure() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), FailingTransport);

        let result = client.upload_model(upload("lr_model"));
        assert!(matches!(result, Err(WelesError::Transport(_))));
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_upload_model_missing_description_file() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, "ok"));

        let upload = upload("lr_model").with_description("docs/missing.txt");
        assert!(matches!(
            client.upload_model(upload),
            Err(WelesError::NotFound(_))
        ));
        assert!(client.transport().recorded().is_empty());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_predict_by_hash() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, "1\n0\n1\n"));

        let result = client
            .predict("m1", Input::reference(HASH), PredictOptions::default())
            .unwrap();
        assert_eq!(result.n_rows(), 3);
        assert_eq!(result.rows()[0], vec![Cell::Int(1)]);

        let recorded = client.transport().recorded();
        assert_eq!(recorded.len(), 1);
        let request = &recorded[0];
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "models/m1/predict/exact");
        assert_eq!(
            request.fields.form_pairs(),
            vec![("is_hash", "1"), ("hash", HASH)]
        );
        assert!(request.files.is_empty());
    }

    #[test]
    fn test_predict_aligns_columns() {
        let dir = TempDir::new().unwrap();
        let transport = RecordingTransport::new(vec![
            HttpResponse::new(200, INFO),
            HttpResponse::new(200, "0.2,0.8\n"),
        ]);
        let client = client(dir.path(), transport);

        let data = Table::from_rows(vec![vec![1.5, 2.5]]).unwrap();
        let result = client
            .predict(
                "m1",
                Input::Object(data),
                PredictOptions::default().prediction_type(PredictionType::Prob),
            )
            .unwrap();
        assert_eq!(result.n_cols(), 2);

        let recorded = client.transport().recorded();
        assert_eq!(recorded[0].path, "models/m1/info");
        assert_eq!(recorded[1].path, "models/m1/predict/prob");
        assert_eq!(recorded[1].fields.text("is_hash"), Some("0"));
        assert_eq!(recorded[1].file("data"), Some("a,b\n1.5,2.5\n"));
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_predict_without_alignment() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, "1\n"));

        let data = Table::from_rows(vec![vec![1, 2]]).unwrap();
        client
            .predict(
                "m1",
                Input::Object(data),
                PredictOptions::default().prepare_columns(false),
            )
            .unwrap();

        let recorded = client.transport().recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].file("data"), Some("0,1\n1,2\n"));
    }

    #[test]
    fn test_predict_width_mismatch() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, INFO));

        let data = Table::from_rows(vec![vec![1, 2, 3]]).unwrap();
        let result = client.predict("m1", Input::Object(data), PredictOptions::default());
        assert!(matches!(result, Err(WelesError::Validation(_))));
        assert_eq!(client.transport().recorded().len(), 1);
    }

    #[test]
    fn test_predict_server_error() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(500, "boom"));
        let result = client.predict("m1", Input::reference(HASH), PredictOptions::default());
        assert!(matches!(result, Err(WelesError::Server { status: 500, .. })));
    }

    #[test]
    fn test_model_info() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, INFO));

        let info = client.model_info("m1").unwrap();
        assert_eq!(info.target(), Some("y"));
        assert_eq!(info.columns.n_rows(), 3);
        assert!(info.audits.is_empty());
        assert_eq!(info.feature_columns().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_model_info_not_json() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, "<html>"));
        assert!(matches!(
            client.model_info("m1"),
            Err(WelesError::Parse(_))
        ));
    }

    #[test]
    fn test_requirements() {
        let dir = TempDir::new().unwrap();
        let client = client(
            dir.path(),
            RecordingTransport::replying(200, r#"{"serde": "1.0", "csv": "1.3"}"#),
        );
        let reqs = client.model_requirements("m1").unwrap();
        assert_eq!(reqs["serde"], "1.0");
        assert_eq!(
            client.transport().recorded()[0].path,
            "models/m1/requirements"
        );
    }

    #[test]
    fn test_search() {
        let dir = TempDir::new().unwrap();
        let client = client(
            dir.path(),
            RecordingTransport::replying(200, r#"{"models": ["lr_1", "lr_2"]}"#),
        );

        let mut query = SearchQuery::new().tags(["linear"]).regex("^lr_");
        query.row = ">100;<200;".parse().unwrap();
        let models = client.search_models(&query).unwrap();
        assert_eq!(models, vec!["lr_1", "lr_2"]);

        let request = &client.transport().recorded()[0];
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "models/search");
        assert_eq!(request.fields.text("row"), Some(">100;<200;"));
        assert_eq!(request.fields.text("tags_mode"), Some(TagMatch::Any.as_str()));
        assert_eq!(request.fields.text("regex"), Some("^lr_"));
        assert!(request.fields.get("owner").is_none());
    }

    #[test]
    fn test_search_missing_models_field() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, "{}"));
        assert!(matches!(
            client.search_models(&SearchQuery::new()),
            Err(WelesError::Parse(_))
        ));
    }

    #[test]
    fn test_audit_by_hash() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, "0.93\n"));

        let audit = AuditRequest::new("m1", "acc", "y", Input::reference(HASH), creds())
            .with_data_name("ignored");
        let result = client.audit_model(audit).unwrap();
        assert_eq!(result.rows()[0], vec![Cell::Float(0.93)]);

        let request = &client.transport().recorded()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path, "models/audit");
        assert_eq!(request.fields.text("user"), Some("u"));
        assert_eq!(request.fields.text("is_hash"), Some("1"));
        assert_eq!(request.fields.text("hash"), Some(HASH));
        assert!(request.fields.get("data_name").is_none());
    }

    #[test]
    fn test_audit_with_table() {
        let dir = TempDir::new().unwrap();
        let client = client(dir.path(), RecordingTransport::replying(200, "0.5\n"));

        let data = Table::from_rows(vec![vec![1, 0]]).unwrap();
        let audit = AuditRequest::new("m1", "acc", "1", Input::Object(data), creds())
            .with_data_name("holdout")
            .with_data_desc("holdout rows");
        client.audit_model(audit).unwrap();

        let request = &client.transport().recorded()[0];
        assert_eq!(request.fields.text("is_hash"), Some("0"));
        assert_eq!(request.fields.text("data_name"), Some("holdout"));
        assert_eq!(request.fields.text("data_desc"), Some("holdout rows"));
        assert_eq!(request.file("data"), Some("0,1\n1,0\n"));
        assert_eq!(entries(dir.path()), 0);
    }
}
