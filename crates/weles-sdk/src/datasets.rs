//! Dataset commands.

use log::info;
use serde_json::{Map, Value};

use weles_core::{
    resolve_description, Input, ReferenceStyle, RequestBuilder, Role, Table, Transport,
    WelesError, WelesResult,
};

use crate::client::{require_non_empty, validate_dataset_id, RegistryClient};
use crate::credentials::Credentials;

/// Rows returned by [`RegistryClient::dataset_head`] when no count is given.
pub const DEFAULT_HEAD_ROWS: usize = 5;

/// Dataset metadata with the per-column description decoded as a table.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    /// Every top-level field except `columns`.
    pub fields: Map<String, Value>,
    pub columns: Table,
}

impl DatasetInfo {
    pub(crate) fn from_json(value: Value) -> WelesResult<Self> {
        let mut fields = match value {
            Value::Object(map) => map,
            _ => {
                return Err(WelesError::Parse(
                    "dataset info must be a JSON object".to_string(),
                ))
            }
        };
        let columns = match fields.remove("columns") {
            Some(columns) => Table::from_json(&columns)?,
            None => Table::default(),
        };
        Ok(Self { fields, columns })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl<T: Transport> RegistryClient<T> {
    /// Upload a dataset given as a table or a path to a delimited file.
    ///
    /// Returns the server's message verbatim, whatever its status.
    pub fn upload_dataset(
        &self,
        data: Input<Table>,
        name: &str,
        description: &str,
        credentials: &Credentials,
    ) -> WelesResult<String> {
        credentials.validate()?;
        require_non_empty("data_name", name)?;
        if data.is_reference() {
            return Err(WelesError::invalid(
                "dataset to upload must be a table or a file path, not a hash",
            ));
        }
        let description = resolve_description(description)?;

        let payload = self.resolver().resolve_table(data, Role::Dataset)?;
        let request = RequestBuilder::post("datasets/post")
            .field("user_name", credentials.user_name.as_str())
            .field("password", credentials.password.as_str())
            .field("data_name", name)
            .field("data_desc", description)
            .payload(payload, ReferenceStyle::FileOnly)
            .build();

        let response = self.dispatch(request)?;
        info!("Uploaded dataset '{}' (status {})", name, response.status);
        Ok(response.body)
    }

    /// Fetch a whole dataset.
    pub fn dataset(&self, dataset_id: &str) -> WelesResult<Table> {
        validate_dataset_id(dataset_id)?;
        let request = RequestBuilder::get(format!("datasets/{}", dataset_id)).build();
        let response = self.dispatch(request)?.error_for_status()?;
        Table::from_json(&response.json()?)
    }

    /// Fetch the first `n` rows of a dataset.
    pub fn dataset_head(&self, dataset_id: &str, n: usize) -> WelesResult<Table> {
        validate_dataset_id(dataset_id)?;
        let request = RequestBuilder::get(format!("datasets/{}/head", dataset_id))
            .field("n", n)
            .build();
        let response = self.dispatch(request)?.error_for_status()?;
        Table::from_json(&response.json()?)
    }

    /// Fetch dataset metadata.
    pub fn dataset_info(&self, dataset_id: &str) -> WelesResult<DatasetInfo> {
        validate_dataset_id(dataset_id)?;
        let request = RequestBuilder::get(format!("datasets/{}/info", dataset_id)).build();
        let response = self.dispatch(request)?.error_for_status()?;
        DatasetInfo::from_json(response.json()?)
    }
}
