//! Rectangular tables and their wire encodings.
//!
//! Datasets travel to the server as delimited text with a header row and come
//! back either as JSON (records or column mappings) or, for predictions and
//! audits, as headerless delimited text. [`Table`] is the one abstraction all
//! of these decode into.
//!
//! # Example
//!
//! ```rust
//! use weles_core::table::Table;
//!
//! let table = Table::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
//! assert_eq!(table.columns(), &["0".to_string(), "1".to_string()]);
//!
//! let csv = table.to_csv().unwrap();
//! assert_eq!(String::from_utf8(csv).unwrap(), "0,1\n1,2\n3,4\n");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{WelesError, WelesResult};

/// A single table cell.
///
/// Equality treats two `NaN` floats as equal so tables holding missing
/// numeric values compare the way they read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Parse a delimited-text field, picking the narrowest type that fits.
    pub fn parse(field: &str) -> Cell {
        if field.is_empty() {
            return Cell::Null;
        }
        match field {
            "true" | "True" => return Cell::Bool(true),
            "false" | "False" => return Cell::Bool(false),
            _ => {}
        }
        if let Ok(int) = field.parse::<i64>() {
            return Cell::Int(int);
        }
        if let Ok(float) = field.parse::<f64>() {
            return Cell::Float(float);
        }
        Cell::Text(field.to_string())
    }

    /// Render the cell as a delimited-text field.
    ///
    /// Floats use the `Debug` form so `2.0` keeps its decimal point and
    /// parses back as a float.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => format!("{:?}", f),
            Cell::Text(s) => s.clone(),
        }
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text view of the cell, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    fn from_json(value: &Value) -> Cell {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => Cell::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Null, Cell::Null) => true,
            (Cell::Bool(a), Cell::Bool(b)) => a == b,
            (Cell::Int(a), Cell::Int(b)) => a == b,
            (Cell::Float(a), Cell::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Cell::Text(a), Cell::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NaN"),
            other => write!(f, "{}", other.to_field()),
        }
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<i32> for Cell {
    fn from(v: i32) -> Self {
        Cell::Int(v as i64)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<f32> for Cell {
    fn from(v: f32) -> Self {
        Cell::Float(v as f64)
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Bool(v)
    }
}

/// Text is typed with [`Cell::parse`], so `"7"` becomes `Int(7)`.
impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::parse(v)
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::parse(&v)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// A rectangular table with a header row.
///
/// Every row has exactly `columns().len()` cells; constructors reject
/// anything else.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table from explicit column names and rows.
    ///
    /// Text cells are typed the same way delimited text is on read, so a
    /// table written with [`Table::to_csv`] parses back equal to itself.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> WelesResult<Self> {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(normalize).collect())
            .collect();
        Self::checked(columns, rows)
    }

    fn checked(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> WelesResult<Self> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(WelesError::invalid(format!(
                    "row {} has {} values, expected {}",
                    idx,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Coerce array-like rows into a table with positional column names
    /// (`"0"`, `"1"`, ...).
    ///
    /// Fails when the rows are ragged.
    pub fn from_rows<R, C>(rows: impl IntoIterator<Item = R>) -> WelesResult<Self>
    where
        R: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        let rows: Vec<Vec<Cell>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let columns = (0..width).map(|i| i.to_string()).collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Replace the column names. The count must match the current width.
    pub fn set_columns(&mut self, columns: Vec<String>) -> WelesResult<()> {
        if columns.len() != self.columns.len() {
            return Err(WelesError::invalid(format!(
                "got {} column names for a table with {} columns",
                columns.len(),
                self.columns.len()
            )));
        }
        self.columns = columns;
        Ok(())
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Serialize as delimited text with a header row and no index column.
    pub fn to_csv(&self) -> WelesResult<Vec<u8>> {
        if self.columns.is_empty() {
            return Err(WelesError::Serialization(
                "cannot write a table without columns".to_string(),
            ));
        }
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(Cell::to_field))?;
        }
        writer
            .into_inner()
            .map_err(|e| WelesError::Serialization(e.to_string()))
    }

    /// Parse delimited text whose first line is the header.
    pub fn from_csv(bytes: &[u8]) -> WelesResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);
        let columns = reader
            .headers()
            .map_err(|e| WelesError::Parse(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        let rows = read_records(&mut reader)?;
        Self::checked(columns, rows)
    }

    /// Parse delimited text without a header; columns are positional.
    pub fn from_csv_headerless(bytes: &[u8]) -> WelesResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes);
        let rows = read_records(&mut reader)?;
        Self::from_rows(rows)
    }

    /// Decode a JSON table.
    ///
    /// Accepted shapes:
    /// - array of records: `[{"a": 1, "b": 2}, ...]`
    /// - array of arrays: `[[1, 2], [3, 4]]`
    /// - column mapping with arrays: `{"a": [1, 3], "b": [2, 4]}`
    /// - column mapping with index objects: `{"a": {"0": 1, "1": 3}}`
    pub fn from_json(value: &Value) -> WelesResult<Self> {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) => {
                Self::from_records(items)
            }
            Value::Array(items) if items.iter().all(Value::is_array) => Self::from_rows(
                items
                    .iter()
                    .map(|row| row.as_array().into_iter().flatten().map(Cell::from_json)),
            ),
            Value::Object(map) => Self::from_column_mapping(map),
            other => Err(WelesError::Parse(format!(
                "expected a JSON table, got {}",
                json_kind(other)
            ))),
        }
    }

    fn from_records(items: &[Value]) -> WelesResult<Self> {
        let mut columns: Vec<String> = Vec::new();
        for record in items.iter().filter_map(Value::as_object) {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = items
            .iter()
            .filter_map(Value::as_object)
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).map(Cell::from_json).unwrap_or(Cell::Null))
                    .collect()
            })
            .collect();
        Self::checked(columns, rows)
    }

    fn from_column_mapping(map: &serde_json::Map<String, Value>) -> WelesResult<Self> {
        let columns: Vec<String> = map.keys().cloned().collect();
        let mut series: Vec<Vec<Cell>> = Vec::with_capacity(columns.len());

        for (name, column) in map {
            let cells = match column {
                Value::Array(values) => values.iter().map(Cell::from_json).collect(),
                Value::Object(indexed) => {
                    let mut entries: Vec<(&String, &Value)> = indexed.iter().collect();
                    if entries.iter().all(|(k, _)| k.parse::<u64>().is_ok()) {
                        entries.sort_by_key(|(k, _)| k.parse::<u64>().unwrap_or(0));
                    }
                    entries.into_iter().map(|(_, v)| Cell::from_json(v)).collect()
                }
                other => {
                    return Err(WelesError::Parse(format!(
                        "column '{}' is a {}, expected array or object",
                        name,
                        json_kind(other)
                    )))
                }
            };
            series.push(cells);
        }

        let n_rows = series.iter().map(Vec::len).max().unwrap_or(0);
        let rows = (0..n_rows)
            .map(|r| {
                series
                    .iter()
                    .map(|col| col.get(r).cloned().unwrap_or(Cell::Null))
                    .collect()
            })
            .collect();
        Self::checked(columns, rows)
    }
}

fn normalize(cell: Cell) -> Cell {
    match cell {
        Cell::Text(text) => Cell::parse(&text),
        other => other,
    }
}

fn read_records(reader: &mut csv::Reader<&[u8]>) -> WelesResult<Vec<Vec<Cell>>> {
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| WelesError::Parse(e.to_string()))?;
        rows.push(record.iter().map(Cell::parse).collect());
    }
    Ok(rows)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                rendered
                    .iter()
                    .map(|row| row[i].len())
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(name, w)| format!("{:>w$}", name, w = *w))
            .collect();
        writeln!(f, "{}", header.join("  "))?;
        for row in rendered {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:>w$}", cell, w = *w))
                .collect();
            writeln!(f, "{}", line.join("  "))?;
        }
        Ok(())
    }
}
