//! Tabular input.

use super::{Component, InterpretParams, base_context, expected_variants, restore_json_text};
use crate::error::{ConfigError, DemoError, Result};
use crate::flagging::FlagMetadata;
use crate::value::{Table, Value};
use ndarray::Array2;
use serde_json::{Value as Json, json};
use std::path::Path;
use std::str::FromStr;

/// What [`Dataframe::preprocess`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataframeType {
    /// Column-labelled table.
    #[default]
    Pandas,
    /// Numeric matrix.
    Numpy,
    /// Nested rows, unchanged.
    Array,
}

impl DataframeType {
    const NAMES: &'static [&'static str] = &["pandas", "numpy", "array"];
}

impl FromStr for DataframeType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pandas" => Ok(Self::Pandas),
            "numpy" => Ok(Self::Numpy),
            "array" => Ok(Self::Array),
            _ => Err(ConfigError::InvalidType {
                component: "dataframe".into(),
                variant: s.into(),
                expected: expected_variants(Self::NAMES),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataframe {
    label: Option<String>,
    headers: Option<Vec<String>>,
    datatype: Json,
    row_count: usize,
    col_count: Option<usize>,
    col_width: Option<u32>,
    kind: DataframeType,
}

impl Default for Dataframe {
    fn default() -> Self {
        Self {
            label: None,
            headers: None,
            datatype: json!("str"),
            row_count: 3,
            col_count: None,
            col_width: None,
            kind: DataframeType::Pandas,
        }
    }
}

impl Dataframe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Column datatype: one name for every column or a list with one per column.
    pub fn datatype(mut self, datatype: Json) -> Self {
        self.datatype = datatype;
        self
    }

    pub fn row_count(mut self, rows: usize) -> Self {
        self.row_count = rows;
        self
    }

    pub fn col_count(mut self, cols: usize) -> Self {
        self.col_count = Some(cols);
        self
    }

    pub fn col_width(mut self, width: u32) -> Self {
        self.col_width = Some(width);
        self
    }

    pub fn kind(mut self, kind: DataframeType) -> Self {
        self.kind = kind;
        self
    }

    pub fn type_name(self, name: &str) -> Result<Self, ConfigError> {
        Ok(self.kind(name.parse()?))
    }

    fn columns(&self) -> usize {
        self.col_count
            .or_else(|| self.headers.as_ref().map(Vec::len))
            .unwrap_or(3)
    }

    /// Split a raw value into optional headers and rows.
    fn rows<'a>(&self, raw: &'a Json) -> Result<(Option<Vec<String>>, &'a [Json])> {
        let (headers, data) = match raw {
            Json::Object(map) => {
                let headers = map
                    .get("headers")
                    .and_then(Json::as_array)
                    .map(|h| h.iter().map(cell_label).collect());
                (headers, map.get("data").unwrap_or(&Json::Null))
            }
            other => (None, other),
        };
        let rows = data.as_array().ok_or_else(|| {
            DemoError::invalid_value(self.name(), format!("expected a list of rows, got {data}"))
        })?;
        if let Some(bad) = rows.iter().find(|row| !row.is_array()) {
            return Err(DemoError::invalid_value(self.name(), format!("row is not a list: {bad}")));
        }
        Ok((headers, rows))
    }
}

fn cell_label(cell: &Json) -> String {
    match cell {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn row_cells(row: &Json) -> Vec<Json> {
    row.as_array().cloned().unwrap_or_default()
}

/// Parse rows of numeric cells into a matrix. Booleans count as 0/1.
pub fn rows_to_matrix(component: &str, rows: &[Json]) -> Result<Array2<f64>> {
    let width = rows.first().and_then(Json::as_array).map_or(0, Vec::len);
    let mut cells = Vec::with_capacity(rows.len() * width);
    for row in rows {
        let row = row.as_array().map(Vec::as_slice).unwrap_or_default();
        if row.len() != width {
            return Err(DemoError::invalid_value(component, "rows have different lengths"));
        }
        for cell in row {
            let value = match cell {
                Json::Number(n) => n.as_f64(),
                Json::Bool(b) => Some(f64::from(u8::from(*b))),
                Json::String(s) => s.trim().parse().ok(),
                _ => None,
            };
            cells.push(value.ok_or_else(|| {
                DemoError::invalid_value(component, format!("non-numeric cell {cell}"))
            })?);
        }
    }
    Array2::from_shape_vec((rows.len(), width), cells)
        .map_err(|e| DemoError::invalid_value(component, e.to_string()))
}

impl Component for Dataframe {
    fn name(&self) -> &'static str {
        "dataframe"
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn template_context(&self) -> Json {
        let mut ctx = base_context(self.name(), self.label());
        let cols = self.columns();
        ctx.insert("headers".into(), json!(self.headers));
        ctx.insert("datatype".into(), self.datatype.clone());
        ctx.insert("row_count".into(), json!(self.row_count));
        ctx.insert("col_count".into(), json!(cols));
        ctx.insert("col_width".into(), json!(self.col_width));
        ctx.insert("default".into(), json!(vec![vec![Json::Null; cols]; self.row_count]));
        Json::Object(ctx)
    }

    fn preprocess(&self, raw: &Json) -> Result<Value> {
        if raw.is_null() {
            return Ok(Value::Empty);
        }
        let (headers, rows) = self.rows(raw)?;
        match self.kind {
            DataframeType::Pandas => {
                let width = rows.first().and_then(Json::as_array).map_or(0, Vec::len);
                let headers = headers
                    .or_else(|| self.headers.clone())
                    .unwrap_or_else(|| (0..width).map(|i| i.to_string()).collect());
                Ok(Value::Table(Table::new(headers, rows.iter().map(row_cells).collect())))
            }
            DataframeType::Numpy => Ok(Value::Matrix(rows_to_matrix(self.name(), rows)?)),
            DataframeType::Array => Ok(Value::Rows(rows.iter().map(row_cells).collect())),
        }
    }

    fn serialize(&self, value: &Value, _allow_local_access: bool) -> Result<Json> {
        match value {
            Value::Table(table) => Ok(json!(table.rows)),
            Value::Rows(rows) => Ok(json!(rows)),
            Value::Matrix(matrix) => Ok(json!(
                matrix.outer_iter().map(|row| row.to_vec()).collect::<Vec<_>>()
            )),
            Value::Empty => Ok(Json::Null),
            other => Err(DemoError::invalid_value(
                self.name(),
                format!("cannot serialize a {} value", other.kind()),
            )),
        }
    }

    fn save_flagged(
        &self,
        _dir: &Path,
        _slot: &str,
        value: &Json,
        _metadata: Option<&FlagMetadata>,
    ) -> Result<Json> {
        Ok(Json::String(serde_json::to_string(value)?))
    }

    fn restore_flagged(
        &self,
        _dir: &Path,
        stored: &Json,
        _metadata: Option<&FlagMetadata>,
    ) -> Result<Json> {
        restore_json_text(self.name(), stored)
    }

    fn generate_sample(&self) -> Json {
        let cols = self.columns();
        json!(
            (0..self.row_count.max(1))
                .map(|r| (0..cols).map(|c| r * cols + c + 1).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        )
    }

    fn set_interpret_parameters(&mut self, _params: &InterpretParams) {}
}
