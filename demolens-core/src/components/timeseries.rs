//! Time series input: an `x` column and one or more `y` columns.

use super::{Component, InterpretParams, base_context, expect_f64, missing_value, restore_json_text};
use crate::error::{ConfigError, DemoError, Result};
use crate::flagging::FlagMetadata;
use crate::value::{Table, Value};
use serde_json::{Value as Json, json};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Timeseries {
    label: Option<String>,
    x: String,
    y: Vec<String>,
    optional: bool,
}

impl Timeseries {
    /// Series with `x` as the time column and `y` as the value columns.
    pub fn new<I, S>(x: impl Into<String>, y: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let y: Vec<String> = y.into_iter().map(Into::into).collect();
        if y.is_empty() {
            return Err(ConfigError::InvalidParameter {
                component: "timeseries".into(),
                parameter: "y".into(),
                reason: "at least one value column is required".into(),
            });
        }
        Ok(Self {
            label: None,
            x: x.into(),
            y,
            optional: false,
        })
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    fn headers(&self) -> Vec<String> {
        std::iter::once(self.x.clone()).chain(self.y.iter().cloned()).collect()
    }
}

impl Component for Timeseries {
    fn name(&self) -> &'static str {
        "timeseries"
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn template_context(&self) -> Json {
        let mut ctx = base_context(self.name(), self.label());
        ctx.insert("x".into(), json!(self.x));
        ctx.insert("y".into(), json!(self.y));
        ctx.insert("optional".into(), json!(self.optional));
        Json::Object(ctx)
    }

    /// `{headers, data, range?}` into a table; `range` keeps rows whose `x` lies within it.
    fn preprocess(&self, raw: &Json) -> Result<Value> {
        if raw.is_null() {
            return missing_value(self.name(), self.optional);
        }
        let headers = match raw.get("headers").and_then(Json::as_array) {
            Some(headers) => headers
                .iter()
                .map(|h| h.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| DemoError::invalid_value(self.name(), "headers must be strings"))?,
            None => self.headers(),
        };
        let rows = raw
            .get("data")
            .and_then(Json::as_array)
            .ok_or_else(|| DemoError::invalid_value(self.name(), "missing 'data' rows"))?;
        let rows: Vec<Vec<Json>> = rows
            .iter()
            .map(|row| {
                row.as_array().cloned().ok_or_else(|| {
                    DemoError::invalid_value(self.name(), format!("row is not a list: {row}"))
                })
            })
            .collect::<Result<_>>()?;
        let mut table = Table::new(headers, rows);

        if let Some(range) = raw.get("range").filter(|r| !r.is_null()) {
            let bounds = range
                .as_array()
                .filter(|b| b.len() == 2)
                .ok_or_else(|| DemoError::invalid_value(self.name(), "range must be [start, end]"))?;
            let (start, end) = (expect_f64(self.name(), &bounds[0])?, expect_f64(self.name(), &bounds[1])?);
            let x_index = table.column_index(&self.x).ok_or_else(|| {
                DemoError::invalid_value(self.name(), format!("missing x column '{}'", self.x))
            })?;
            table.rows.retain(|row| {
                row.get(x_index)
                    .and_then(Json::as_f64)
                    .is_some_and(|x| x >= start && x <= end)
            });
        }
        Ok(Value::Table(table))
    }

    fn serialize(&self, value: &Value, _allow_local_access: bool) -> Result<Json> {
        match value {
            Value::Table(table) => Ok(table.to_json()),
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
        let data: Vec<Vec<f64>> = (0..4)
            .map(|t| {
                std::iter::once(f64::from(t))
                    .chain(self.y.iter().enumerate().map(|(i, _)| f64::from(t) * (i + 1) as f64))
                    .collect()
            })
            .collect();
        json!({"headers": self.headers(), "data": data})
    }

    fn set_interpret_parameters(&mut self, _params: &InterpretParams) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> Timeseries {
        Timeseries::new("time", ["retail", "food", "other"]).unwrap()
    }

    fn raw() -> Json {
        json!({
            "headers": ["time", "retail", "food", "other"],
            "data": [[1, 2, 2, 2], [2, 2, 2, 2], [3, 2, 2, 2], [4, 2, 2, 2]],
        })
    }

    #[test]
    fn test_preprocess_to_table() {
        let Value::Table(table) = series().preprocess(&raw()).unwrap() else {
            panic!("expected a table");
        };
        assert_eq!(table.headers, vec!["time", "retail", "food", "other"]);
        assert_eq!(table.len(), 4);
        assert_eq!(series().serialize(&Value::Table(table), true).unwrap(), raw());
        assert_eq!(series().optional(true).preprocess(&Json::Null).unwrap(), Value::Empty);
        assert!(matches!(
            series().preprocess(&Json::Null),
            Err(DemoError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_range_filters_on_x() {
        let mut raw = raw();
        raw["range"] = json!([2, 3]);
        let Value::Table(table) = series().preprocess(&raw).unwrap() else {
            panic!("expected a table");
        };
        assert_eq!(table.column("time").unwrap(), vec![&json!(2), &json!(3)]);
        raw["range"] = json!([1]);
        assert!(series().preprocess(&raw).is_err());
    }

    #[test]
    fn test_template_context() {
        let single = Timeseries::new("time", ["retail"]).unwrap().label("Upload Your Timeseries");
        assert_eq!(
            single.template_context(),
            json!({
                "x": "time",
                "y": ["retail"],
                "optional": false,
                "name": "timeseries",
                "label": "Upload Your Timeseries",
            })
        );
        assert!(Timeseries::new("time", Vec::<String>::new()).is_err());
        let sample = series().generate_sample();
        assert_eq!(sample["headers"], json!(["time", "retail", "food", "other"]));
    }

    #[test]
    fn test_flag_stores_json_text() {
        let dir = tempfile::tempdir().unwrap();
        let stored = series().save_flagged(dir.path(), "timeseries_input", &raw(), None).unwrap();
        assert_eq!(stored, json!(serde_json::to_string(&raw()).unwrap()));
        assert_eq!(series().restore_flagged(dir.path(), &stored, None).unwrap(), raw());
    }
}
