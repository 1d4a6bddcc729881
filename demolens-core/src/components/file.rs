//! Generic file upload input.

use super::media;
use super::{Component, InterpretParams, base_context, expect_str, expected_variants, missing_value};
use crate::codec;
use crate::error::{ConfigError, DemoError, Result};
use crate::flagging::FlagMetadata;
use crate::value::Value;
use serde_json::{Value as Json, json};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    /// Path to a temporary copy of the upload.
    #[default]
    File,
    /// The upload's contents.
    Bytes,
}

impl FileType {
    const NAMES: &'static [&'static str] = &["file", "bytes"];
}

impl FromStr for FileType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "bytes" => Ok(Self::Bytes),
            _ => Err(ConfigError::InvalidType {
                component: "file".into(),
                variant: s.into(),
                expected: expected_variants(Self::NAMES),
            }),
        }
    }
}

/// Whether one or several files are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileCount {
    #[default]
    Single,
    Multiple,
}

impl FileCount {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
        }
    }
}

impl FromStr for FileCount {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "multiple" => Ok(Self::Multiple),
            _ => Err(ConfigError::InvalidParameter {
                component: "file".into(),
                parameter: "file_count".into(),
                reason: format!("unknown file count '{s}', expected single or multiple"),
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct File {
    label: Option<String>,
    kind: FileType,
    file_count: FileCount,
    optional: bool,
}

impl File {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn kind(mut self, kind: FileType) -> Result<Self, ConfigError> {
        self.kind = kind;
        self.validate()
    }

    pub fn type_name(self, name: &str) -> Result<Self, ConfigError> {
        self.kind(name.parse()?)
    }

    pub fn file_count(mut self, count: FileCount) -> Result<Self, ConfigError> {
        self.file_count = count;
        self.validate()
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.kind == FileType::Bytes && self.file_count == FileCount::Multiple {
            return Err(ConfigError::InvalidParameter {
                component: "file".into(),
                parameter: "file_count".into(),
                reason: "multiple uploads are only supported with the 'file' type".into(),
            });
        }
        Ok(self)
    }

    fn temp_copy(&self, upload: &Json) -> Result<std::path::PathBuf> {
        let decoded = media::load(self.name(), upload)?;
        let suffix = upload
            .get("name")
            .and_then(Json::as_str)
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        media::write_temp(&decoded.bytes, &suffix)
    }
}

impl Component for File {
    fn name(&self) -> &'static str {
        "file"
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn template_context(&self) -> Json {
        let mut ctx = base_context(self.name(), self.label());
        ctx.insert("file_count".into(), json!(self.file_count.as_str()));
        ctx.insert("optional".into(), json!(self.optional));
        Json::Object(ctx)
    }

    fn preprocess(&self, raw: &Json) -> Result<Value> {
        let uploads: Vec<&Json> = match raw {
            Json::Null => return missing_value(self.name(), self.optional),
            Json::Array(items) => items.iter().collect(),
            single => vec![single],
        };
        if uploads.is_empty() {
            return missing_value(self.name(), self.optional);
        }
        match (self.file_count, self.kind) {
            (FileCount::Multiple, _) => Ok(Value::Paths(
                uploads
                    .into_iter()
                    .map(|upload| self.temp_copy(upload))
                    .collect::<Result<_>>()?,
            )),
            (FileCount::Single, FileType::File) => Ok(Value::Path(self.temp_copy(uploads[0])?)),
            (FileCount::Single, FileType::Bytes) => {
                Ok(Value::Bytes(media::load(self.name(), uploads[0])?.bytes))
            }
        }
    }

    fn serialize(&self, value: &Value, allow_local_access: bool) -> Result<Json> {
        match value {
            Value::Path(path) if allow_local_access => Ok(json!(path.to_string_lossy())),
            Value::Paths(paths) if allow_local_access => {
                Ok(json!(paths.iter().map(|p| p.to_string_lossy()).collect::<Vec<_>>()))
            }
            Value::Path(_) | Value::Paths(_) => {
                Err(DemoError::invalid_value(self.name(), "local file access is disabled"))
            }
            Value::Bytes(bytes) => Ok(json!({
                "name": "file",
                "size": bytes.len(),
                "data": codec::encode_data_url("application/octet-stream", bytes),
            })),
            Value::Empty => Ok(Json::Null),
            other => Err(DemoError::invalid_value(
                self.name(),
                format!("cannot serialize a {} value", other.kind()),
            )),
        }
    }

    fn save_flagged(
        &self,
        dir: &Path,
        slot: &str,
        value: &Json,
        _metadata: Option<&FlagMetadata>,
    ) -> Result<Json> {
        match value {
            Json::Array(items) => items
                .iter()
                .map(|item| media::save_numbered(self.name(), dir, slot, item, None))
                .collect::<Result<Vec<_>>>()
                .map(Json::Array),
            single => media::save_numbered(self.name(), dir, slot, single, None),
        }
    }

    fn restore_flagged(
        &self,
        dir: &Path,
        stored: &Json,
        _metadata: Option<&FlagMetadata>,
    ) -> Result<Json> {
        let restore = |reference: &Json| -> Result<Json> {
            let (name, data) = media::restore_numbered(self.name(), dir, reference)?;
            let size = codec::decode_data_url(&data)?.bytes.len();
            Ok(json!({"name": name, "size": size, "data": data}))
        };
        match stored {
            Json::Array(items) => items.iter().map(restore).collect::<Result<Vec<_>>>().map(Json::Array),
            single => {
                expect_str(self.name(), single)?;
                restore(single)
            }
        }
    }

    fn generate_sample(&self) -> Json {
        let contents = b"Hello World";
        json!({
            "name": "sample.txt",
            "size": contents.len(),
            "data": codec::encode_data_url("text/plain", contents),
            "is_example": false,
        })
    }

    fn set_interpret_parameters(&mut self, _params: &InterpretParams) {}
}
