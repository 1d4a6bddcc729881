//! Video upload input. Payloads are passed through without decoding.

use super::media;
use super::{Component, InterpretParams, base_context, expected_variants, missing_value, warn_deprecated};
use crate::codec;
use crate::error::{ConfigError, DemoError, Result};
use crate::flagging::FlagMetadata;
use crate::value::Value;
use serde_json::{Value as Json, json};
use std::path::Path;
use std::str::FromStr;

/// Container format the wrapped function receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoType {
    #[default]
    Mp4,
    /// Deprecated: AVI uploads cannot be re-encoded, so preprocessing and
    /// serialization fail with an unsupported-operation error.
    Avi,
}

impl VideoType {
    const NAMES: &'static [&'static str] = &["mp4", "avi"];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
        }
    }

    pub fn migration_note(self) -> Option<&'static str> {
        match self {
            Self::Mp4 => None,
            Self::Avi => Some("AVI output cannot be re-encoded, use 'mp4'"),
        }
    }
}

impl FromStr for VideoType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp4" => Ok(Self::Mp4),
            "avi" => Ok(Self::Avi),
            _ => Err(ConfigError::InvalidType {
                component: "video".into(),
                variant: s.into(),
                expected: expected_variants(Self::NAMES),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Video {
    label: Option<String>,
    kind: VideoType,
    source: String,
    optional: bool,
}

impl Default for Video {
    fn default() -> Self {
        Self {
            label: None,
            kind: VideoType::Mp4,
            source: "upload".into(),
            optional: false,
        }
    }
}

impl Video {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn kind(mut self, kind: VideoType) -> Self {
        if let Some(note) = kind.migration_note() {
            warn_deprecated("video", kind.extension(), note);
        }
        self.kind = kind;
        self
    }

    pub fn type_name(self, name: &str) -> Result<Self, ConfigError> {
        Ok(self.kind(name.parse()?))
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    fn ensure_encodable(&self, operation: &str) -> Result<()> {
        match self.kind {
            VideoType::Mp4 => Ok(()),
            VideoType::Avi => Err(DemoError::unsupported(
                self.name(),
                format!("{operation} of avi video"),
            )),
        }
    }
}

impl Component for Video {
    fn name(&self) -> &'static str {
        "video"
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn template_context(&self) -> Json {
        let mut ctx = base_context(self.name(), self.label());
        ctx.insert("source".into(), json!(self.source));
        ctx.insert("optional".into(), json!(self.optional));
        Json::Object(ctx)
    }

    fn preprocess(&self, raw: &Json) -> Result<Value> {
        if raw.is_null() {
            return missing_value(self.name(), self.optional);
        }
        self.ensure_encodable("preprocessing")?;
        let decoded = media::load(self.name(), raw)?;
        let suffix = format!(".{}", self.kind.extension());
        Ok(Value::Path(media::write_temp(&decoded.bytes, &suffix)?))
    }

    fn serialize(&self, value: &Value, allow_local_access: bool) -> Result<Json> {
        self.ensure_encodable("serialization")?;
        match value {
            Value::Path(path) if allow_local_access => media::file_object(path),
            Value::Path(_) => Err(DemoError::invalid_value(self.name(), "local file access is disabled")),
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
        media::save_numbered(self.name(), dir, slot, value, Some(self.kind.extension()))
    }

    fn restore_flagged(
        &self,
        dir: &Path,
        stored: &Json,
        _metadata: Option<&FlagMetadata>,
    ) -> Result<Json> {
        let (reference, data) = media::restore_numbered(self.name(), dir, stored)?;
        Ok(json!({"name": reference, "data": data}))
    }

    fn generate_sample(&self) -> Json {
        // ISO base media `ftyp` box only; enough to identify the container.
        let header: &[u8] = b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isom";
        json!({
            "name": "sample.mp4",
            "data": codec::encode_data_url("video/mp4", header),
            "is_example": false,
        })
    }

    fn set_interpret_parameters(&mut self, _params: &InterpretParams) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> Json {
        json!({
            "name": "video_sample.mp4",
            "data": codec::encode_data_url("video/mp4", b"\x00\x00\x00\x18ftypmp42 frames"),
        })
    }

    #[test]
    fn test_preprocess_writes_mp4() {
        let Value::Path(path) = Video::new().preprocess(&upload()).unwrap() else {
            panic!("expected a path");
        };
        assert!(path.to_string_lossy().ends_with(".mp4"));
        let serialized = Video::new().serialize(&Value::Path(path.clone()), true).unwrap();
        assert_eq!(serialized["data"], upload()["data"]);
        std::fs::remove_file(path).unwrap();
        assert_eq!(Video::new().optional(true).preprocess(&Json::Null).unwrap(), Value::Empty);
        assert!(matches!(
            Video::new().preprocess(&Json::Null),
            Err(DemoError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_avi_is_unsupported() {
        let avi = Video::new().type_name("avi").unwrap();
        assert!(avi.kind.migration_note().is_some());
        assert!(matches!(
            avi.serialize(&Value::Path("clip.avi".into()), true),
            Err(DemoError::Unsupported { .. })
        ));
        assert!(matches!(avi.preprocess(&upload()), Err(DemoError::Unsupported { .. })));
        assert!(matches!(Video::new().type_name("mov"), Err(ConfigError::InvalidType { .. })));
    }

    #[test]
    fn test_template_context() {
        let video = Video::new().label("Upload Your Video");
        assert_eq!(
            video.template_context(),
            json!({"source": "upload", "optional": false, "name": "video", "label": "Upload Your Video"})
        );
        assert!(video.generate_sample().is_object());
    }

    #[test]
    fn test_flag_roundtrip() {
        let video = Video::new();
        let dir = tempfile::tempdir().unwrap();
        let first = video.save_flagged(dir.path(), "video_input", &upload(), None).unwrap();
        let second = video.save_flagged(dir.path(), "video_input", &upload(), None).unwrap();
        assert_eq!(first, json!("video_input/0.mp4"));
        assert_eq!(second, json!("video_input/1.mp4"));
        let restored = video.restore_flagged(dir.path(), &second, None).unwrap();
        assert_eq!(restored["data"], upload()["data"]);
    }
}
