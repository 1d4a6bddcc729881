//! Audio upload input.

use super::media;
use super::{Component, InterpretParams, base_context, expect_f64, expected_variants, missing_value, warn_deprecated};
use crate::codec;
use crate::error::{ConfigError, DemoError, Result};
use crate::flagging::FlagMetadata;
use crate::value::{AudioClip, Value};
use serde_json::{Value as Json, json};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioType {
    /// Decoded samples.
    #[default]
    Numpy,
    /// Path to a temporary WAV file.
    Filepath,
    /// Path to a temporary WAV file.
    ///
    /// Deprecated: use `filepath`.
    File,
}

impl AudioType {
    const NAMES: &'static [&'static str] = &["numpy", "filepath", "file"];

    pub fn migration_note(self) -> Option<&'static str> {
        match self {
            Self::File => Some("the 'file' type is deprecated, use 'filepath'"),
            _ => None,
        }
    }
}

impl FromStr for AudioType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "numpy" => Ok(Self::Numpy),
            "filepath" => Ok(Self::Filepath),
            "file" => Ok(Self::File),
            _ => Err(ConfigError::InvalidType {
                component: "audio".into(),
                variant: s.into(),
                expected: expected_variants(Self::NAMES),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Audio {
    label: Option<String>,
    kind: AudioType,
    source: String,
    optional: bool,
}

impl Default for Audio {
    fn default() -> Self {
        Self {
            label: None,
            kind: AudioType::Numpy,
            source: "upload".into(),
            optional: false,
        }
    }
}

impl Audio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn kind(mut self, kind: AudioType) -> Self {
        if let Some(note) = kind.migration_note() {
            warn_deprecated("audio", "file", note);
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

    /// Crop bounds from the upload object, as percentages of the clip.
    fn crop_bounds(&self, raw: &Json) -> Result<Option<(f64, f64)>> {
        let bound = |key: &str| raw.get(key).map(|v| expect_f64(self.name(), v)).transpose();
        match (bound("crop_min")?, bound("crop_max")?) {
            (None, None) => Ok(None),
            (min, max) => Ok(Some((min.unwrap_or(0.0), max.unwrap_or(100.0)))),
        }
    }
}

/// Keep the frames between `min` and `max` percent of the clip.
pub fn crop(clip: &AudioClip, min: f64, max: f64) -> AudioClip {
    let frames = clip.frames();
    let channels = usize::from(clip.channels.max(1));
    let at = |percent: f64| ((frames as f64 * percent.clamp(0.0, 100.0) / 100.0) as usize).min(frames);
    let (start, end) = (at(min), at(max).max(at(min)));
    AudioClip {
        samples: clip.samples[start * channels..end * channels].to_vec(),
        ..clip.clone()
    }
}

fn clip_object(name: &str, clip: &AudioClip) -> Result<Json> {
    Ok(json!({
        "name": name,
        "data": codec::encode_data_url("audio/wav", &codec::encode_wav(clip)?),
    }))
}

impl Component for Audio {
    fn name(&self) -> &'static str {
        "audio"
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
        let decoded = media::load(self.name(), raw)?;
        let mut clip = codec::decode_wav(&decoded.bytes)?;
        if let Some((min, max)) = self.crop_bounds(raw)? {
            clip = crop(&clip, min, max);
        }
        match self.kind {
            AudioType::Numpy => Ok(Value::Audio(clip)),
            AudioType::Filepath | AudioType::File => {
                Ok(Value::Path(media::write_temp(&codec::encode_wav(&clip)?, ".wav")?))
            }
        }
    }

    fn serialize(&self, value: &Value, allow_local_access: bool) -> Result<Json> {
        match value {
            Value::Path(path) if allow_local_access => media::file_object(path),
            Value::Path(_) => Err(DemoError::invalid_value(self.name(), "local file access is disabled")),
            Value::Audio(clip) => clip_object("audio.wav", clip),
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
        media::save_numbered(self.name(), dir, slot, value, Some("wav"))
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
        let clip = AudioClip {
            sample_rate: 8000,
            channels: 1,
            bits_per_sample: 16,
            samples: (0..800).map(|i| if (i / 20) % 2 == 0 { 4000 } else { -4000 }).collect(),
        };
        clip_object("sample.wav", &clip).unwrap_or(Json::Null)
    }

    fn set_interpret_parameters(&mut self, _params: &InterpretParams) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(frames: usize) -> AudioClip {
        AudioClip {
            sample_rate: 8000,
            channels: 1,
            bits_per_sample: 16,
            samples: (0..frames as i32).collect(),
        }
    }

    fn upload(clip: &AudioClip) -> Json {
        clip_object("audio_sample.wav", clip).unwrap()
    }

    #[test]
    fn test_preprocess_decodes_samples() {
        let raw = upload(&clip(8046));
        let Value::Audio(decoded) = Audio::new().preprocess(&raw).unwrap() else {
            panic!("expected audio");
        };
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.frames(), 8046);
        assert_eq!(Audio::new().optional(true).preprocess(&Json::Null).unwrap(), Value::Empty);
        assert!(matches!(
            Audio::new().preprocess(&Json::Null),
            Err(DemoError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_crop_by_percent() {
        let mut raw = upload(&clip(100));
        raw["crop_min"] = json!(10);
        raw["crop_max"] = json!(40);
        let Value::Audio(cropped) = Audio::new().preprocess(&raw).unwrap() else {
            panic!("expected audio");
        };
        assert_eq!(cropped.samples, (10..40).collect::<Vec<i32>>());
    }

    #[test]
    fn test_example_entry_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio_sample.wav");
        std::fs::write(&path, codec::encode_wav(&clip(50)).unwrap()).unwrap();
        let raw = json!({"name": path.to_string_lossy(), "is_example": true, "crop_min": 0, "crop_max": 50});
        let Value::Audio(decoded) = Audio::new().preprocess(&raw).unwrap() else {
            panic!("expected audio");
        };
        assert_eq!(decoded.frames(), 25);
        assert_eq!(
            Audio::new().serialize(&Value::Path(path.clone()), true).unwrap()["data"],
            upload(&clip(50))["data"]
        );
    }

    #[test]
    fn test_filepath_variants() {
        let raw = upload(&clip(10));
        let Value::Path(path) = Audio::new().type_name("filepath").unwrap().preprocess(&raw).unwrap() else {
            panic!("expected a path");
        };
        assert!(path.to_string_lossy().ends_with(".wav"));
        std::fs::remove_file(path).unwrap();
        assert!(Audio::new().type_name("file").is_ok());
        assert!(matches!(
            Audio::new().type_name("unknown"),
            Err(ConfigError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_serialize_and_template() {
        let audio = Audio::new().label("Upload Your Audio");
        assert_eq!(
            audio.template_context(),
            json!({"source": "upload", "optional": false, "name": "audio", "label": "Upload Your Audio"})
        );
        let encoded = audio.serialize(&Value::Audio(clip(5)), false).unwrap();
        assert!(encoded["data"].as_str().unwrap().starts_with("data:audio/wav;base64,"));
        assert!(audio.generate_sample().is_object());
    }

    #[test]
    fn test_flag_roundtrip() {
        let audio = Audio::new();
        let raw = upload(&clip(20));
        let dir = tempfile::tempdir().unwrap();
        let first = audio.save_flagged(dir.path(), "audio_input", &raw, None).unwrap();
        let second = audio.save_flagged(dir.path(), "audio_input", &raw, None).unwrap();
        assert_eq!(first, json!("audio_input/0.wav"));
        assert_eq!(second, json!("audio_input/1.wav"));
        let restored = audio.restore_flagged(dir.path(), &second, None).unwrap();
        assert_eq!(restored["data"], raw["data"]);
        assert_eq!(restored["name"], json!("audio_input/1.wav"));
    }
}
