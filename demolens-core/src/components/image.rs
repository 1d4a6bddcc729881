//! Image input, interpreted by superpixel occlusion.

use super::media;
use super::{
    Component, InterpretParams, NeighborAux, Neighbors, base_context, expected_variants, missing_value,
    warn_deprecated,
};
use crate::codec;
use crate::config::SegmentationConfig;
use crate::error::{ConfigError, DemoError, Result};
use crate::flagging::{self, FlagMetadata};
use crate::interpret::SlotScores;
use crate::segmentation::{SegmentMap, slic};
use crate::value::Value;
use ::image::imageops::FilterType;
use ::image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use ndarray::Array3;
use serde_json::{Value as Json, json};
use std::path::Path;
use std::str::FromStr;

/// What [`Image::preprocess`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageType {
    /// Pixel array, height x width x channels.
    #[default]
    Numpy,
    /// Decoded image.
    Pil,
    /// Path to a temporary PNG file.
    Filepath,
    /// Path to a temporary PNG file.
    ///
    /// Deprecated: use `filepath`.
    File,
}

impl ImageType {
    const NAMES: &'static [&'static str] = &["numpy", "pil", "filepath", "file"];

    pub fn migration_note(self) -> Option<&'static str> {
        match self {
            Self::File => Some("the 'file' type is deprecated, use 'filepath'"),
            _ => None,
        }
    }
}

impl FromStr for ImageType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "numpy" => Ok(Self::Numpy),
            "pil" => Ok(Self::Pil),
            "filepath" => Ok(Self::Filepath),
            "file" => Ok(Self::File),
            _ => Err(ConfigError::InvalidType {
                component: "image".into(),
                variant: s.into(),
                expected: expected_variants(Self::NAMES),
            }),
        }
    }
}

/// Color mode images are converted to before reaching the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageMode {
    #[default]
    Rgb,
    /// Single-channel luminance.
    L,
}

impl ImageMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::L => "L",
        }
    }
}

impl FromStr for ImageMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RGB" => Ok(Self::Rgb),
            "L" => Ok(Self::L),
            _ => Err(ConfigError::InvalidParameter {
                component: "image".into(),
                parameter: "image_mode".into(),
                reason: format!("unknown mode '{s}', expected RGB or L"),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    label: Option<String>,
    kind: ImageType,
    mode: ImageMode,
    shape: Option<(u32, u32)>,
    invert_colors: bool,
    source: String,
    tool: String,
    optional: bool,
    replacement_color: [u8; 3],
    segmentation: SegmentationConfig,
}

impl Default for Image {
    fn default() -> Self {
        Self {
            label: None,
            kind: ImageType::Numpy,
            mode: ImageMode::Rgb,
            shape: None,
            invert_colors: false,
            source: "upload".into(),
            tool: "editor".into(),
            optional: false,
            replacement_color: [0, 0, 0],
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl Image {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn kind(mut self, kind: ImageType) -> Self {
        if let Some(note) = kind.migration_note() {
            warn_deprecated("image", "file", note);
        }
        self.kind = kind;
        self
    }

    pub fn type_name(self, name: &str) -> Result<Self, ConfigError> {
        Ok(self.kind(name.parse()?))
    }

    pub fn mode(mut self, mode: ImageMode) -> Self {
        self.mode = mode;
        self
    }

    /// Resize and center-crop inputs to exactly `width` x `height`.
    pub fn shape(mut self, width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidParameter {
                component: "image".into(),
                parameter: "shape".into(),
                reason: format!("shape must be non-empty, got {width}x{height}"),
            });
        }
        self.shape = Some((width, height));
        Ok(self)
    }

    pub fn invert_colors(mut self, invert: bool) -> Self {
        self.invert_colors = invert;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Superpixel settings used for interpretation.
    pub fn segmentation(mut self, config: SegmentationConfig) -> Self {
        self.segmentation = config;
        self
    }

    /// Decode a raw value and apply mode, shape and inversion.
    fn load(&self, raw: &Json) -> Result<DynamicImage> {
        let decoded = media::load(self.name(), raw)?;
        let img = ::image::load_from_memory(&decoded.bytes)?;
        let mut img = match self.mode {
            ImageMode::Rgb => DynamicImage::ImageRgb8(img.to_rgb8()),
            ImageMode::L => DynamicImage::ImageLuma8(img.to_luma8()),
        };
        if let Some((width, height)) = self.shape {
            img = img.resize_to_fill(width, height, FilterType::Lanczos3);
        }
        if self.invert_colors {
            img.invert();
        }
        Ok(img)
    }

    fn to_pixels(&self, img: &DynamicImage) -> Result<Array3<u8>> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let (channels, raw) = match self.mode {
            ImageMode::Rgb => (3, img.to_rgb8().into_raw()),
            ImageMode::L => (1, img.to_luma8().into_raw()),
        };
        Array3::from_shape_vec((height, width, channels), raw)
            .map_err(|e| DemoError::invalid_value(self.name(), e.to_string()))
    }

    /// Superpixel regions of the raw image, before mode and shape are applied.
    pub fn segment(&self, raw: &Json) -> Result<SegmentMap> {
        let decoded = media::load(self.name(), raw)?;
        let base = ::image::load_from_memory(&decoded.bytes)?.to_rgb8();
        Ok(slic(&base, &self.segmentation))
    }

    fn segments<'a>(&self, neighbors: &'a Neighbors) -> Result<&'a SegmentMap> {
        match &neighbors.aux {
            NeighborAux::Segments(map) => Ok(map),
            _ => Err(DemoError::invalid_value(self.name(), "neighbors carry no segment map")),
        }
    }
}

/// Build an image from an `H x W x C` array with 1, 3 or 4 channels.
pub fn pixels_to_image(pixels: &Array3<u8>) -> Result<DynamicImage> {
    let (height, width, channels) = pixels.dim();
    let data: Vec<u8> = pixels.iter().copied().collect();
    let (w, h) = (width as u32, height as u32);
    let img = match channels {
        1 => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
        _ => None,
    };
    img.ok_or_else(|| {
        DemoError::invalid_value("image", format!("unsupported pixel array shape {:?}", pixels.dim()))
    })
}

fn encode_rgb(img: RgbImage) -> Result<Json> {
    Ok(Json::String(codec::encode_image_data_url(&DynamicImage::ImageRgb8(img))?))
}

impl Component for Image {
    fn name(&self) -> &'static str {
        "image"
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn template_context(&self) -> Json {
        let mut ctx = base_context(self.name(), self.label());
        ctx.insert("image_mode".into(), json!(self.mode.as_str()));
        ctx.insert("shape".into(), json!(self.shape));
        ctx.insert("source".into(), json!(self.source));
        ctx.insert("tool".into(), json!(self.tool));
        ctx.insert("optional".into(), json!(self.optional));
        Json::Object(ctx)
    }

    fn preprocess(&self, raw: &Json) -> Result<Value> {
        if raw.is_null() {
            return missing_value(self.name(), self.optional);
        }
        let img = self.load(raw)?;
        match self.kind {
            ImageType::Numpy => Ok(Value::Pixels(self.to_pixels(&img)?)),
            ImageType::Pil => Ok(Value::Image(img)),
            ImageType::Filepath | ImageType::File => {
                let path = media::write_temp(&codec::encode_png(&img)?, ".png")?;
                Ok(Value::Path(path))
            }
        }
    }

    fn preprocess_example(&self, example: &Json) -> Result<Json> {
        match example.as_str() {
            Some(path) if !path.starts_with("data:") && Path::new(path).is_file() => {
                Ok(Json::String(media::file_data_url(Path::new(path))?))
            }
            _ => Ok(example.clone()),
        }
    }

    fn serialize(&self, value: &Value, allow_local_access: bool) -> Result<Json> {
        match value {
            Value::Path(path) if allow_local_access => Ok(Json::String(media::file_data_url(path)?)),
            Value::Path(_) => Err(DemoError::invalid_value(self.name(), "local file access is disabled")),
            Value::Pixels(pixels) => Ok(Json::String(codec::encode_image_data_url(&pixels_to_image(pixels)?)?)),
            Value::Image(img) => Ok(Json::String(codec::encode_image_data_url(img)?)),
            Value::Text(s) if s.starts_with("data:") => Ok(json!(s)),
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
        let decoded = media::load(self.name(), value)?;
        let extension = decoded
            .mime
            .as_deref()
            .and_then(codec::extension_for_mime)
            .unwrap_or("png");
        let reference = flagging::write_numbered(dir, slot, Some(extension), &decoded.bytes)?;
        Ok(Json::String(reference))
    }

    fn restore_flagged(
        &self,
        dir: &Path,
        stored: &Json,
        _metadata: Option<&FlagMetadata>,
    ) -> Result<Json> {
        let (_, data) = media::restore_numbered(self.name(), dir, stored)?;
        Ok(Json::String(data))
    }

    fn generate_sample(&self) -> Json {
        let img = RgbImage::from_fn(8, 8, |x, y| ::image::Rgb([(x * 32) as u8, (y * 32) as u8, 128]));
        encode_rgb(img).unwrap_or(Json::Null)
    }

    fn set_interpret_parameters(&mut self, params: &InterpretParams) {
        if let Some(color) = params.replacement_color {
            self.replacement_color = color;
        }
        if let Some(segments) = params.segments {
            self.segmentation.n_segments = segments.max(1);
        }
    }

    fn interpret_by_tokens(&self) -> bool {
        true
    }

    fn get_interpretation_neighbors(&self, raw: &Json) -> Result<Neighbors> {
        let map = self.segment(raw)?;
        let values = (0..map.count)
            .map(|region| encode_rgb(map.fill_region(region, self.replacement_color)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Neighbors::with_aux(values, NeighborAux::Segments(map)))
    }

    fn get_interpretation_scores(
        &self,
        _raw: &Json,
        neighbors: &Neighbors,
        scores: &[f64],
    ) -> Result<SlotScores> {
        Ok(SlotScores::Pixels(self.segments(neighbors)?.pixel_scores(scores)))
    }

    fn shapley_units(&self, neighbors: &Neighbors) -> Option<usize> {
        self.segments(neighbors).ok().map(|map| map.count)
    }

    fn masked_input(&self, _raw: &Json, neighbors: &Neighbors, keep: &[bool]) -> Result<Json> {
        encode_rgb(self.segments(neighbors)?.fill_regions(keep, self.replacement_color))
    }
}
