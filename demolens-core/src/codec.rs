//! Wire encodings: base64 data URLs, PNG images and WAV audio.

use crate::error::{DemoError, Result};
use crate::value::AudioClip;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::io::Cursor;

/// A decoded `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// Decode a data URL. Bare base64 without the `data:` prefix is accepted too.
pub fn decode_data_url(input: &str) -> Result<DataUrl> {
    let (mime, payload) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                DemoError::invalid_value("data-url", "missing ',' between header and payload")
            })?;
            let mime = header.trim_end_matches(";base64");
            let mime = (!mime.is_empty()).then(|| mime.to_string());
            (mime, payload)
        }
        None => (None, input),
    };
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(DataUrl { mime, bytes })
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Guess a MIME type from a file extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Guess a file extension from a MIME type.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
        "audio/mpeg" => Some("mp3"),
        "video/mp4" => Some("mp4"),
        "video/x-msvideo" | "video/avi" => Some("avi"),
        "video/webm" => Some("webm"),
        "application/pdf" => Some("pdf"),
        "text/csv" => Some("csv"),
        "text/plain" => Some("txt"),
        "application/json" => Some("json"),
        _ => None,
    }
}

/// Decode an image data URL (any format the `image` crate was built with).
pub fn decode_image(data_url: &str) -> Result<image::DynamicImage> {
    let decoded = decode_data_url(data_url)?;
    Ok(image::load_from_memory(&decoded.bytes)?)
}

pub fn encode_png(img: &image::DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Encode an image as a PNG data URL.
pub fn encode_image_data_url(img: &image::DynamicImage) -> Result<String> {
    Ok(encode_data_url("image/png", &encode_png(img)?))
}

/// Decode WAV bytes into integer samples using hound.
///
/// Float WAV files are rescaled to 16-bit integers.
pub fn decode_wav(data: &[u8]) -> Result<AudioClip> {
    let mut reader = hound::WavReader::new(Cursor::new(data))?;
    let spec = reader.spec();
    let (bits_per_sample, samples) = match spec.sample_format {
        hound::SampleFormat::Int => (
            spec.bits_per_sample,
            reader
                .samples::<i32>()
                .collect::<std::result::Result<Vec<i32>, _>>()?,
        ),
        hound::SampleFormat::Float => (
            16,
            reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i32))
                .collect::<std::result::Result<Vec<i32>, _>>()?,
        ),
    };
    Ok(AudioClip {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample,
        samples,
    })
}

/// Encode integer samples as WAV bytes using hound.
pub fn encode_wav(clip: &AudioClip) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: clip.channels,
        sample_rate: clip.sample_rate,
        bits_per_sample: clip.bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in &clip.samples {
            writer.write_sample(*sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
