//! Payload handling shared by the file-backed components.

use super::expect_str;
use crate::codec::{self, DataUrl};
use crate::error::{DemoError, Result};
use crate::flagging;
use serde_json::{Value as Json, json};
use std::path::{Path, PathBuf};

/// The base64 payload of a raw media value: either the data URL itself or the `data` field of an upload object.
pub(crate) fn payload<'a>(component: &str, raw: &'a Json) -> Result<&'a str> {
    match raw {
        Json::String(s) => Ok(s),
        Json::Object(map) => expect_str(component, map.get("data").unwrap_or(&Json::Null)),
        _ => Err(DemoError::invalid_value(
            component,
            format!("expected a data URL or an upload object, got {raw}"),
        )),
    }
}

/// Whether an upload object refers to a canned example on disk rather than carrying its payload.
pub(crate) fn is_example(raw: &Json) -> bool {
    raw.get("is_example").and_then(Json::as_bool).unwrap_or(false)
}

/// Bytes and MIME type of a raw media value, reading example files from disk.
pub(crate) fn load(component: &str, raw: &Json) -> Result<DataUrl> {
    if is_example(raw) {
        let name = expect_str(component, raw.get("name").unwrap_or(&Json::Null))?;
        let path = Path::new(name);
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| codec::mime_for_extension(e).to_string());
        return Ok(DataUrl {
            mime,
            bytes: std::fs::read(path)?,
        });
    }
    codec::decode_data_url(payload(component, raw)?)
}

/// Read a local file into a data URL, guessing the MIME type from its extension.
pub(crate) fn file_data_url(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let mime = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or("application/octet-stream", codec::mime_for_extension);
    Ok(codec::encode_data_url(mime, &bytes))
}

/// Upload object for a local file: `{name, data}`.
pub(crate) fn file_object(path: &Path) -> Result<Json> {
    Ok(json!({
        "name": path.to_string_lossy(),
        "data": file_data_url(path)?,
    }))
}

/// Persist bytes to a temporary file that outlives this call.
pub(crate) fn write_temp(bytes: &[u8], suffix: &str) -> Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("demolens-")
        .suffix(suffix)
        .tempfile()?;
    std::io::Write::write_all(&mut file, bytes)?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}

/// Write the payload of `raw` to the next numbered file under `slot`.
pub(crate) fn save_numbered(
    component: &str,
    dir: &Path,
    slot: &str,
    raw: &Json,
    extension: Option<&str>,
) -> Result<Json> {
    let decoded = load(component, raw)?;
    let reference = flagging::write_numbered(dir, slot, extension, &decoded.bytes)?;
    Ok(Json::String(reference))
}

/// Read a numbered file back as a data URL typed by its extension.
pub(crate) fn restore_numbered(component: &str, dir: &Path, stored: &Json) -> Result<(String, String)> {
    let reference = expect_str(component, stored)?;
    let path = flagging::resolve_reference(dir, reference)?;
    Ok((reference.to_string(), file_data_url(&path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accepts_string_and_object() {
        assert_eq!(payload("audio", &json!("data:a;base64,AA==")).unwrap(), "data:a;base64,AA==");
        assert_eq!(
            payload("audio", &json!({"name": "x.wav", "data": "AA=="})).unwrap(),
            "AA=="
        );
        assert!(payload("audio", &json!(3)).is_err());
        assert!(payload("audio", &json!({"name": "x.wav"})).is_err());
    }

    #[test]
    fn test_example_entries_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, b"hello").unwrap();
        let raw = json!({"name": path.to_string_lossy(), "is_example": true});
        let loaded = load("file", &raw).unwrap();
        assert_eq!(loaded.bytes, b"hello");
        assert_eq!(loaded.mime.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_numbered_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let raw = json!({"name": "a.bin", "data": codec::encode_data_url("application/octet-stream", b"xyz")});
        let first = save_numbered("file", dir.path(), "file_input", &raw, None).unwrap();
        let second = save_numbered("file", dir.path(), "file_input", &raw, None).unwrap();
        assert_eq!(first, json!("file_input/0"));
        assert_eq!(second, json!("file_input/1"));
        let (reference, data) = restore_numbered("file", dir.path(), &second).unwrap();
        assert_eq!(reference, "file_input/1");
        assert_eq!(data, raw["data"]);
    }

    #[test]
    fn test_temp_file_persists() {
        let path = write_temp(b"abc", ".bin").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
        assert!(path.to_string_lossy().ends_with(".bin"));
        std::fs::remove_file(path).unwrap();
    }
}
