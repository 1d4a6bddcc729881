//! Storage helpers behind `save_flagged` / `restore_flagged`.
//!
//! Numbered-file components write each flagged value to `<dir>/<slot>/<n>[.ext]`,
//! where `n` is the next unused integer starting at 0. References handed back
//! to callers are relative to `dir` and always use `/` as separator.

use crate::error::{DemoError, Result};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Opaque metadata forwarded by the flagging collaborator; components may ignore it.
pub type FlagMetadata = serde_json::Value;

/// Join `relative` onto `dir`, rejecting parent, root and prefix components.
fn join_within(dir: &Path, relative: &str) -> Result<PathBuf> {
    let mut path = dir.to_path_buf();
    for part in Path::new(relative).components() {
        match part {
            Component::Normal(name) => path.push(name),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(DemoError::invalid_value(
                    "flagging",
                    format!("path '{relative}' escapes the flagging directory"),
                ));
            }
        }
    }
    if path == dir {
        return Err(DemoError::invalid_value("flagging", "empty flagging path"));
    }
    Ok(path)
}

/// Pick the next free numbered path under `<dir>/<slot>/`, creating the directory.
///
/// Returns the absolute path and the relative reference (`slot/3.png`).
pub fn next_numbered_path(
    dir: &Path,
    slot: &str,
    extension: Option<&str>,
) -> Result<(PathBuf, String)> {
    let slot_dir = join_within(dir, slot)?;
    std::fs::create_dir_all(&slot_dir)?;
    let file_name = |n: usize| match extension {
        Some(ext) => format!("{n}.{ext}"),
        None => n.to_string(),
    };
    let mut n = 0;
    while slot_dir.join(file_name(n)).exists() {
        n += 1;
    }
    let name = file_name(n);
    Ok((slot_dir.join(&name), format!("{slot}/{name}")))
}

/// Resolve a stored reference back to a path under `dir`.
///
/// References that would leave `dir` are rejected.
pub fn resolve_reference(dir: &Path, reference: &str) -> Result<PathBuf> {
    join_within(dir, reference)
}

/// Write bytes to a fresh numbered file and return its reference.
pub fn write_numbered(
    dir: &Path,
    slot: &str,
    extension: Option<&str>,
    data: &[u8],
) -> Result<String> {
    let (path, reference) = next_numbered_path(dir, slot, extension)?;
    atomic_write(&path, data)?;
    tracing::debug!(reference = %reference, bytes = data.len(), "Flagged file written");
    Ok(reference)
}

/// Atomically write raw bytes to a file.
///
/// Writes to a `.tmp` sibling file, then renames to the target path.
/// Creates parent directories if they don't exist.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
