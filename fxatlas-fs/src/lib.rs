//! Capability-based filesystem helpers for fxatlas artefacts.
//!
//! Every helper resolves an ambient directory handle for the parent of the
//! target path through `cap-std` and then operates relative to it, so callers
//! can pass absolute or relative UTF-8 paths interchangeably.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Write};
use std::path::Component;

/// Ensure every directory above `path` exists.
///
/// Paths without a parent, or whose parent is the filesystem root, need no
/// work.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }
    let (base, relative) = split_ambient(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base.create_dir_all(&relative)
}

/// Replace the contents of `path` with `contents`.
///
/// Missing parent directories are created. The bytes are written to a
/// sibling temporary file first and renamed over the target, so readers
/// never observe a partially written file.
pub fn write_file_atomically(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_parent_and_name(path)?;
    let staging = format!(".{name}.tmp");
    let result = stage_and_rename(&dir, &staging, &name, contents);
    if result.is_err() {
        // Best effort: the original error is the one worth reporting.
        let _cleanup = dir.remove_file(&staging);
    }
    result
}

/// Read the whole of `path` as UTF-8 text.
pub fn read_to_string(path: &Utf8Path) -> io::Result<String> {
    let (dir, name) = open_parent_and_name(path)?;
    dir.read_to_string(&name)
}

/// Whether `path` names an existing regular file.
///
/// A missing file or parent directory yields `Ok(false)`.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match open_parent_and_name(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(&name) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

fn stage_and_rename(
    dir: &fs_utf8::Dir,
    staging: &str,
    name: &str,
    contents: &[u8],
) -> io::Result<()> {
    let mut file = dir.create(staging)?;
    file.write_all(contents)?;
    file.sync_all()?;
    dir.rename(staging, dir, name)
}

fn open_parent_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Split `dir` into an ambient base directory handle and the remainder
/// relative to it.
fn split_ambient(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_dir = dir.as_std_path();
    let (base, relative) = match std_dir.components().next() {
        // Windows drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR_STR);
            let relative = std_dir
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_dir.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other(format!("cannot strip prefix from {dir}")))?;
            (base, relative.to_path_buf())
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR_STR);
            let relative = std_dir
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other(format!("cannot strip root from {dir}")))?;
            (base, relative.to_path_buf())
        }
        _ => (Utf8PathBuf::from("."), std_dir.to_path_buf()),
    };
    let handle = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other(format!("non-UTF-8 directory {dir}")))?;
    Ok((handle, relative))
}
