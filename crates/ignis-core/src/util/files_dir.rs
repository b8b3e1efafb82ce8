//! Resolution of `local:` paths against the files directory
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::error::ConfigError;
use std::path::{Component, Path, PathBuf};

/// Resolve a `local:` path beneath the files directory
///
/// Fails with `NoFilesDir` when no directory was configured and with
/// `FilesDirEscape` when the result would leave it.
pub fn resolve_local(files_dir: Option<&Path>, local: &str) -> Result<PathBuf, ConfigError> {
    let base = files_dir.ok_or(ConfigError::NoFilesDir)?;
    let candidate = base.join(local);
    ensure_within_files_dir(&candidate, base)?;
    Ok(candidate)
}

/// Verify that `path` lies strictly inside `files_dir`
///
/// Both paths are first made absolute and lexically normalized, so `..`
/// components cannot climb out. When the path exists its symlinks are then
/// resolved and checked again, so links pointing outside are rejected too.
pub fn ensure_within_files_dir(path: &Path, files_dir: &Path) -> Result<(), ConfigError> {
    let base = normalize(&absolute(files_dir));
    let target = normalize(&absolute(path));
    if !target.starts_with(&base) || target == base {
        return Err(ConfigError::FilesDirEscape);
    }

    if let (Ok(real_base), Ok(real_target)) = (base.canonicalize(), target.canonicalize()) {
        if !real_target.starts_with(&real_base) || real_target == real_base {
            return Err(ConfigError::FilesDirEscape);
        }
    }
    Ok(())
}

/// Read a `local:` file, mapping failures to `open <path>: <reason>`
pub fn read_local(files_dir: Option<&Path>, local: &str) -> Result<Vec<u8>, ConfigError> {
    let path = resolve_local(files_dir, local)?;
    std::fs::read(&path).map_err(|err| ConfigError::Io(format!("open {}: {}", path.display(), err)))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }
    result
}
