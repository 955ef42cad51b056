//! Path resolution for the model root and the persisted document files.
//!
//! The models directory resolves from an explicit override, the
//! `MODELVAULT_MODELS_DIR` environment variable, or a platform default under
//! the user's data directory, in that order. Document files (catalog, config,
//! presets) live next to the models directory.

use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default relative location for modelvault data under the user's data dir.
pub const DEFAULT_DATA_DIR_RELATIVE: &str = "modelvault";

/// Environment variable overriding the models directory.
pub const MODELS_DIR_ENV: &str = "MODELVAULT_MODELS_DIR";

/// Errors from path resolution and directory handling.
#[derive(Debug, Error)]
pub enum PathError {
    /// The platform data directory could not be determined.
    #[error("Could not determine the user data directory")]
    NoDataDir,

    /// The path exists but is not a directory.
    #[error("Path exists but is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Directory creation failed.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// The directory is not writable.
    #[error("Directory is not writable {path}: {reason}")]
    NotWritable { path: PathBuf, reason: String },

    /// An atomic file write failed.
    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// How the models directory was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelsDirSource {
    /// The caller passed an explicit path (CLI flag or API argument).
    Explicit,
    /// The path came from `MODELVAULT_MODELS_DIR`.
    EnvVar,
    /// Platform default under the user's data directory.
    Default,
}

/// Resolution result for the models directory.
#[derive(Debug, Clone)]
pub struct ModelsDirResolution {
    /// The resolved path to the models directory.
    pub path: PathBuf,
    /// How the path was determined.
    pub source: ModelsDirSource,
}

/// Return the platform-specific modelvault data directory.
pub fn default_data_dir() -> Result<PathBuf, PathError> {
    let data = dirs::data_dir().ok_or(PathError::NoDataDir)?;
    Ok(data.join(DEFAULT_DATA_DIR_RELATIVE))
}

/// Return the default models directory (`<data dir>/models`).
pub fn default_models_dir() -> Result<PathBuf, PathError> {
    Ok(default_data_dir()?.join("models"))
}

/// Resolve the models directory from an explicit override, env var, or default.
pub fn resolve_models_dir(explicit: Option<&str>) -> Result<ModelsDirResolution, PathError> {
    if let Some(path_str) = explicit {
        return Ok(ModelsDirResolution {
            path: PathBuf::from(path_str),
            source: ModelsDirSource::Explicit,
        });
    }

    if let Ok(env_path) = env::var(MODELS_DIR_ENV) {
        if !env_path.trim().is_empty() {
            return Ok(ModelsDirResolution {
                path: PathBuf::from(env_path),
                source: ModelsDirSource::EnvVar,
            });
        }
    }

    Ok(ModelsDirResolution {
        path: default_models_dir()?,
        source: ModelsDirSource::Default,
    })
}

/// Path of the persisted user config file.
pub fn config_path() -> Result<PathBuf, PathError> {
    Ok(default_data_dir()?.join("config.json"))
}

/// Path of the asset catalog file.
pub fn catalog_path() -> Result<PathBuf, PathError> {
    Ok(default_data_dir()?.join("models.json"))
}

/// Path of the preset catalog file.
pub fn presets_path() -> Result<PathBuf, PathError> {
    Ok(default_data_dir()?.join("presets.json"))
}

/// Ensure the provided directory exists and is writable.
///
/// Creates the directory (and parents) if missing, then verifies writability
/// by creating and removing a probe file.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
    } else {
        fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    verify_writable(path)
}

/// Verify a directory is writable by attempting to create a test file.
fn verify_writable(path: &Path) -> Result<(), PathError> {
    let test_file = path.join(".modelvault_write_test");
    let result = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&test_file);

    match result {
        Ok(mut file) => {
            file.write_all(b"test").map_err(|e| PathError::NotWritable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            drop(file);
            let _ = fs::remove_file(&test_file);
            Ok(())
        }
        Err(err) => Err(PathError::NotWritable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

/// Replace a file's contents atomically.
///
/// Writes to a sibling `.tmp` file and renames into place, so readers never
/// observe a partially written document. The parent directory is created if
/// missing.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PathError> {
    let wrap = |e: std::io::Error| PathError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(wrap)?;
    }

    let tmp = sibling_tmp_path(path);
    fs::write(&tmp, contents).map_err(wrap)?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        wrap(e)
    })
}

fn sibling_tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| std::ffi::OsString::from("file"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}
