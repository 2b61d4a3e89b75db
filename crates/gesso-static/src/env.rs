//! Env file loading.
//!
//! Variables from the project env file are exposed to templates under the
//! `env` name. Loading is explicit: callers get back `Ok(None)` for a missing
//! file and decide how loudly to complain, rather than the file being slurped
//! into process state as a side effect.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Errors that can occur reading an env file.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("Failed to parse env file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Load variables from an env file.
///
/// Returns `Ok(None)` when the file does not exist; a present but malformed
/// file is an error. Variables are returned as a sorted map and are not
/// injected into the process environment.
pub fn load_env(path: &Path) -> Result<Option<BTreeMap<String, String>>, EnvError> {
    if !path.exists() {
        return Ok(None);
    }

    let mut vars = BTreeMap::new();
    let iter = dotenvy::from_path_iter(path).map_err(|e| EnvError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    for item in iter {
        let (key, value) = item.map_err(|e| EnvError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        vars.insert(key, value);
    }

    Ok(Some(vars))
}
