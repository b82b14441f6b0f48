//! JSON configuration loader for default attribute registrations.
//!
//! The file holds the same mapping accepted by
//! [`DefaultsRegistry::register_value`]:
//!
//! ```json
//! { "Recipe": ["Author", "PrepTime"] }
//! ```

use super::registry::DefaultsRegistry;
use log::info;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read defaults file `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid JSON in defaults file `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Builds a registry from the built-ins plus the registrations in `path`.
///
/// # Errors
/// - `Io` when the file cannot be read.
/// - `Parse` when the file is not valid JSON. A valid document of the wrong
///   shape is ignored, leaving only the built-ins.
pub fn load_defaults_file(path: impl AsRef<Path>) -> Result<DefaultsRegistry, ConfigError> {
    let mut registry = DefaultsRegistry::with_builtins();
    merge_defaults_file(&mut registry, path)?;
    Ok(registry)
}

/// Merges the registrations in `path` into an existing registry.
///
/// Returns the newly accepted type names.
pub fn merge_defaults_file(
    registry: &mut DefaultsRegistry,
    path: impl AsRef<Path>,
) -> Result<Vec<String>, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let accepted = registry.register_value(&value);
    info!(
        "event=defaults_load module=defaults status=ok accepted={}",
        accepted.len()
    );
    Ok(accepted)
}
