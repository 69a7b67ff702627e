use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, PurgeError>;

/// Typed errors for purge operations.
/// The binary wraps these in `anyhow` at the top level,
/// but modules use them to be precise about failures.
#[derive(Debug, Error)]
pub enum PurgeError {
    /// File system operation failed
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rule set was used without a storage volume bound to it
    #[error("No volume set to purge for rule set '{rule_set}'")]
    NoVolume { rule_set: String },

    /// A rule set references a volume name that is not declared
    #[error("Volume '{name}' is not configured in [volumes]")]
    VolumeNotFound { name: String },

    /// A named rule set is not configured
    #[error("Rule set '{name}' is not configured in [rule_sets]")]
    RuleSetNotFound { name: String },

    /// No cache directory was given or configured
    #[error("No cache directory set (use --path or [cache].path)")]
    NoCacheDirectory,

    /// Configuration file is invalid
    #[error("Config error in '{}': {message}", path.display())]
    ConfigError { path: PathBuf, message: String },
}

impl PurgeError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        PurgeError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether the error is a configuration problem the user has to fix.
    pub fn is_config(&self) -> bool {
        !matches!(self, PurgeError::Io { .. })
    }
}
