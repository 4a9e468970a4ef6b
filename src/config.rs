//! Configuration types for dialog-media-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How the base directory holding the export and the output is located
///
/// The export is read from `<base>/<export_dir_name>` and media is written to
/// `<base>/<output_dir_name>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootResolver {
    /// Directory containing the running executable
    #[default]
    ExecutableDir,
    /// Explicit directory (relative paths resolve against the working directory)
    Fixed(PathBuf),
}

impl RootResolver {
    /// Resolve the base directory
    ///
    /// # Errors
    /// Returns [`Error::RootResolution`] if the executable path cannot be determined
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            RootResolver::Fixed(path) => Ok(path.clone()),
            RootResolver::ExecutableDir => {
                let exe = std::env::current_exe()
                    .map_err(|e| Error::RootResolution(format!("current_exe() failed: {}", e)))?;
                exe.parent().map(Path::to_path_buf).ok_or_else(|| {
                    Error::RootResolution(format!(
                        "executable path {} has no parent directory",
                        exe.display()
                    ))
                })
            }
        }
    }
}

/// Main configuration for [`Extractor`](crate::Extractor)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base directory resolution strategy (default: executable directory)
    #[serde(default)]
    pub root: RootResolver,

    /// Name of the export directory under the base (default: "messages")
    #[serde(default = "default_export_dir_name")]
    pub export_dir_name: String,

    /// Name of the output directory under the base (default: "files")
    #[serde(default = "default_output_dir_name")]
    pub output_dir_name: String,

    /// Maximum dialogs processed in parallel (default: 4)
    #[serde(default = "default_max_concurrent_dialogs")]
    pub max_concurrent_dialogs: usize,

    /// Maximum attachment downloads in flight per dialog (default: 8)
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Per-request timeout in seconds (None = HTTP client default)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// User-Agent header sent with attachment requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: RootResolver::default(),
            export_dir_name: default_export_dir_name(),
            output_dir_name: default_output_dir_name(),
            max_concurrent_dialogs: default_max_concurrent_dialogs(),
            max_concurrent_downloads: default_max_concurrent_downloads(),
            request_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file; missing fields take their defaults
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// # Errors
    /// Returns [`Error::ConfigFormat`] if the content is not valid TOML for [`Config`]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check settings that serde cannot express
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the offending key
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_dialogs == 0 {
            return Err(Error::Config {
                message: "max_concurrent_dialogs must be at least 1".to_string(),
                key: Some("max_concurrent_dialogs".to_string()),
            });
        }
        if self.max_concurrent_downloads == 0 {
            return Err(Error::Config {
                message: "max_concurrent_downloads must be at least 1".to_string(),
                key: Some("max_concurrent_downloads".to_string()),
            });
        }
        for (key, value) in [
            ("export_dir_name", &self.export_dir_name),
            ("output_dir_name", &self.output_dir_name),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("{} must not be empty", key),
                    key: Some(key.to_string()),
                });
            }
        }
        Ok(())
    }

    /// Per-request timeout, if configured
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Resolve the export root and output root directories
    ///
    /// # Errors
    /// Returns an error if the base directory cannot be resolved
    pub fn resolve_roots(&self) -> Result<(PathBuf, PathBuf)> {
        let base = self.root.resolve()?;
        Ok((
            base.join(&self.export_dir_name),
            base.join(&self.output_dir_name),
        ))
    }
}

fn default_export_dir_name() -> String {
    "messages".to_string()
}

fn default_output_dir_name() -> String {
    "files".to_string()
}

fn default_max_concurrent_dialogs() -> usize {
    4
}

fn default_max_concurrent_downloads() -> usize {
    8
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}
