//! Renderer configuration loaded from YAML.
//!
//! ```yaml
//! view_root: /srv/app/views
//! file_extension: html
//! max_layout_depth: 8
//! globals:
//!   site_name: Example
//! assets:
//!   base_path: /srv/app/public
//!   base_url: https://cdn.example.com
//!   append_timestamp: true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Params;

/// File suffix appended to view names that carry none.
pub const DEFAULT_FILE_EXTENSION: &str = "html";

/// Maximum number of layout hops in a single render chain.
pub const DEFAULT_MAX_LAYOUT_DEPTH: usize = 16;

fn default_file_extension() -> String {
    DEFAULT_FILE_EXTENSION.to_string()
}

fn default_max_layout_depth() -> usize {
    DEFAULT_MAX_LAYOUT_DEPTH
}

/// Top-level renderer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Base directory for view lookup.
    pub view_root: PathBuf,
    /// Suffix appended when a view name has no extension. Empty disables it.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    #[serde(default = "default_max_layout_depth")]
    pub max_layout_depth: usize,
    /// Variables visible to every view unless shadowed by a parameter.
    #[serde(default)]
    pub globals: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetConfig>,
}

/// Settings for the asset URL helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Directory holding the published asset files.
    pub base_path: PathBuf,
    /// URL prefix the published files are served under.
    #[serde(default)]
    pub base_url: String,
    /// Append `?v=<mtime>` to every asset URL.
    #[serde(default)]
    pub append_timestamp: bool,
}

impl RendererConfig {
    /// Config with defaults for everything but the view root.
    pub fn new(view_root: impl Into<PathBuf>) -> Self {
        Self {
            view_root: view_root.into(),
            file_extension: default_file_extension(),
            max_layout_depth: default_max_layout_depth(),
            globals: Params::new(),
            assets: None,
        }
    }

    /// Load a config file.
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Parse` (with path + line context) if it is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse config from YAML text; errors are reported against `<inline>`.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg = RendererConfig::from_yaml_str("view_root: /views\n").expect("parse");
        assert_eq!(cfg, RendererConfig::new("/views"));
        assert_eq!(cfg.file_extension, "html");
        assert_eq!(cfg.max_layout_depth, DEFAULT_MAX_LAYOUT_DEPTH);
        assert!(cfg.assets.is_none());
    }

    #[test]
    fn missing_view_root_is_a_parse_error() {
        let err = RendererConfig::from_yaml_str("file_extension: tpl\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains("<inline>"));
    }
}
