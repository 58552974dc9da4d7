//! Asset URLs for views.
//!
//! [`AssetExtension`] exposes a single `asset(file)` function that maps a
//! published file to its public URL, optionally cache-busted with the file's
//! modification time:
//!
//! ```text
//! <link rel="stylesheet" href="<%= asset("css/site.css") %>">
//! <!-- https://cdn.example.com/css/site.css?v=1718035200 -->
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use vista_core::{AssetConfig, Extension, ExtensionError, Value};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset file \"{path}\" does not exist")]
    NotFound { path: PathBuf },

    #[error("asset I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<AssetError> for ExtensionError {
    fn from(err: AssetError) -> Self {
        ExtensionError::Failed(Box::new(err))
    }
}

// ---------------------------------------------------------------------------
// Extension
// ---------------------------------------------------------------------------

/// Name of the view function provided by [`AssetExtension`].
pub const ASSET_FUNCTION: &str = "asset";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetExtension {
    base_path: String,
    base_url: String,
    append_timestamp: bool,
}

impl AssetExtension {
    /// `base_path` is the directory holding published files and `base_url`
    /// the prefix they are served under. Trailing slashes (and backslashes,
    /// for the path) are dropped from both.
    pub fn new(base_path: impl AsRef<Path>, base_url: &str, append_timestamp: bool) -> Self {
        let base_path = base_path.as_ref().to_string_lossy();
        Self {
            base_path: base_path.trim_end_matches(&['/', '\\'][..]).to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            append_timestamp,
        }
    }

    pub fn from_config(config: &AssetConfig) -> Self {
        Self::new(&config.base_path, &config.base_url, config.append_timestamp)
    }

    pub fn base_path(&self) -> &Path {
        Path::new(&self.base_path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public URL of `file`, which must exist under the base path.
    pub fn asset_url(&self, file: &str) -> Result<String, AssetError> {
        let file = file.trim_start_matches('/');
        let url = format!("{}/{}", self.base_url, file);
        let path = PathBuf::from(format!("{}/{}", self.base_path, file));

        if !path.is_file() {
            return Err(AssetError::NotFound { path });
        }
        if !self.append_timestamp {
            return Ok(url);
        }

        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            })?;
        let version = DateTime::<Utc>::from(modified).timestamp();
        debug!(asset = %path.display(), version, "timestamped asset url");
        Ok(format!("{url}?v={version}"))
    }
}

impl Extension for AssetExtension {
    fn functions(&self) -> &[&'static str] {
        &[ASSET_FUNCTION]
    }

    fn call(&self, function: &str, args: &[Value]) -> Result<Value, ExtensionError> {
        match args {
            [Value::String(file)] => Ok(Value::String(self.asset_url(file)?)),
            _ => Err(ExtensionError::invalid_argument(function, "a single file path string")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_base_path_and_url() {
        let ext = AssetExtension::new("/srv/public/\\/", "https://cdn.example.com///", false);
        assert_eq!(ext.base_path(), Path::new("/srv/public"));
        assert_eq!(ext.base_url(), "https://cdn.example.com");
    }

    #[test]
    fn empty_base_url_yields_root_relative_urls() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("app.js"), "").unwrap();
        let ext = AssetExtension::new(dir.path(), "", false);
        assert_eq!(ext.asset_url("app.js").unwrap(), "/app.js");
    }

    #[test]
    fn call_validates_arguments() {
        let ext = AssetExtension::new("/srv/public", "", false);
        let err = ext.call(ASSET_FUNCTION, &[]).unwrap_err();
        assert_eq!(err.to_string(), "asset() expects a single file path string");
        let err = ext.call(ASSET_FUNCTION, &[Value::from(1)]).unwrap_err();
        assert!(matches!(err, ExtensionError::InvalidArgument { .. }));
    }

    #[test]
    fn missing_asset_becomes_extension_failure() {
        let ext = AssetExtension::new("/definitely/not/here", "", false);
        let err = ext.call(ASSET_FUNCTION, &[Value::from("x.css")]).unwrap_err();
        assert!(matches!(err, ExtensionError::Failed(_)));
        assert_eq!(
            err.to_string(),
            "asset file \"/definitely/not/here/x.css\" does not exist"
        );
    }
}
