//! Shared types for the vista crates.
//!
//! Values and params, the extension registry, configuration and errors.
//!
//! - [`types`]: [`Value`] / [`Params`] and their text form
//! - [`extension`]: [`Extension`] providers and [`ExtensionRegistry`]
//! - [`config`]: [`RendererConfig`] / [`AssetConfig`] loaded from YAML
//! - [`error`]: [`ExtensionError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod extension;
pub mod types;

pub use config::{AssetConfig, RendererConfig, DEFAULT_FILE_EXTENSION, DEFAULT_MAX_LAYOUT_DEPTH};
pub use error::{ConfigError, ExtensionError};
pub use extension::{DispatchError, Extension, ExtensionRegistry};
pub use types::{into_params, kind_name, to_text, Params, Value};
