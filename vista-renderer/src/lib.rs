//! # vista-renderer
//!
//! View rendering with named blocks and layouts.
//!
//! A [`Renderer`] resolves a view name to a file under its view root, runs
//! it in a fresh [`RenderScope`] and, when the view asked for a layout,
//! renders the layout with the view's output available as the `"content"`
//! block. Layouts can request layouts of their own.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vista_renderer::{Params, Renderer};
//!
//! fn render_home() -> Result<String, vista_renderer::ViewError> {
//!     let mut renderer = Renderer::new("/srv/app/views")?;
//!     renderer.add_global("site_name", "Example")?;
//!     let mut params = Params::new();
//!     params.insert("user".into(), "Ada".into());
//!     renderer.render("pages/home", &params)
//! }
//! ```

pub mod blocks;
pub mod capture;
pub mod context;
pub mod engine;
pub mod error;
pub mod escape;
pub mod resolve;
pub mod script;

pub use blocks::{BlockStore, CONTENT_BLOCK};
pub use capture::OutputCapture;
pub use context::RenderScope;
pub use engine::{Renderer, ViewRunner};
pub use error::ViewError;
pub use escape::esc;
pub use resolve::ViewResolver;
pub use script::{ScriptRunner, Template};
pub use vista_core::{Extension, ExtensionError, Params, Value};
