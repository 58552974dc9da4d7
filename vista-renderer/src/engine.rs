//! The long-lived [`Renderer`] and the [`ViewRunner`] seam.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use vista_core::{
    into_params, kind_name, Extension, ExtensionRegistry, Params, RendererConfig, Value,
    DEFAULT_FILE_EXTENSION, DEFAULT_MAX_LAYOUT_DEPTH,
};

use crate::context::RenderScope;
use crate::error::ViewError;
use crate::escape;
use crate::resolve::ViewResolver;
use crate::script::ScriptRunner;

// ---------------------------------------------------------------------------
// ViewRunner
// ---------------------------------------------------------------------------

/// Executes one resolved view file.
///
/// The renderer has already opened a capture frame for the view; a runner
/// produces output only by writing into `scope`.
pub trait ViewRunner: Send + Sync {
    fn run(&self, path: &Path, vars: &Params, scope: &mut RenderScope<'_>) -> Result<(), ViewError>;
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Resolves and renders views under a fixed root.
///
/// Configure globals and extensions during setup, then call [`Renderer::render`]
/// as often as needed. Rendering takes `&self`, so a configured renderer can
/// be shared across threads.
pub struct Renderer {
    resolver: ViewResolver,
    globals: Params,
    extensions: ExtensionRegistry,
    runner: Box<dyn ViewRunner>,
    max_layout_depth: usize,
}

impl Renderer {
    /// Renderer for views under `view_root` with the default `.html` extension.
    pub fn new(view_root: impl AsRef<Path>) -> Result<Self, ViewError> {
        Self::with_file_extension(view_root, DEFAULT_FILE_EXTENSION)
    }

    /// Renderer appending `file_extension` to view names that lack one.
    /// An empty extension disables appending.
    pub fn with_file_extension(view_root: impl AsRef<Path>, file_extension: &str) -> Result<Self, ViewError> {
        Ok(Self {
            resolver: ViewResolver::new(view_root, file_extension)?,
            globals: Params::new(),
            extensions: ExtensionRegistry::new(),
            runner: Box::new(ScriptRunner),
            max_layout_depth: DEFAULT_MAX_LAYOUT_DEPTH,
        })
    }

    /// Build a renderer from configuration, registering its globals.
    pub fn from_config(config: &RendererConfig) -> Result<Self, ViewError> {
        let mut renderer = Self::with_file_extension(&config.view_root, &config.file_extension)?;
        renderer.set_max_layout_depth(config.max_layout_depth);
        for (name, value) in &config.globals {
            renderer.add_global(name.clone(), value.clone())?;
        }
        Ok(renderer)
    }

    /// Read a YAML configuration file and build a renderer from it.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self, ViewError> {
        let config = RendererConfig::load(config_path.as_ref())?;
        debug!(config = %config_path.as_ref().display(), "loaded renderer configuration");
        Self::from_config(&config)
    }

    pub fn set_runner(&mut self, runner: impl ViewRunner + 'static) {
        self.runner = Box::new(runner);
    }

    /// Maximum number of layout hops per render chain.
    pub fn set_max_layout_depth(&mut self, depth: usize) {
        self.max_layout_depth = depth;
    }

    /// Register an extension provider. A provider of the same type replaces
    /// the earlier one.
    pub fn add_extension<E: Extension>(&mut self, extension: E) {
        self.extensions.register(extension);
    }

    /// Add a variable visible to every view. Each name can only be added once.
    pub fn add_global(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), ViewError> {
        let name = name.into();
        if self.globals.contains_key(&name) {
            return Err(ViewError::DuplicateGlobal { name });
        }
        debug!(global = %name, "added global variable");
        self.globals.insert(name, value.into());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Render `view` with `params` and every layout it requests.
    pub fn render(&self, view: &str, params: &Params) -> Result<String, ViewError> {
        debug!(view, params = params.len(), "render");
        self.scope().compose(view, params)
    }

    /// Like [`Renderer::render`], taking any value that serializes to a map.
    pub fn render_with<T: Serialize>(&self, view: &str, params: &T) -> Result<String, ViewError> {
        let params = into_params(serde_json::to_value(params)?).map_err(|value| ViewError::InvalidParams {
            kind: kind_name(&value),
        })?;
        self.render(view, &params)
    }

    /// A fresh, empty scope for driving the block and capture API directly.
    pub fn scope(&self) -> RenderScope<'_> {
        RenderScope::new(self)
    }

    pub fn esc(&self, text: &str) -> String {
        escape::esc(text)
    }

    /// Call a registered extension function outside of any view.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ViewError> {
        Ok(self.extensions.call(name, args)?)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn view_root(&self) -> &Path {
        self.resolver.root()
    }

    pub fn file_extension(&self) -> &str {
        self.resolver.extension()
    }

    pub fn resolver(&self) -> &ViewResolver {
        &self.resolver
    }

    pub fn globals(&self) -> &Params {
        &self.globals
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    pub fn max_layout_depth(&self) -> usize {
        self.max_layout_depth
    }

    pub(crate) fn runner(&self) -> &dyn ViewRunner {
        self.runner.as_ref()
    }

    /// Globals overlaid with `params`; params win on collision.
    pub(crate) fn merge_vars(&self, params: &Params) -> Params {
        let mut vars = self.globals.clone();
        vars.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("resolver", &self.resolver)
            .field("globals", &self.globals)
            .field("extensions", &self.extensions)
            .field("max_layout_depth", &self.max_layout_depth)
            .finish_non_exhaustive()
    }
}
