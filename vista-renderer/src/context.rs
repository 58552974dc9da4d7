//! [`RenderScope`], the per-call state a view renders against.
//!
//! A scope is created fresh for every top-level [`Renderer::render`] call and
//! dropped when it returns, so blocks, open captures and layout requests never
//! leak between unrelated renders. Views reach every capability (blocks,
//! layouts, sub-views, escaping, extension functions) through the scope.

use tracing::{debug, warn};

use vista_core::{Params, Value};

use crate::blocks::BlockStore;
use crate::capture::OutputCapture;
use crate::engine::Renderer;
use crate::error::ViewError;
use crate::escape;
use crate::resolve::is_separator;

pub struct RenderScope<'r> {
    renderer: &'r Renderer,
    blocks: BlockStore,
    output: OutputCapture,
    pending_layout: Option<String>,
    /// Sub-renders currently in progress.
    nesting: usize,
}

impl<'r> RenderScope<'r> {
    pub(crate) fn new(renderer: &'r Renderer) -> Self {
        Self {
            renderer,
            blocks: BlockStore::new(),
            output: OutputCapture::new(),
            pending_layout: None,
            nesting: 0,
        }
    }

    pub fn renderer(&self) -> &'r Renderer {
        self.renderer
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// Append `text` to the innermost capture frame.
    pub fn write(&mut self, text: &str) {
        self.output.write(text);
    }

    pub fn output_depth(&self) -> usize {
        self.output.depth()
    }

    /// Text written while no capture frame was open.
    pub fn base_output(&self) -> &str {
        self.output.base()
    }

    // -----------------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------------

    pub fn blocks(&self) -> &BlockStore {
        &self.blocks
    }

    pub fn block(&mut self, name: &str, content: impl Into<String>) -> Result<(), ViewError> {
        self.blocks.set(name, content)
    }

    pub fn begin_block(&mut self, name: &str) -> Result<(), ViewError> {
        self.blocks.begin(name, &mut self.output)
    }

    pub fn end_block(&mut self) -> Result<(), ViewError> {
        self.blocks.end(&mut self.output)
    }

    /// Content of block `name`, or `default` if it was never set.
    pub fn render_block(&self, name: &str, default: &str) -> String {
        self.blocks.get_or(name, default).to_string()
    }

    // -----------------------------------------------------------------------
    // Layouts and sub-views
    // -----------------------------------------------------------------------

    /// Request that the current view be wrapped by `name` once it finishes.
    /// A name with no path segments (`""`, `"/"`) clears the request.
    pub fn layout(&mut self, name: &str) {
        let blank = name.split(is_separator).all(str::is_empty);
        self.pending_layout = if blank { None } else { Some(name.to_string()) };
    }

    pub fn pending_layout(&self) -> Option<&str> {
        self.pending_layout.as_deref()
    }

    /// Render `view` with `params` inside this scope and return its output.
    ///
    /// Blocks and the capture stack are shared with the caller. The caller's
    /// pending layout and `"content"` block are put back afterwards, whether
    /// the sub-render succeeds or not.
    ///
    /// Sub-renders may nest at most `max_layout_depth` deep, which bounds
    /// views that render themselves or a layout that renders its own child.
    pub fn render(&mut self, view: &str, params: &Params) -> Result<String, ViewError> {
        let limit = self.renderer.max_layout_depth();
        if self.nesting >= limit {
            warn!(view, limit, "sub-views nested too deep");
            return Err(ViewError::RenderDepthExceeded {
                view: view.to_string(),
                limit,
            });
        }

        let saved_layout = self.pending_layout.take();
        let saved_content = self.blocks.saved_content();
        self.nesting += 1;
        let result = self.compose(view, params);
        self.nesting -= 1;
        self.pending_layout = saved_layout;
        self.blocks.restore_content(saved_content);
        result
    }

    /// Run `view` and then every layout it requests, innermost first.
    pub(crate) fn compose(&mut self, view: &str, params: &Params) -> Result<String, ViewError> {
        let limit = self.renderer.max_layout_depth();
        let mut content = self.render_once(view, params)?;
        let no_params = Params::new();
        let mut hops = 0;

        while let Some(layout) = self.pending_layout.take() {
            hops += 1;
            if hops > limit {
                warn!(view, layout = %layout, limit, "layout chain too long");
                return Err(ViewError::LayoutDepthExceeded {
                    view: view.to_string(),
                    limit,
                });
            }
            debug!(view, layout = %layout, hop = hops, "wrapping content in layout");
            self.blocks.put_content(content);
            content = self.render_once(&layout, &no_params)?;
        }
        Ok(content)
    }

    /// Execute a single view in its own capture frame.
    ///
    /// On failure every frame opened since entry is discarded and the block
    /// capture state is put back as it was, so the output depth always ends
    /// where it started.
    fn render_once(&mut self, view: &str, params: &Params) -> Result<String, ViewError> {
        let renderer = self.renderer;
        let path = renderer.resolver().resolve(view)?;
        debug!(view, path = %path.display(), "rendering view");

        let depth = self.output.depth();
        let capture = self.blocks.active_capture();
        self.pending_layout = None;
        let vars = renderer.merge_vars(params);

        self.output.push();
        let result = match renderer.runner().run(&path, &vars, self) {
            Ok(()) if self.blocks.active_capture() != capture => Err(ViewError::UnclosedBlockCapture {
                name: self.blocks.active().unwrap_or_default().to_string(),
            }),
            other => other,
        };

        match result {
            Ok(()) => Ok(self.output.pop_and_collect().unwrap_or_default()),
            Err(err) => {
                let discarded = self.output.discard_down_to(depth);
                self.blocks.restore_active_capture(capture);
                warn!(view, discarded, error = %err, "render failed, discarded captured output");
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    pub fn esc(&self, text: &str) -> String {
        escape::esc(text)
    }

    /// Call a registered extension function by name.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ViewError> {
        Ok(self.renderer.extensions().call(name, args)?)
    }

    pub fn globals(&self) -> &Params {
        self.renderer.globals()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn renderer() -> (TempDir, Renderer) {
        let dir = TempDir::new().expect("tempdir");
        let renderer = Renderer::new(dir.path()).expect("renderer");
        (dir, renderer)
    }

    #[test]
    fn block_api_on_a_standalone_scope() {
        let (_dir, renderer) = renderer();
        let mut scope = renderer.scope();

        assert_eq!(scope.render_block("title", "fallback"), "fallback");
        scope.block("title", "First").unwrap();
        scope.block("title", "Second").unwrap();
        assert_eq!(scope.render_block("title", ""), "First");

        assert!(matches!(
            scope.block("content", "x"),
            Err(ViewError::ReservedBlockName)
        ));
    }

    #[test]
    fn capture_goes_into_block_not_base_output() {
        let (_dir, renderer) = renderer();
        let mut scope = renderer.scope();

        scope.write("before;");
        scope.begin_block("menu").unwrap();
        assert_eq!(scope.output_depth(), 1);
        scope.write("<nav>Menu</nav>");
        scope.end_block().unwrap();
        scope.write("after");

        assert_eq!(scope.output_depth(), 0);
        assert_eq!(scope.render_block("menu", ""), "<nav>Menu</nav>");
        assert_eq!(scope.base_output(), "before;after");
    }

    #[test]
    fn capture_errors() {
        let (_dir, renderer) = renderer();
        let mut scope = renderer.scope();

        assert!(matches!(scope.end_block(), Err(ViewError::UnmatchedEndCapture)));
        scope.begin_block("a").unwrap();
        let err = scope.begin_block("b").unwrap_err();
        assert!(matches!(err, ViewError::NestedBlockCapture { ref active } if active == "a"));
    }

    #[test]
    fn layout_request_is_recorded() {
        let (_dir, renderer) = renderer();
        let mut scope = renderer.scope();
        assert_eq!(scope.pending_layout(), None);
        scope.layout("layouts/main");
        assert_eq!(scope.pending_layout(), Some("layouts/main"));
    }

    #[test]
    fn blank_layout_name_clears_the_request() {
        let (_dir, renderer) = renderer();
        let mut scope = renderer.scope();
        for blank in ["", "/", "\\/"] {
            scope.layout("layouts/main");
            scope.layout(blank);
            assert_eq!(scope.pending_layout(), None, "{blank:?}");
        }
    }

    #[test]
    fn self_rendering_view_stops_at_the_nesting_limit() {
        let (dir, mut renderer) = renderer();
        std::fs::write(dir.path().join("loop.html"), "x<%= render(\"loop\") %>").expect("write");
        renderer.set_max_layout_depth(4);
        let mut scope = renderer.scope();

        let err = scope.render("loop", &Params::new()).unwrap_err();
        assert!(
            matches!(err, ViewError::RenderDepthExceeded { ref view, limit: 4 } if view == "loop"),
            "got: {err}"
        );
        assert_eq!(scope.output_depth(), 0);
        assert_eq!(scope.nesting, 0);
        assert_eq!(scope.base_output(), "");
    }

    #[test]
    fn sub_render_of_missing_view_keeps_caller_state() {
        let (_dir, renderer) = renderer();
        let mut scope = renderer.scope();
        scope.layout("layouts/main");

        let err = scope.render("missing", &Params::new()).unwrap_err();
        assert!(matches!(err, ViewError::ViewNotFound { .. }));
        assert_eq!(scope.pending_layout(), Some("layouts/main"));
        assert_eq!(scope.output_depth(), 0);
    }
}
