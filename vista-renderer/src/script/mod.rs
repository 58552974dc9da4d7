//! The default view format and its runner.
//!
//! A view is literal text with embedded tags:
//!
//! ```text
//! <% layout("layouts/main") -%>
//! <% block("title", "Users") %>
//! <ul>
//! <% for user in users %>
//!   <li><%= esc(user.name) %></li>
//! <% end %>
//! </ul>
//! <%= this.render("partials/footer", { year: year ?? 2024 }) %>
//! ```
//!
//! - `<%= expr %>` writes the text form of `expr`
//! - `<% ... %>` runs statements (`let x = expr;`, calls) or a single control
//!   keyword: `if expr`, `else`, `for name in expr`, `end`
//! - `<%# ... %>` is a comment
//!
//! A closing `-%>` also drops the newline right after the tag. Calls to names
//! other than the scope built-ins go to the renderer's extensions.

mod ast;
mod interp;
mod lexer;
mod parser;

use std::fs;
use std::path::{Path, PathBuf};

use vista_core::Params;

use crate::context::RenderScope;
use crate::engine::ViewRunner;
use crate::error::{io_err, ViewError};

use self::ast::Node;
use self::interp::Interpreter;

/// A parsed view, ready to be executed any number of times.
#[derive(Debug, Clone)]
pub struct Template {
    origin: PathBuf,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse `source`; `origin` is only used in error messages.
    pub fn parse(source: &str, origin: &Path) -> Result<Self, ViewError> {
        Ok(Self {
            origin: origin.to_path_buf(),
            nodes: parser::parse(source, origin)?,
        })
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Run the template with `vars` as its bindings, writing into `scope`.
    pub fn execute(&self, vars: &Params, scope: &mut RenderScope<'_>) -> Result<(), ViewError> {
        Interpreter::new(scope, vars).exec(&self.nodes)
    }
}

/// Reads, parses and runs view files on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptRunner;

impl ViewRunner for ScriptRunner {
    fn run(&self, path: &Path, vars: &Params, scope: &mut RenderScope<'_>) -> Result<(), ViewError> {
        let source = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Template::parse(&source, path)?.execute(vars, scope)
    }
}
