//! Named content blocks for one render chain.
//!
//! Blocks are write-once: the first write for a name wins and later writes
//! are ignored. The name `"content"` is reserved for the layout loop, which
//! writes it through [`BlockStore::put_content`].

use std::collections::HashMap;

use crate::capture::OutputCapture;
use crate::error::ViewError;

/// Block that receives a view's output when it is wrapped by a layout.
pub const CONTENT_BLOCK: &str = "content";

/// An open block capture and the output depth its frame sits at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActiveCapture {
    name: String,
    depth: usize,
}

#[derive(Debug, Default)]
pub struct BlockStore {
    blocks: HashMap<String, String>,
    active: Option<ActiveCapture>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `content` under `name`.
    ///
    /// Fails for the reserved name. Empty names and names already present are
    /// silently ignored.
    pub fn set(&mut self, name: &str, content: impl Into<String>) -> Result<(), ViewError> {
        if name == CONTENT_BLOCK {
            return Err(ViewError::ReservedBlockName);
        }
        if name.is_empty() || self.blocks.contains_key(name) {
            return Ok(());
        }
        self.blocks.insert(name.to_string(), content.into());
        Ok(())
    }

    /// Overwrite the reserved `"content"` block, returning the previous value.
    pub fn put_content(&mut self, content: String) -> Option<String> {
        self.blocks.insert(CONTENT_BLOCK.to_string(), content)
    }

    /// Put back a `"content"` block saved from [`BlockStore::put_content`]
    /// or [`BlockStore::saved_content`].
    pub fn restore_content(&mut self, saved: Option<String>) {
        match saved {
            Some(content) => {
                self.blocks.insert(CONTENT_BLOCK.to_string(), content);
            }
            None => {
                self.blocks.remove(CONTENT_BLOCK);
            }
        }
    }

    /// Copy of the current `"content"` block, for a later [`BlockStore::restore_content`].
    pub fn saved_content(&self) -> Option<String> {
        self.blocks.get(CONTENT_BLOCK).cloned()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.blocks.get(name).map(String::as_str)
    }

    /// Stored content for `name`, or `fallback` when absent.
    pub fn get_or<'a>(&'a self, name: &str, fallback: &'a str) -> &'a str {
        self.get(name).unwrap_or(fallback)
    }

    /// Name of the block currently being captured.
    pub fn active(&self) -> Option<&str> {
        self.active.as_ref().map(|capture| capture.name.as_str())
    }

    pub(crate) fn active_capture(&self) -> Option<ActiveCapture> {
        self.active.clone()
    }

    pub(crate) fn restore_active_capture(&mut self, capture: Option<ActiveCapture>) {
        self.active = capture;
    }

    /// Start capturing output into block `name`. Captures do not nest.
    pub fn begin(&mut self, name: &str, output: &mut OutputCapture) -> Result<(), ViewError> {
        if let Some(active) = &self.active {
            return Err(ViewError::NestedBlockCapture {
                active: active.name.clone(),
            });
        }
        output.push();
        self.active = Some(ActiveCapture {
            name: name.to_string(),
            depth: output.depth(),
        });
        Ok(())
    }

    /// Stop the active capture and store what it collected.
    ///
    /// The capture frame must be the innermost open frame; a capture begun
    /// by an enclosing view cannot be ended from inside a sub-view.
    pub fn end(&mut self, output: &mut OutputCapture) -> Result<(), ViewError> {
        match &self.active {
            Some(active) if active.depth == output.depth() => {}
            _ => return Err(ViewError::UnmatchedEndCapture),
        }
        let name = self.active.take().map(|capture| capture.name).unwrap_or_default();
        let captured = output.pop_and_collect().unwrap_or_default();
        self.set(&name, captured)
    }
}
