//! Stack-discipline output capture.
//!
//! Every write lands in the innermost open frame. Writes made with no frame
//! open go to the base buffer, which plays the role of unbuffered output for
//! a scope driven directly rather than through a render call.

/// A stack of text capture frames.
#[derive(Debug, Default)]
pub struct OutputCapture {
    base: String,
    frames: Vec<String>,
}

impl OutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Open a new frame.
    pub fn push(&mut self) {
        self.frames.push(String::new());
    }

    /// Close the innermost frame and return what it collected.
    pub fn pop_and_collect(&mut self) -> Option<String> {
        self.frames.pop()
    }

    /// Drop frames until at most `depth` remain; their content is lost.
    /// Returns the number of frames discarded.
    pub fn discard_down_to(&mut self, depth: usize) -> usize {
        let extra = self.frames.len().saturating_sub(depth);
        self.frames.truncate(depth);
        extra
    }

    pub fn write(&mut self, text: &str) {
        match self.frames.last_mut() {
            Some(frame) => frame.push_str(text),
            None => self.base.push_str(text),
        }
    }

    /// Text written while no frame was open.
    pub fn base(&self) -> &str {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_go_to_innermost_frame() {
        let mut out = OutputCapture::new();
        out.push();
        out.write("outer ");
        out.push();
        out.write("inner");
        assert_eq!(out.depth(), 2);
        assert_eq!(out.pop_and_collect().as_deref(), Some("inner"));
        out.write("again");
        assert_eq!(out.pop_and_collect().as_deref(), Some("outer again"));
        assert_eq!(out.pop_and_collect(), None);
        assert_eq!(out.base(), "");
    }

    #[test]
    fn write_without_frame_goes_to_base() {
        let mut out = OutputCapture::new();
        out.write("direct");
        assert_eq!(out.depth(), 0);
        assert_eq!(out.base(), "direct");
    }

    #[test]
    fn discard_restores_recorded_depth() {
        let mut out = OutputCapture::new();
        out.push();
        let depth = out.depth();
        out.push();
        out.push();
        out.write("lost");
        assert_eq!(out.discard_down_to(depth), 2);
        assert_eq!(out.depth(), depth);
        assert_eq!(out.discard_down_to(depth), 0);
        assert_eq!(out.pop_and_collect().as_deref(), Some(""));
    }
}
