//! HTML escaping for view output.

/// Convert HTML special characters into character references.
///
/// `&`, `<`, `>`, `"`, `'` and `/` are encoded; everything else passes
/// through unchanged. Existing references are encoded again.
///
/// The output is tera's: `'` becomes `&#x27;` and `/` becomes `&#x2F;`.
/// Encoders that write `&#039;` and leave `/` alone produce different bytes
/// that decode to the same text.
pub fn esc(content: &str) -> String {
    tera::escape_html(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_tag_is_neutralised() {
        assert_eq!(
            esc("<script>alert(123);</script>"),
            "&lt;script&gt;alert(123);&lt;&#x2F;script&gt;"
        );
    }

    #[test]
    fn quotes_and_ampersands_are_encoded() {
        let escaped = esc(r#"Tom & "Jerry" 'cat'"#);
        assert_eq!(escaped, "Tom &amp; &quot;Jerry&quot; &#x27;cat&#x27;");
        assert!(!escaped.contains(&['<', '>', '"', '\''][..]));
    }

    #[test]
    fn slashes_are_encoded() {
        assert_eq!(esc("a/b"), "a&#x2F;b");
        assert_eq!(esc("</p>"), "&lt;&#x2F;p&gt;");
    }

    #[test]
    fn references_are_encoded_again() {
        assert_eq!(esc("&amp;"), "&amp;amp;");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(esc("Page Title"), "Page Title");
    }
}
