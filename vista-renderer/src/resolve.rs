//! Mapping logical view names to files under the view root.

use std::path::{Path, PathBuf};

use crate::error::ViewError;

pub(crate) fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Resolves view names such as `"layouts/main"` to files.
#[derive(Debug, Clone)]
pub struct ViewResolver {
    root: PathBuf,
    extension: String,
}

impl ViewResolver {
    /// Build a resolver rooted at `root`.
    ///
    /// Trailing separators are trimmed from `root`, and leading dots from
    /// `extension` (`".html"` and `"html"` are equivalent). Fails with
    /// `ViewError::ViewDirectoryNotFound` if `root` is not a directory.
    pub fn new(root: impl AsRef<Path>, extension: &str) -> Result<Self, ViewError> {
        let raw = root.as_ref().to_string_lossy();
        let trimmed = raw.trim_end_matches(is_separator);
        let root = if trimmed.is_empty() && !raw.is_empty() {
            PathBuf::from("/")
        } else {
            PathBuf::from(trimmed)
        };
        if !root.is_dir() {
            return Err(ViewError::ViewDirectoryNotFound { path: root });
        }
        Ok(Self {
            root,
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path a view name maps to, without touching the filesystem.
    ///
    /// Leading and trailing separators are ignored and either separator
    /// style is accepted. The default extension is appended when the last
    /// segment has none. A name with no segments at all (`""`, `"/"`) names
    /// no view and fails with `ViewError::ViewNotFound`.
    pub fn path_for(&self, view: &str) -> Result<PathBuf, ViewError> {
        let mut segments = view.split(is_separator).filter(|s| !s.is_empty()).peekable();
        if segments.peek().is_none() {
            return Err(ViewError::ViewNotFound {
                path: self.root.clone(),
            });
        }
        let mut path = self.root.clone();
        path.extend(segments);
        if !self.extension.is_empty() && path.extension().is_none() {
            let mut name = path.into_os_string();
            name.push(".");
            name.push(&self.extension);
            path = PathBuf::from(name);
        }
        Ok(path)
    }

    /// Resolve `view` to an existing regular file.
    pub fn resolve(&self, view: &str) -> Result<PathBuf, ViewError> {
        let path = self.path_for(view)?;
        if !path.is_file() {
            return Err(ViewError::ViewNotFound { path });
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ViewResolver) {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir_all(dir.path().join("views")).expect("mkdir");
        fs::write(dir.path().join("views/single.html"), "<p>Content</p>").expect("write");
        fs::write(dir.path().join("views/raw.txt"), "raw").expect("write");
        let resolver = ViewResolver::new(dir.path(), "html").expect("resolver");
        (dir, resolver)
    }

    #[rstest]
    #[case("views/single")]
    #[case("/views/single/")]
    #[case("\\views/single\\")]
    #[case("\\/\\/views/single/\\///")]
    #[case("views\\single")]
    #[case("views//single")]
    #[case("views/single.html")]
    fn names_normalise_to_same_file(#[case] name: &str) {
        let (dir, resolver) = fixture();
        let expected = dir.path().join("views").join("single.html");
        assert_eq!(resolver.resolve(name).expect("resolve"), expected);
    }

    #[test]
    fn explicit_extension_is_kept() {
        let (dir, resolver) = fixture();
        assert_eq!(
            resolver.resolve("views/raw.txt").expect("resolve"),
            dir.path().join("views").join("raw.txt")
        );
    }

    #[test]
    fn empty_extension_appends_nothing() {
        let (dir, _) = fixture();
        let resolver = ViewResolver::new(dir.path(), "").expect("resolver");
        assert_eq!(
            resolver.path_for("views/single").expect("path"),
            dir.path().join("views").join("single")
        );
        assert!(matches!(
            resolver.resolve("views/single"),
            Err(ViewError::ViewNotFound { .. })
        ));
    }

    #[test]
    fn leading_dot_in_extension_is_dropped() {
        let (dir, _) = fixture();
        let resolver = ViewResolver::new(dir.path(), ".html").expect("resolver");
        assert_eq!(resolver.extension(), "html");
        assert!(resolver.resolve("views/single").is_ok());
    }

    #[test]
    fn missing_view_reports_resolved_path() {
        let (_dir, resolver) = fixture();
        let err = resolver.resolve("views/absent").unwrap_err();
        assert!(matches!(err, ViewError::ViewNotFound { .. }), "got: {err}");
        assert!(err.to_string().contains("absent.html"));
    }

    #[test]
    fn directory_is_not_a_view() {
        let (dir, _) = fixture();
        let resolver = ViewResolver::new(dir.path(), "").expect("resolver");
        assert!(matches!(resolver.resolve("views"), Err(ViewError::ViewNotFound { .. })));
    }

    #[rstest]
    #[case("")]
    #[case("/")]
    #[case("\\//\\")]
    fn name_without_segments_is_not_a_view(#[case] name: &str) {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path().join("views");
        fs::create_dir_all(&root).expect("mkdir");
        fs::write(dir.path().join("views.html"), "outside the root").expect("write");
        let resolver = ViewResolver::new(&root, "html").expect("resolver");

        let err = resolver.resolve(name).unwrap_err();
        assert!(
            matches!(err, ViewError::ViewNotFound { ref path } if path == &root),
            "got: {err}"
        );
    }

    #[rstest]
    #[case("////")]
    #[case("\\\\")]
    #[case("\\/\\/")]
    fn root_trailing_separators_are_trimmed(#[case] suffix: &str) {
        let (dir, _) = fixture();
        let root = format!("{}{}", dir.path().display(), suffix);
        let resolver = ViewResolver::new(&root, "html").expect("resolver");
        assert_eq!(resolver.root(), dir.path());
        assert!(resolver.resolve("views/single").is_ok());
    }

    #[test]
    fn missing_root_fails() {
        let err = ViewResolver::new("/view/directory/not/exist", "html").unwrap_err();
        assert!(matches!(err, ViewError::ViewDirectoryNotFound { .. }), "got: {err}");
    }
}
