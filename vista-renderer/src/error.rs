//! Error types for vista-renderer.

use std::path::PathBuf;

use thiserror::Error;

use vista_core::{ConfigError, DispatchError, ExtensionError};

/// All errors that can arise from view rendering operations.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The view root handed to the renderer is not a directory.
    #[error("the specified view directory \"{path}\" does not exist")]
    ViewDirectoryNotFound { path: PathBuf },

    /// The resolved view path does not exist or is not a regular file.
    #[error("view file \"{path}\" does not exist or is not a file")]
    ViewNotFound { path: PathBuf },

    #[error("unable to add \"{name}\" as this global variable has already been added")]
    DuplicateGlobal { name: String },

    #[error("the block name \"content\" is reserved")]
    ReservedBlockName,

    #[error("cannot begin a block while block \"{active}\" is being captured")]
    NestedBlockCapture { active: String },

    #[error("a block must be begun before it can be ended")]
    UnmatchedEndCapture,

    /// A view finished executing with a block capture still open.
    #[error("block \"{name}\" was begun but never ended")]
    UnclosedBlockCapture { name: String },

    #[error("calling an undefined function \"{name}\"")]
    UndefinedExtensionFunction { name: String },

    #[error("extension function \"{function}\" failed: {source}")]
    Extension {
        function: String,
        #[source]
        source: ExtensionError,
    },

    /// Layout chain is longer than the configured limit (likely a cycle).
    #[error("layout chain exceeded {limit} hops while rendering \"{view}\"")]
    LayoutDepthExceeded { view: String, limit: usize },

    /// Views rendering each other as sub-views nest deeper than the layout limit.
    #[error("sub-views nested deeper than {limit} while rendering \"{view}\"")]
    RenderDepthExceeded { view: String, limit: usize },

    /// The view source could not be parsed.
    #[error("syntax error in {path}:{line}: {message}")]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("undefined variable \"{name}\"")]
    UndefinedVariable { name: String },

    /// Misuse of a value or function inside a view body.
    #[error("{message}")]
    Eval { message: String },

    /// Render parameters did not serialize to a map of names.
    #[error("render parameters must serialize to a map, got {kind}")]
    InvalidParams { kind: &'static str },

    #[error("failed to serialize render parameters: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("view I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ViewError {
    pub(crate) fn eval(message: impl Into<String>) -> Self {
        ViewError::Eval {
            message: message.into(),
        }
    }
}

impl From<DispatchError> for ViewError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Undefined { name } => ViewError::UndefinedExtensionFunction { name },
            DispatchError::Failed { function, source } => ViewError::Extension { function, source },
        }
    }
}

/// Convenience constructor for [`ViewError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ViewError {
    ViewError::Io {
        path: path.into(),
        source,
    }
}
