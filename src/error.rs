//! Error types for the generation pipeline

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// What kind of template a reference pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Layout,
    Include,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Layout => f.write_str("layout"),
            ReferenceKind::Include => f.write_str("include"),
        }
    }
}

/// Errors raised while loading, resolving or composing a site
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed front-matter in a content file
    #[error("parse error in {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A layout or include name that is not in the registry
    #[error("{item}: unresolved {kind} `{name}`")]
    UnresolvedReference {
        item: String,
        kind: ReferenceKind,
        name: String,
    },

    /// A layout whose parent chain revisits itself
    #[error("cyclic layout chain: {}", chain.join(" -> "))]
    CyclicLayout { chain: Vec<String> },

    /// An include that (transitively) includes itself
    #[error("cyclic include chain: {}", chain.join(" -> "))]
    CyclicInclude { chain: Vec<String> },

    /// Missing or invalid site configuration
    #[error("config error in {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    /// Two pages resolved to the same output path
    #[error("{item}: output path {path:?} is already taken by {owner}")]
    DuplicateOutput {
        item: String,
        path: PathBuf,
        owner: String,
    },

    #[error("IO error on `{path:?}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unresolved(item: impl Into<String>, kind: ReferenceKind, name: &str) -> Self {
        Error::UnresolvedReference {
            item: item.into(),
            kind,
            name: name.to_string(),
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Fatal errors abort the whole run; the rest only skip one item
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Parse { .. }
                | Error::UnresolvedReference { .. }
                | Error::DuplicateOutput { .. }
        )
    }

    /// Short kind name used in run reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Parse { .. } => "ParseError",
            Error::UnresolvedReference { .. } => "UnresolvedReferenceError",
            Error::CyclicLayout { .. } => "CyclicLayoutError",
            Error::CyclicInclude { .. } => "CyclicIncludeError",
            Error::DuplicateOutput { .. } => "DuplicateOutputError",
            Error::Config { .. } => "ConfigError",
            Error::Io { .. } => "IoError",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
