//! Site loading error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while assembling the site at startup.
///
/// All of them are fatal: a route whose content cannot be resolved is never
/// served.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("missing content `{key}`: expected `{key}.md` or `{key}.html`")]
    MissingContent { key: String },

    #[error("ambiguous content `{key}`: both `{key}.md` and `{key}.html` exist")]
    AmbiguousContent { key: String },

    #[error("invalid route `{0}`: routes must start with `/`")]
    InvalidRoute(String),

    #[error("duplicate route `{0}`")]
    DuplicateRoute(String),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}
