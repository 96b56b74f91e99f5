use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KimQueryError {
    #[error("unrecognized property: {0}")]
    #[diagnostic(help("use `kimquery -p list` to see the available properties"))]
    InvalidProperty(String),

    #[error("unrecognized structure: {0}")]
    #[diagnostic(help("use `kimquery -s list` to see the available structures"))]
    InvalidStructure(String),

    #[error("invalid element: {0}")]
    InvalidElement(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("no {0} specified")]
    EmptySelection(&'static str),

    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("invalid metadata for property {code}: {reason}")]
    InvalidPropertyMeta { code: String, reason: String },

    #[error("failed to read property catalog at {0}")]
    CatalogRead(PathBuf),

    #[error("failed to parse property catalog: {0}")]
    CatalogParse(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("OpenKIM request failed: {0}")]
    KimHttp(String),

    #[error("OpenKIM returned status {status}: {message}")]
    KimStatus { status: u16, message: String },

    #[error("failed to parse OpenKIM response: {0}")]
    KimParse(String),

    #[error("failed to obtain {property} in {structure} after {attempts} attempts: {last_error}")]
    FetchExhausted {
        property: String,
        structure: String,
        attempts: u32,
        last_error: String,
    },

    #[error("cache at {path} could not be loaded: {reason}")]
    CacheLoad { path: String, reason: String },

    #[error("failed to persist cache to {path}: {reason}")]
    CachePersist { path: String, reason: String },

    #[error("failed to render output: {0}")]
    Render(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("update incomplete, failed tasks: {}", failed.join(", "))]
    UpdateIncomplete { failed: Vec<String> },
}
