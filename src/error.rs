//! Error types for the generation pipeline.
//!
//! Every stage returns a `Result`; only the binary's `main` turns an error into
//! a diagnostic and a failing exit status.

use std::path::PathBuf;
use std::process::ExitStatus;

use crate::template::TemplateError;

/// Failure while aggregating schema sources.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("accessing schema path '{}': {source}", path.display())]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("reading schema directory '{}': {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("reading schema file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failure of the external formatter command.
#[derive(Debug, thiserror::Error)]
pub enum FormatterError {
    #[error("spawning formatter command '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("piping output to formatter command '{command}': {source}")]
    Pipe {
        command: String,
        source: std::io::Error,
    },

    #[error("formatter command '{command}' failed: {status}")]
    Status { command: String, status: ExitStatus },
}

/// Top-level error of one generate invocation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("unmarshalling plugin options: {0}")]
    Options(#[source] serde_json::Error),

    #[error("building template context from request: {0}")]
    Context(#[source] serde_json::Error),

    #[error("accessing template path '{}': {source}", path.display())]
    TemplatePath {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("reading template file '{}': {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Formatter(#[from] FormatterError),
}
