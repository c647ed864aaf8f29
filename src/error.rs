//! Error taxonomy for the poster pipeline.
//!
//! Every variant is fatal for the current run. Nothing is retried and the
//! output directory is left as-is, so a failed run may leave a partial
//! artifact set behind.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PosterError {
    // ── Preconditions ─────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Program {program} is not installed (not found on PATH)")]
    MissingExecutable { program: String },

    #[error("Input directory not found: '{path}'")]
    InputNotFound { path: PathBuf },

    #[error("Font directory not found: '{path}'")]
    FontRootNotFound { path: PathBuf },

    // ── Subprocesses ──────────────────────────────────────────────────────
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Subprocess `{command}` exited with {}\n{stderr}", describe_code(.code))]
    SubprocessFailed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    // ── Layout ────────────────────────────────────────────────────────────
    #[error("Grid needs {required} assets but only {available} are available")]
    LayoutOutOfRange { required: usize, available: usize },

    #[error("Grid expects exactly {expected} assets, found {found}")]
    LayoutMismatch { expected: usize, found: usize },

    #[error("Invalid margin {name}={value}: must be finite and non-negative")]
    InvalidMargin { name: &'static str, value: f64 },

    // ── Templates ─────────────────────────────────────────────────────────
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template expansion failed: {0}")]
    Template(#[from] minijinja::Error),

    // ── I/O ───────────────────────────────────────────────────────────────
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path is not valid UTF-8: '{}'", .path.display())]
    NonUtf8Path { path: PathBuf },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PosterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("non-zero return code {code}"),
        None => "no return code (terminated by signal)".to_string(),
    }
}

pub type Result<T, E = PosterError> = std::result::Result<T, E>;
