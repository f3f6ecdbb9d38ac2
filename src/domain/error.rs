use serde::Serialize;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum InferenceError {
    #[error("graph file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(
        "unknown graph format in {}: expected a `system_of_systems_graph`, `graph`, `nodes` or `components` key",
        path.display()
    )]
    UnknownGraphFormat { path: PathBuf },
    #[error("graph `{0}` has no nodes")]
    EmptyGraph(String),
    #[error("graphs `{a}` and `{c}` share no node ids; no transformation can be inferred")]
    IncompatibleGraphs { a: String, c: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl InferenceError {
    /// Stable machine-readable code used in the JSON error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::Io { .. } => "IO_ERROR",
            Self::InvalidJson { .. } => "INVALID_JSON",
            Self::UnknownGraphFormat { .. } => "UNKNOWN_GRAPH_FORMAT",
            Self::EmptyGraph(_) => "EMPTY_GRAPH",
            Self::IncompatibleGraphs { .. } => "INCOMPATIBLE_GRAPHS",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    NumericalInstability,
    EigenvalueNonConvergence,
}

/// Non-fatal finding recorded in the report instead of aborting the run.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
