use std::path::PathBuf;

use thiserror::Error;

use crate::engine::anchor::AnchorId;

/// Failures surfaced by the annotation engine. None of them are fatal; callers
/// log them and skip the affected step for the current frame.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("camera not available")]
    CameraUnavailable,

    #[error("remote store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote store answered with status {status}")]
    Status { status: u16 },

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed {field} array: {reason}")]
    MalformedArray { field: &'static str, reason: String },

    #[error("anchor {0} is already registered")]
    DuplicateAnchor(AnchorId),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start sync worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

pub type Result<T, E = AnnotationError> = std::result::Result<T, E>;
