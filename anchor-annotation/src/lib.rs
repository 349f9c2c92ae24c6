//! AR anchor annotation engine.
//!
//! Users tap surfaces to drop labelled anchors, search anchors by label, and
//! share them with a remote store so other sessions in the same room see
//! them. The engine is renderer-agnostic: each frame it consumes tracking
//! output through the [`ar::ArSession`] trait and produces draw commands and
//! screen-space label placements.
//!
//! [`plugin::AnnotationPlugin`] runs the pipeline inside a Bevy app. Hosts
//! without an ECS can drive [`engine::session::AnnotationSession`] directly.

pub mod ar;
pub mod config;
pub mod engine;
pub mod error;
pub mod plugin;
pub mod sync;
pub mod tools;

pub use config::{AnnotationConfig, SyncConfig};
pub use engine::anchor::{Anchor, AnchorId, AnchorPose, TrackableKind};
pub use engine::frame::{AnchorTexture, DrawCommand, FrameOutput, LabelPlacement, Notice, StatusMessage};
pub use engine::session::AnnotationSession;
pub use error::{AnnotationError, Result};
pub use plugin::{AnnotationPlugin, ArBackend};
