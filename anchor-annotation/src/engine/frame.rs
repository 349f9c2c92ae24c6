use std::fmt;

use bevy::math::{Mat4, Vec2};

use super::anchor::{Anchor, AnchorId, TrackableKind};
use super::projection::{LabelSizing, distance_3d, world_to_screen};
use crate::ar::{ArFrame, CameraState, TrackingFailureReason, TrackingState};
use crate::tools::search::Partition;

/// Everything one frame produced for the UI and renderer.
#[derive(Debug, Default)]
pub struct FrameOutput {
    pub labels: Vec<LabelPlacement>,
    pub draws: Vec<DrawCommand>,
    pub notices: Vec<Notice>,
    pub status: Option<StatusMessage>,
    /// Anchors whose upload was confirmed since the previous frame.
    pub published: Vec<AnchorId>,
    /// Set when no camera frame was available and nothing was drawn.
    pub skipped: bool,
}

/// Where and how large to draw an anchor's text label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub anchor: AnchorId,
    /// Projected anchor origin in pixels.
    pub screen: Vec2,
    /// Zero hides the label.
    pub text_size: f32,
    pub text: String,
}

impl LabelPlacement {
    /// Top-left corner for a label widget `widget_width` pixels wide, centred
    /// horizontally over the anchor.
    pub fn top_left(&self, widget_width: f32) -> Vec2 {
        Vec2::new(self.screen.x - widget_width / 2.0, self.screen.y)
    }

    pub fn is_visible(&self) -> bool {
        self.text_size > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorTexture {
    Standard,
    /// Anchors still placed at an assumed depth.
    InstantPlacement,
}

impl From<TrackableKind> for AnchorTexture {
    fn from(kind: TrackableKind) -> Self {
        match kind {
            TrackableKind::InstantPlacementPoint { approximate: true } => Self::InstantPlacement,
            _ => Self::Standard,
        }
    }
}

/// One anchor mesh draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub anchor: AnchorId,
    pub model_view: Mat4,
    pub model_view_projection: Mat4,
    pub texture: AnchorTexture,
    /// Anchor belongs to the active search matches.
    pub highlighted: bool,
}

/// One-shot messages for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    /// A new anchor needs a label; the UI should prompt for one.
    AnchorCreated { anchor: AnchorId, label: String },
    NoMatch { query: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message) => f.write_str(message),
            Self::AnchorCreated { label, .. } => write!(f, "Placed {label}"),
            Self::NoMatch { .. } => f.write_str("No Match found"),
        }
    }
}

/// Persistent hint describing the tracking situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    SearchingPlanes,
    TrackingFailure(TrackingFailureReason),
    WaitingForTaps,
}

impl StatusMessage {
    /// Hint for `frame`, or `None` once surfaces are tracked and anchors exist.
    pub fn for_frame(frame: &ArFrame, has_anchors: bool) -> Option<Self> {
        let camera = &frame.camera;
        match camera.tracking {
            TrackingState::Paused if camera.failure == TrackingFailureReason::None => {
                Some(Self::SearchingPlanes)
            }
            TrackingState::Paused => Some(Self::TrackingFailure(camera.failure)),
            _ if frame.has_tracking_plane && !has_anchors => Some(Self::WaitingForTaps),
            _ if frame.has_tracking_plane => None,
            _ => Some(Self::SearchingPlanes),
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::SearchingPlanes => "Searching for surfaces...",
            Self::WaitingForTaps => "Tap on a surface to place an object.",
            Self::TrackingFailure(reason) => match reason {
                TrackingFailureReason::None => "",
                TrackingFailureReason::BadState => {
                    "Tracking lost due to bad internal state. Please try restarting the AR experience."
                }
                TrackingFailureReason::InsufficientLight => "Too dark. Try moving to a well-lit area.",
                TrackingFailureReason::ExcessiveMotion => "Moving too fast. Slow down.",
                TrackingFailureReason::InsufficientFeatures => {
                    "Can't find anything. Aim device at a surface with more texture or color."
                }
                TrackingFailureReason::CameraUnavailable => {
                    "Another app is using the camera. Tap on this app or try closing the other one."
                }
            },
        };
        f.write_str(text)
    }
}

/// Draws and labels for every resolvable anchor, matched first.
///
/// Unmatched anchors keep their geometry while a filter is active but their
/// labels shrink to zero. Anchors without a pose are skipped, as are labels
/// that cannot be projected this frame.
pub fn render_pass(
    partition: &Partition<'_>,
    camera: &CameraState,
    viewport: Vec2,
    sizing: &LabelSizing,
) -> (Vec<LabelPlacement>, Vec<DrawCommand>) {
    let filtered = !partition.matched.is_empty();
    let total = partition.matched.len() + partition.unmatched.len();
    let mut labels = Vec::with_capacity(total);
    let mut draws = Vec::with_capacity(total);

    let matched = partition.matched.iter().map(|anchor| (*anchor, true));
    let unmatched = partition.unmatched.iter().map(|anchor| (*anchor, false));

    for (anchor, is_match) in matched.chain(unmatched) {
        let Some((draw, label)) = render_anchor(anchor, camera, viewport, sizing, is_match, filtered) else {
            continue;
        };
        draws.push(draw);
        labels.extend(label);
    }

    (labels, draws)
}

fn render_anchor(
    anchor: &Anchor,
    camera: &CameraState,
    viewport: Vec2,
    sizing: &LabelSizing,
    is_match: bool,
    filtered: bool,
) -> Option<(DrawCommand, Option<LabelPlacement>)> {
    let pose = anchor.world_pose()?;

    let model_view = camera.view * pose.model_matrix;
    let draw = DrawCommand {
        anchor: anchor.id(),
        model_view,
        model_view_projection: camera.projection * model_view,
        texture: anchor.kind().into(),
        highlighted: is_match,
    };

    let background = filtered && !is_match;
    let label = world_to_screen(&pose.model_matrix, &camera.view, &camera.projection, viewport).map(|screen| {
        let distance = distance_3d(pose.position, camera.position());
        LabelPlacement {
            anchor: anchor.id(),
            screen,
            text_size: sizing.size_for(distance, background),
            text: anchor.label().to_owned(),
        }
    });

    Some((draw, label))
}
