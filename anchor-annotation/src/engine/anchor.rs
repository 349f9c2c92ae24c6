use std::fmt;

use bevy::math::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::ar::{InstantPlacementMethod, Trackable, TrackedAnchor, TrackingState};

/// Session-unique anchor identity, assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(pub u64);

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Surface kind an anchor was placed against. Drives texture choice only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackableKind {
    Plane,
    Point,
    /// `approximate` is set while the point is tracked in screen space with
    /// an assumed distance.
    InstantPlacementPoint { approximate: bool },
    DepthPoint,
    None,
}

impl From<&Trackable> for TrackableKind {
    fn from(trackable: &Trackable) -> Self {
        match trackable {
            Trackable::Plane { .. } => Self::Plane,
            Trackable::Point { .. } => Self::Point,
            Trackable::InstantPlacementPoint { method } => Self::InstantPlacementPoint {
                approximate: *method == InstantPlacementMethod::ScreenspaceWithApproximateDistance,
            },
            Trackable::DepthPoint => Self::DepthPoint,
            Trackable::Other => Self::None,
        }
    }
}

/// World transform of an anchor plus its translation, used for distance checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPose {
    pub model_matrix: Mat4,
    pub position: Vec3,
}

impl AnchorPose {
    pub fn from_matrix(model_matrix: Mat4) -> Self {
        Self {
            model_matrix,
            position: model_matrix.w_axis.truncate(),
        }
    }
}

/// A placed or hydrated point of interest.
///
/// Local anchors carry a live tracking handle; cloud anchors carry the static
/// pose they were stored with. Constructors guarantee exactly one of the two.
pub struct Anchor {
    id: AnchorId,
    live: Option<Box<dyn TrackedAnchor>>,
    kind: TrackableKind,
    static_pose: Option<AnchorPose>,
    label: String,
    sync_hash: String,
}

impl Anchor {
    pub fn local(
        id: AnchorId,
        live: Box<dyn TrackedAnchor>,
        kind: TrackableKind,
        label: impl Into<String>,
        sync_hash: impl Into<String>,
    ) -> Self {
        Self {
            id,
            live: Some(live),
            kind,
            static_pose: None,
            label: label.into(),
            sync_hash: sync_hash.into(),
        }
    }

    pub fn cloud(
        id: AnchorId,
        pose: AnchorPose,
        label: impl Into<String>,
        sync_hash: impl Into<String>,
    ) -> Self {
        Self {
            id,
            live: None,
            kind: TrackableKind::None,
            static_pose: Some(pose),
            label: label.into(),
            sync_hash: sync_hash.into(),
        }
    }

    pub fn id(&self) -> AnchorId {
        self.id
    }

    pub fn kind(&self) -> TrackableKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn sync_hash(&self) -> &str {
        &self.sync_hash
    }

    pub fn has_live_tracking(&self) -> bool {
        self.live.is_some()
    }

    pub fn is_cloud(&self) -> bool {
        self.live.is_none() && self.static_pose.is_some()
    }

    /// Current world pose: the live pose when tracked, else the static one.
    /// `None` once live tracking has stopped, which makes the anchor inert.
    pub fn world_pose(&self) -> Option<AnchorPose> {
        match &self.live {
            Some(live) if live.tracking_state() == TrackingState::Stopped => None,
            Some(live) => Some(AnchorPose::from_matrix(live.pose())),
            None => self.static_pose,
        }
    }

    /// Live pose only; cloud anchors have nothing to publish.
    pub fn live_pose(&self) -> Option<AnchorPose> {
        self.live
            .as_ref()
            .filter(|live| live.tracking_state() != TrackingState::Stopped)
            .map(|live| AnchorPose::from_matrix(live.pose()))
    }

    /// Detach the tracking handle. Returns `false` if there was nothing to release.
    pub fn release(&mut self) -> bool {
        match self.live.take() {
            Some(mut live) => {
                live.detach();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("id", &self.id)
            .field("live", &self.live.is_some())
            .field("kind", &self.kind)
            .field("static_pose", &self.static_pose)
            .field("label", &self.label)
            .field("sync_hash", &self.sync_hash)
            .finish()
    }
}
