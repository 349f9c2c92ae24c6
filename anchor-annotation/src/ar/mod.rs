//! Boundary to the AR tracking capability.
//!
//! The engine never talks to a tracking SDK directly. A host adapts its SDK to
//! [`ArSession`] and [`TrackedAnchor`], and classifies hit results into the
//! [`Trackable`] variants below so placement rules can match on them
//! exhaustively.

use bevy::math::{Mat4, Vec2, Vec3};

use crate::error::Result;

/// Tracking quality reported for the camera and for individual anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Tracking,
    Paused,
    Stopped,
}

/// Why the camera is paused, when the SDK can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingFailureReason {
    #[default]
    None,
    BadState,
    InsufficientLight,
    ExcessiveMotion,
    InsufficientFeatures,
    CameraUnavailable,
}

/// Camera pose and matrices for one frame.
#[derive(Debug, Clone, Copy)]
pub struct CameraState {
    /// Camera-to-world transform.
    pub pose: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub tracking: TrackingState,
    pub failure: TrackingFailureReason,
}

impl CameraState {
    pub fn position(&self) -> Vec3 {
        self.pose.w_axis.truncate()
    }
}

/// Snapshot of tracking output for one camera frame.
#[derive(Debug, Clone, Copy)]
pub struct ArFrame {
    pub camera: CameraState,
    pub timestamp_ns: i64,
    /// At least one detected plane is currently tracked.
    pub has_tracking_plane: bool,
}

/// Near/far distances used to build the projection matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlanes {
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOrientation {
    InitializedToIdentity,
    EstimatedSurfaceNormal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstantPlacementMethod {
    FullTracking,
    ScreenspaceWithApproximateDistance,
    NotTracking,
}

/// What a hit ray struck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trackable {
    Plane { pose_in_polygon: bool },
    Point { orientation: PointOrientation },
    InstantPlacementPoint { method: InstantPlacementMethod },
    /// Only produced when the session runs with depth enabled.
    DepthPoint,
    Other,
}

/// One hit-test result. `pose` is the hit pose in world space.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub trackable: Trackable,
    pub pose: Mat4,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTestMode {
    Standard,
    InstantPlacement { approximate_distance: f32 },
}

/// Pose source kept alive by the tracking SDK. Detaching releases it.
pub trait TrackedAnchor: Send + Sync {
    fn pose(&self) -> Mat4;

    fn tracking_state(&self) -> TrackingState;

    fn detach(&mut self);
}

/// Tracking session supplying frames, hit tests and anchors.
pub trait ArSession: Send + Sync {
    /// Blocks until the next camera frame. Errors mean the frame must be skipped.
    fn update(&mut self, clip: ClipPlanes) -> Result<ArFrame>;

    /// Hits along the ray through `tap`, sorted nearest first.
    fn hit_test(&self, frame: &ArFrame, tap: Vec2, mode: HitTestMode) -> Vec<Hit>;

    fn create_anchor(&mut self, hit: &Hit) -> Box<dyn TrackedAnchor>;
}
