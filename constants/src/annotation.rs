/// Maximum number of anchors kept alive at once. Older anchors are evicted first.
pub const MAX_ANCHORS: usize = 20;

/// Label text size (points) for anchors at or beyond `MAX_SHRINK_DISTANCE`.
pub const MIN_TEXT_SIZE: f32 = 5.0;

/// Label text size (points) for an anchor sitting on the camera.
pub const MAX_TEXT_SIZE: f32 = 40.0;

/// Anchors farther than this (metres) stop shrinking their label.
pub const MAX_SHRINK_DISTANCE: f32 = 2.0;

/// Prefix of the auto-generated label, rendered as "New Marker #N".
pub const DEFAULT_ANCHOR_TEXT: &str = "New Marker";

/// Number given to the first auto-labelled anchor of a session.
pub const FIRST_ANCHOR_NUMBER: u32 = 1;

/// Taps buffered between frames; extra taps are dropped.
pub const MAX_PENDING_TAPS: usize = 16;
