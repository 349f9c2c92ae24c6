use bevy::math::Vec4;

pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;

/// Assumed camera-to-surface distance for instant placement hits (metres).
/// Values in [0.2, 2.0] suit most handheld sessions.
pub const APPROXIMATE_DISTANCE_METERS: f32 = 2.0;

/// Homogeneous origin of an anchor's local space, projected to find its label position.
pub const ANCHOR_ORIGIN: Vec4 = Vec4::W;
