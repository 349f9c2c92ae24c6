use bevy::math::{Mat4, Vec2, Vec3};
use constants::annotation::{MAX_SHRINK_DISTANCE, MAX_TEXT_SIZE, MIN_TEXT_SIZE};
use constants::render_settings::ANCHOR_ORIGIN;
use serde::{Deserialize, Serialize};

/// Project the origin of `pose` into pixel coordinates (top-left origin, y down).
///
/// Returns `None` when the clip-space `w` is zero or the result is not finite,
/// meaning the label should not be drawn this frame.
pub fn world_to_screen(pose: &Mat4, view: &Mat4, projection: &Mat4, viewport: Vec2) -> Option<Vec2> {
    let clip = (*projection * *view * *pose) * ANCHOR_ORIGIN;
    if clip.w == 0.0 || !clip.w.is_finite() {
        return None;
    }

    let ndc = clip.truncate().truncate() / clip.w;
    let screen = Vec2::new(
        viewport.x * (ndc.x + 1.0) / 2.0,
        viewport.y * (1.0 - ndc.y) / 2.0,
    );

    screen.is_finite().then_some(screen)
}

/// Label size for an anchor `distance` metres from the camera, using default sizing.
pub fn label_size(distance: f32, background: bool) -> f32 {
    LabelSizing::default().size_for(distance, background)
}

/// Euclidean distance between two world positions, in metres.
pub fn distance_3d(a: Vec3, b: Vec3) -> f32 {
    a.distance(b)
}

/// Distance-based label sizing. Labels shrink linearly from `max_text_size`
/// at the camera to `min_text_size` at `max_shrink_distance` and stay there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSizing {
    pub min_text_size: f32,
    pub max_text_size: f32,
    pub max_shrink_distance: f32,
}

impl Default for LabelSizing {
    fn default() -> Self {
        Self {
            min_text_size: MIN_TEXT_SIZE,
            max_text_size: MAX_TEXT_SIZE,
            max_shrink_distance: MAX_SHRINK_DISTANCE,
        }
    }
}

impl LabelSizing {
    /// Background anchors (filtered out by search) get size 0 and stay hidden.
    pub fn size_for(&self, distance: f32, background: bool) -> f32 {
        if background {
            return 0.0;
        }
        if self.max_shrink_distance <= 0.0 {
            return self.min_text_size;
        }

        let clamped = if distance.is_nan() {
            self.max_shrink_distance
        } else {
            distance.clamp(0.0, self.max_shrink_distance)
        };
        let closeness = (self.max_shrink_distance - clamped) / self.max_shrink_distance;

        self.min_text_size + closeness * (self.max_text_size - self.min_text_size)
    }
}
