use bevy::math::{Mat4, Vec3};

use crate::ar::{Hit, PointOrientation, Trackable};

/// Signed distance from the camera to the plane through `plane_pose`,
/// measured along the plane's normal (its local +Y axis).
pub fn distance_to_plane(plane_pose: &Mat4, camera_pose: &Mat4) -> f32 {
    let normal: Vec3 = plane_pose.y_axis.truncate().normalize_or_zero();
    let plane_position = plane_pose.w_axis.truncate();
    let camera_position = camera_pose.w_axis.truncate();

    (camera_position - plane_position).dot(normal)
}

/// Whether an anchor may be created on `hit`.
///
/// Plane hits must land inside the plane polygon with the camera on the
/// plane's front side; feature points need an estimated surface normal.
pub fn is_placeable(hit: &Hit, camera_pose: &Mat4) -> bool {
    match hit.trackable {
        Trackable::Plane { pose_in_polygon } => {
            pose_in_polygon && distance_to_plane(&hit.pose, camera_pose) > 0.0
        }
        Trackable::Point { orientation } => orientation == PointOrientation::EstimatedSurfaceNormal,
        Trackable::InstantPlacementPoint { .. } | Trackable::DepthPoint => true,
        Trackable::Other => false,
    }
}

/// Nearest placeable hit. Ties keep the earlier hit.
pub fn select_hit<'a>(hits: &'a [Hit], camera_pose: &Mat4) -> Option<&'a Hit> {
    hits.iter()
        .filter(|hit| is_placeable(hit, camera_pose))
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
