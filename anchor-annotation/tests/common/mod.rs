#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anchor_annotation::ar::{
    ArFrame, ArSession, CameraState, ClipPlanes, Hit, HitTestMode, Trackable, TrackedAnchor,
    TrackingFailureReason, TrackingState,
};
use anchor_annotation::sync::{PushRecord, RemoteStore};
use anchor_annotation::{AnnotationError, Result};
use bevy::math::{Mat4, Vec2, Vec3};
use serde_json::{Value, json};

pub const VIEWPORT: Vec2 = Vec2::new(1000.0, 500.0);

/// Camera at the origin looking down -Z with a 60 degree vertical field of view.
pub fn tracking_camera() -> CameraState {
    CameraState {
        pose: Mat4::IDENTITY,
        view: Mat4::IDENTITY,
        projection: Mat4::perspective_rh(60f32.to_radians(), VIEWPORT.x / VIEWPORT.y, 0.1, 100.0),
        tracking: TrackingState::Tracking,
        failure: TrackingFailureReason::None,
    }
}

/// Hit on a floor plane one metre below the camera, `depth` metres ahead.
pub fn floor_hit(depth: f32) -> Hit {
    Hit {
        trackable: Trackable::Plane { pose_in_polygon: true },
        pose: Mat4::from_translation(Vec3::new(0.0, -1.0, -depth)),
        distance: depth,
    }
}

pub fn hit_on(trackable: Trackable, depth: f32) -> Hit {
    Hit {
        trackable,
        ..floor_hit(depth)
    }
}

/// Tracked anchor that never moves and counts detaches. Its tracking state
/// is shared with the session that created it.
pub struct FixedAnchor {
    pose: Mat4,
    tracking: Arc<Mutex<TrackingState>>,
    detaches: Arc<AtomicUsize>,
}

impl TrackedAnchor for FixedAnchor {
    fn pose(&self) -> Mat4 {
        self.pose
    }

    fn tracking_state(&self) -> TrackingState {
        *self.tracking.lock().unwrap()
    }

    fn detach(&mut self) {
        self.detaches.fetch_add(1, Ordering::SeqCst);
    }
}

/// Tracking session replaying a fixed camera and hit list.
pub struct ScriptedAr {
    pub camera: CameraState,
    pub has_tracking_plane: bool,
    pub camera_unavailable: bool,
    pub hits: Vec<Hit>,
    /// Tracking state reported by every anchor this session creates.
    pub anchor_tracking: Arc<Mutex<TrackingState>>,
    pub detaches: Arc<AtomicUsize>,
    pub created: usize,
    pub last_mode: Mutex<Option<HitTestMode>>,
    pub frames: i64,
}

impl Default for ScriptedAr {
    fn default() -> Self {
        Self {
            camera: tracking_camera(),
            has_tracking_plane: true,
            camera_unavailable: false,
            hits: vec![floor_hit(2.0)],
            anchor_tracking: Arc::new(Mutex::new(TrackingState::Tracking)),
            detaches: Arc::new(AtomicUsize::new(0)),
            created: 0,
            last_mode: Mutex::new(None),
            frames: 0,
        }
    }
}

impl ScriptedAr {
    pub fn with_hits(hits: Vec<Hit>) -> Self {
        Self {
            hits,
            ..Default::default()
        }
    }

    pub fn set_anchor_tracking(&self, state: TrackingState) {
        *self.anchor_tracking.lock().unwrap() = state;
    }

    pub fn detach_count(&self) -> usize {
        self.detaches.load(Ordering::SeqCst)
    }
}

impl ArSession for ScriptedAr {
    fn update(&mut self, _clip: ClipPlanes) -> Result<ArFrame> {
        if self.camera_unavailable {
            return Err(AnnotationError::CameraUnavailable);
        }
        self.frames += 1;
        Ok(ArFrame {
            camera: self.camera,
            timestamp_ns: self.frames * 33_000_000,
            has_tracking_plane: self.has_tracking_plane,
        })
    }

    fn hit_test(&self, _frame: &ArFrame, _tap: Vec2, mode: HitTestMode) -> Vec<Hit> {
        *self.last_mode.lock().unwrap() = Some(mode);
        self.hits.clone()
    }

    fn create_anchor(&mut self, hit: &Hit) -> Box<dyn TrackedAnchor> {
        self.created += 1;
        Box::new(FixedAnchor {
            pose: hit.pose,
            tracking: self.anchor_tracking.clone(),
            detaches: self.detaches.clone(),
        })
    }
}

/// In-memory room store. Clones share push history and failure budgets.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub records: Vec<Value>,
    pub pushes: Arc<Mutex<Vec<PushRecord>>>,
    pub push_failures: Arc<AtomicUsize>,
    pub fetch_unavailable: bool,
}

impl MemoryStore {
    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn pushed(&self) -> Vec<PushRecord> {
        self.pushes.lock().unwrap().clone()
    }
}

impl RemoteStore for MemoryStore {
    fn fetch_anchors(&self, _room_id: &str) -> Result<Vec<Value>> {
        if self.fetch_unavailable {
            return Err(AnnotationError::Status { status: 503 });
        }
        Ok(self.records.clone())
    }

    fn push_anchor(&self, record: &PushRecord) -> Result<Value> {
        self.pushes.lock().unwrap().push(record.clone());
        if self
            .push_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
        {
            return Err(AnnotationError::Status { status: 500 });
        }
        Ok(json!({ "status": "stored" }))
    }
}

pub fn cloud_record(keyword: &str, pose: &str, hashcode: &str) -> Value {
    json!({
        "anchorPose": pose,
        "keyword": keyword,
        "modelMatrix": "[1.0,0.0,0.0,0.0,0.0,1.0,0.0,0.0,0.0,0.0,1.0,0.0,1.0,2.0,3.0,1.0]",
        "hashcode": hashcode,
    })
}
