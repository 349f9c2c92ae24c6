use std::fs;
use std::path::Path;

use constants::annotation::{DEFAULT_ANCHOR_TEXT, FIRST_ANCHOR_NUMBER, MAX_ANCHORS, MAX_PENDING_TAPS};
use constants::render_settings::{APPROXIMATE_DISTANCE_METERS, Z_FAR, Z_NEAR};
use constants::sync::{DEFAULT_ENDPOINT, DEFAULT_ROOM_ID, REQUEST_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};

use crate::ar::{ClipPlanes, HitTestMode};
use crate::engine::projection::LabelSizing;
use crate::error::{AnnotationError, Result};
use crate::tools::search::MatchPolicy;

/// Tunables for an annotation session. Every field falls back to its default
/// when missing from the JSON source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub max_anchors: usize,
    pub z_near: f32,
    pub z_far: f32,
    pub label: LabelSizing,
    pub default_anchor_text: String,
    pub first_anchor_number: u32,
    pub max_pending_taps: usize,
    /// Hit-test in instant placement mode, falling back to an assumed depth.
    pub instant_placement: bool,
    pub approximate_distance_meters: f32,
    pub search_policy: MatchPolicy,
    pub sync: SyncConfig,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            max_anchors: MAX_ANCHORS,
            z_near: Z_NEAR,
            z_far: Z_FAR,
            label: LabelSizing::default(),
            default_anchor_text: DEFAULT_ANCHOR_TEXT.to_owned(),
            first_anchor_number: FIRST_ANCHOR_NUMBER,
            max_pending_taps: MAX_PENDING_TAPS,
            instant_placement: true,
            approximate_distance_meters: APPROXIMATE_DISTANCE_METERS,
            search_policy: MatchPolicy::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl AnnotationConfig {
    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| AnnotationError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    pub fn clip_planes(&self) -> ClipPlanes {
        ClipPlanes {
            near: self.z_near,
            far: self.z_far,
        }
    }

    pub fn hit_test_mode(&self) -> HitTestMode {
        if self.instant_placement {
            HitTestMode::InstantPlacement {
                approximate_distance: self.approximate_distance_meters,
            }
        } else {
            HitTestMode::Standard
        }
    }

    /// Auto-generated label for the `number`th anchor, e.g. "New Marker #3".
    pub fn anchor_label(&self, number: u32) -> String {
        format!("{} #{}", self.default_anchor_text, number)
    }
}

/// Remote anchor store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub room_id: String,
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            room_id: DEFAULT_ROOM_ID.to_owned(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}
