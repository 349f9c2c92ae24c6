use bevy::math::{Mat4, Vec3};
use constants::sync::{MODEL_MATRIX_COMPONENTS, POSE_COMPONENTS};
use serde::{Deserialize, Serialize};

use crate::engine::anchor::AnchorPose;
use crate::error::{AnnotationError, Result};

/// Element of the `GET /ardata/{roomId}` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudAnchorRecord {
    /// Bracketed float list, e.g. `"[1.0,2.0,3.0]"`.
    pub anchor_pose: String,
    pub keyword: String,
    /// Bracketed list of 16 floats, column-major.
    pub model_matrix: String,
    pub hashcode: String,
}

/// Body of `POST /push_data`. Arrays travel as JSON-encoded strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRecord {
    pub room_id: String,
    pub keyword: String,
    pub model_matrix: String,
    pub anchor_pose: String,
    pub hashcode: String,
}

impl PushRecord {
    pub fn new(room_id: &str, keyword: &str, pose: &AnchorPose, hashcode: &str) -> Result<Self> {
        Ok(Self {
            room_id: room_id.to_owned(),
            keyword: keyword.to_owned(),
            model_matrix: serde_json::to_string(&pose.model_matrix.to_cols_array())?,
            anchor_pose: serde_json::to_string(&pose.position.to_array())?,
            hashcode: hashcode.to_owned(),
        })
    }
}

/// Decoded cloud anchor, ready to be placed in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct HydratedAnchor {
    pub keyword: String,
    pub hash: String,
    pub pose: AnchorPose,
}

impl TryFrom<CloudAnchorRecord> for HydratedAnchor {
    type Error = AnnotationError;

    fn try_from(record: CloudAnchorRecord) -> Result<Self> {
        let position = parse_float_array("anchorPose", &record.anchor_pose, POSE_COMPONENTS)?;
        let matrix = parse_float_array("modelMatrix", &record.model_matrix, MODEL_MATRIX_COMPONENTS)?;

        Ok(Self {
            keyword: record.keyword,
            hash: record.hashcode,
            pose: AnchorPose {
                model_matrix: Mat4::from_cols_slice(&matrix),
                position: Vec3::from_slice(&position),
            },
        })
    }
}

/// Parse `"[f1,f2,...]"` into exactly `expected` finite floats.
///
/// Brackets are stripped only when both are present.
pub fn parse_float_array(field: &'static str, raw: &str, expected: usize) -> Result<Vec<f32>> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);

    let values = body
        .split(',')
        .map(|item| {
            let item = item.trim();
            match item.parse::<f32>() {
                Ok(value) if value.is_finite() => Ok(value),
                Ok(_) => Err(AnnotationError::MalformedArray {
                    field,
                    reason: format!("non-finite value {item:?}"),
                }),
                Err(err) => Err(AnnotationError::MalformedArray {
                    field,
                    reason: format!("{item:?}: {err}"),
                }),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    if values.len() != expected {
        return Err(AnnotationError::MalformedArray {
            field,
            reason: format!("expected {expected} values, found {}", values.len()),
        });
    }

    Ok(values)
}
