//! Face detection results
//!
//! The host treats the detection result as an opaque string. It is the JSON
//! form of [`DetectionReport`]:
//!
//! ```json
//! { "count": 1, "faces": [ { "x": 12.0, "y": 30.5, "width": 64.0, "height": 64.0, "score": 0.98 } ] }
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One detected face, in source image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceInfo {
    /// Top-left corner x
    pub x: f32,
    /// Top-left corner y
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Confidence in `0.0..=1.0`
    pub score: f32,
}

impl FaceInfo {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionReport {
    pub count: usize,
    pub faces: Vec<FaceInfo>,
}

impl DetectionReport {
    /// Build a report with faces ordered by descending score
    pub fn new(mut faces: Vec<FaceInfo>) -> Self {
        faces.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self {
            count: faces.len(),
            faces,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Highest scoring face, if any
    pub fn best(&self) -> Option<&FaceInfo> {
        self.faces.first()
    }

    /// Serialize to the string handed back across the bridge
    pub fn to_result_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_result_string(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
