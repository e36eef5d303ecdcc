//! Detection records produced by the tracking service.

use serde::{Deserialize, Serialize};

use crate::filter::bbox::BBox;

/// One object's box, label and confidence in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box in normalized TLBR format
    pub bbox: BBox,
    /// Object label, e.g. `"Ball"`
    pub label: String,
    /// Detection confidence score; absent scores count as zero
    #[serde(default)]
    pub score: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, xmin: f32, ymin: f32, xmax: f32, ymax: f32, score: f32) -> Self {
        Self {
            bbox: BBox::new(xmin, ymin, xmax, ymax),
            label: label.into(),
            score,
        }
    }

    pub fn from_bbox(label: impl Into<String>, bbox: BBox, score: f32) -> Self {
        Self {
            bbox,
            label: label.into(),
            score,
        }
    }
}

/// Per-frame detection lists spanning a video, in frame order.
pub type TrackSequence = Vec<Vec<Detection>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_missing_score() {
        let det: Detection =
            serde_json::from_str(r#"{"label": "Ball", "bbox": [0.1, 0.1, 0.2, 0.2]}"#).unwrap();
        assert_eq!(det.label, "Ball");
        assert_eq!(det.score, 0.0);
    }

    #[test]
    fn test_deserialize_track_sequence() {
        let json = r#"[
            [{"label": "Ball", "bbox": [0.0, 0.0, 0.5, 0.5], "score": 0.97}],
            []
        ]"#;
        let tracks: TrackSequence = serde_json::from_str(json).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0][0].bbox.center(), (0.25, 0.25));
        assert!(tracks[1].is_empty());
    }
}
