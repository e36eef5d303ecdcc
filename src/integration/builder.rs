//! Builder for turning tracking service output into `Detection` objects.

use crate::filter::{BBox, Detection};

/// Builder for `Detection` objects.
///
/// Anything convertible into a [`BBox`] is accepted as the box, including the
/// `[xmin, ymin, xmax, ymax]` arrays the tracking service returns. Boxes with
/// swapped edges are normalized so that `xmin <= xmax` and `ymin <= ymax`.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    label: String,
    bbox: BBox,
    score: f32,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the object label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the normalized bounding box.
    pub fn bbox(mut self, bbox: impl Into<BBox>) -> Self {
        let bbox = bbox.into();
        self.bbox = BBox::new(
            bbox.xmin.min(bbox.xmax),
            bbox.ymin.min(bbox.ymax),
            bbox.xmin.max(bbox.xmax),
            bbox.ymin.max(bbox.ymax),
        );
        self
    }

    /// Set the confidence score.
    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        Detection::from_bbox(self.label, self.bbox, self.score)
    }
}
