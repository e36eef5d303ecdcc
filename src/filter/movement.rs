//! Movement filter that discards weak and stationary detections.

use std::collections::HashMap;

use nalgebra::Point2;
use tracing::debug;

use crate::filter::detection::{Detection, TrackSequence};

/// Drops low-confidence detections and detections that have not moved far
/// enough since their label was last accepted.
#[derive(Debug, Clone, Copy)]
pub struct MovementFilter {
    /// Minimum score a detection needs to be considered at all
    pub confidence_thresh: f32,
    /// Minimum center displacement, in normalized units, for a repeat label
    pub move_thresh: f32,
}

impl MovementFilter {
    pub fn new(confidence_thresh: f32, move_thresh: f32) -> Self {
        Self {
            confidence_thresh,
            move_thresh,
        }
    }

    /// Filter a whole track sequence.
    ///
    /// Returns exactly one list per input frame. Each output list is a subset
    /// of the corresponding input list in the input order. The last
    /// accepted position of every label is tracked across frames and only
    /// lives for the duration of this call.
    pub fn apply(&self, tracks: &[Vec<Detection>]) -> TrackSequence {
        let mut previous_positions: HashMap<&str, Point2<f32>> = HashMap::new();
        let mut filtered = Vec::with_capacity(tracks.len());

        for (frame_idx, detections) in tracks.iter().enumerate() {
            let mut accepted = Vec::new();
            for det in detections {
                if det.score < self.confidence_thresh {
                    continue;
                }

                let (cx, cy) = det.bbox.center();
                let center = Point2::new(cx, cy);

                if let Some(previous) = previous_positions.get(det.label.as_str()) {
                    if nalgebra::distance(&center, previous) < self.move_thresh {
                        continue;
                    }
                }

                previous_positions.insert(det.label.as_str(), center);
                accepted.push(det.clone());
            }

            if accepted.len() != detections.len() {
                debug!(
                    frame = frame_idx,
                    kept = accepted.len(),
                    dropped = detections.len() - accepted.len(),
                    "filtered detections"
                );
            }
            filtered.push(accepted);
        }

        filtered
    }
}

/// Convenience wrapper around [`MovementFilter::apply`].
///
/// # Arguments
/// * `tracks` - Per-frame detections, in frame order
/// * `confidence_thresh` - Detections scoring below this are dropped
/// * `move_thresh` - Minimum normalized center distance from the label's last
///   accepted position
///
/// # Returns
/// One filtered detection list per input frame.
pub fn filter_moving_objects(
    tracks: &[Vec<Detection>],
    confidence_thresh: f32,
    move_thresh: f32,
) -> TrackSequence {
    MovementFilter::new(confidence_thresh, move_thresh).apply(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(label: &str, x: f32, y: f32, score: f32) -> Detection {
        Detection::new(label, x, y, x, y, score)
    }

    #[test]
    fn test_low_confidence_dropped() {
        let tracks = vec![
            vec![point("Ball", 0.1, 0.1, 0.5), point("Ball", 0.9, 0.9, 0.95)],
            vec![point("Ball", 0.5, 0.5, 0.79)],
        ];
        let filtered = filter_moving_objects(&tracks, 0.8, 0.01);

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0], vec![point("Ball", 0.9, 0.9, 0.95)]);
        assert!(filtered[1].is_empty());
        assert!(filtered.iter().flatten().all(|d| d.score >= 0.8));
    }

    #[test]
    fn test_first_occurrence_always_kept() {
        let tracks = vec![vec![point("Ball", 0.0, 0.0, 1.0), point("Club", 0.0, 0.0, 1.0)]];
        let filtered = filter_moving_objects(&tracks, 0.0, 10.0);
        assert_eq!(filtered[0].len(), 2);
    }

    #[test]
    fn test_small_move_kept_above_threshold() {
        let tracks = vec![
            vec![Detection::new("Ball", 0.0, 0.0, 0.0, 0.0, 0.9)],
            vec![Detection::new("Ball", 0.02, 0.02, 0.02, 0.02, 0.9)],
        ];
        let filtered = filter_moving_objects(&tracks, 0.8, 0.01);
        assert_eq!(filtered[0].len(), 1);
        assert_eq!(filtered[1].len(), 1);
    }

    #[test]
    fn test_stationary_dropped() {
        let tracks = vec![
            vec![point("Ball", 0.3, 0.4, 0.9)],
            vec![point("Ball", 0.3, 0.4, 0.9)],
        ];
        let filtered = filter_moving_objects(&tracks, 0.8, 0.01);
        assert_eq!(filtered[0].len(), 1);
        assert!(filtered[1].is_empty());
    }

    #[test]
    fn test_exact_threshold_kept() {
        // (0, 0) -> (0.375, 0.5) is exactly 0.625 in binary floating point.
        let tracks = vec![
            vec![point("Ball", 0.0, 0.0, 1.0)],
            vec![point("Ball", 0.375, 0.5, 1.0)],
        ];
        let filtered = filter_moving_objects(&tracks, 0.0, 0.625);
        assert_eq!(filtered[1].len(), 1);
    }

    #[test]
    fn test_distance_measured_from_last_accepted() {
        // Each step moves 0.25; the threshold is 0.375, so the second frame is
        // dropped and the third is measured against the first (0.5 away).
        let tracks = vec![
            vec![point("Ball", 0.0, 0.0, 1.0)],
            vec![point("Ball", 0.25, 0.0, 1.0)],
            vec![point("Ball", 0.5, 0.0, 1.0)],
        ];
        let filtered = filter_moving_objects(&tracks, 0.0, 0.375);
        assert_eq!(filtered[0].len(), 1);
        assert!(filtered[1].is_empty());
        assert_eq!(filtered[2], vec![point("Ball", 0.5, 0.0, 1.0)]);
    }

    #[test]
    fn test_labels_tracked_independently() {
        let tracks = vec![
            vec![point("Ball", 0.5, 0.5, 1.0)],
            vec![point("Club", 0.5, 0.5, 1.0), point("Ball", 0.5, 0.5, 1.0)],
        ];
        let filtered = filter_moving_objects(&tracks, 0.0, 0.01);
        assert_eq!(filtered[1], vec![point("Club", 0.5, 0.5, 1.0)]);
    }

    #[test]
    fn test_same_frame_repeat_label_compared() {
        let tracks = vec![vec![
            point("Ball", 0.2, 0.2, 1.0),
            point("Ball", 0.2, 0.2, 1.0),
            point("Ball", 0.8, 0.8, 1.0),
        ]];
        let filtered = filter_moving_objects(&tracks, 0.0, 0.01);
        assert_eq!(
            filtered[0],
            vec![point("Ball", 0.2, 0.2, 1.0), point("Ball", 0.8, 0.8, 1.0)]
        );
    }

    #[test]
    fn test_empty_frames_preserved() {
        let tracks: TrackSequence = vec![vec![], vec![], vec![]];
        assert_eq!(filter_moving_objects(&tracks, 0.5, 0.01).len(), 3);
    }
}
