//! Traits for the external collaborators a processing run depends on.

use std::path::Path;

use image::RgbImage;

use crate::filter::TrackSequence;

/// A decoded video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// Presentation time in seconds
    pub timestamp: f64,
}

/// Frame extraction backend.
///
/// Implement this trait to decode a video into RGB frames sampled at a fixed
/// rate.
///
/// # Example
///
/// ```ignore
/// use ball_trace::{Frame, FrameSource};
///
/// struct Stills(Vec<image::RgbImage>);
///
/// impl FrameSource for Stills {
///     type Error = std::convert::Infallible;
///
///     fn extract(&mut self, _path: &Path, fps: u32) -> Result<Vec<Frame>, Self::Error> {
///         Ok(self.0.iter().enumerate().map(|(i, image)| Frame {
///             image: image.clone(),
///             timestamp: i as f64 / fps as f64,
///         }).collect())
///     }
/// }
/// ```
pub trait FrameSource {
    /// Error type for extraction failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decode `path`, sampling `fps` frames per second.
    fn extract(&mut self, path: &Path, fps: u32) -> Result<Vec<Frame>, Self::Error>;
}

/// Object tracking backend.
pub trait ObjectTracker {
    /// Error type for tracking failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Track objects matching `label` across `frames`.
    ///
    /// Returns one detection list per frame, in frame order, with bounding
    /// boxes in normalized coordinates.
    fn track(&mut self, label: &str, frames: &[RgbImage]) -> Result<TrackSequence, Self::Error>;
}

/// Video encoding backend.
pub trait VideoSink {
    /// Error type for encoding failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Encode `frames` at `fps` into a video file at `path`.
    fn write(&mut self, frames: &[RgbImage], path: &Path, fps: u32) -> Result<(), Self::Error>;
}
