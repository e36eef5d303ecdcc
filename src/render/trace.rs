//! Fading motion trace rendering.

use image::{Rgb, RgbImage};
use ndarray::Array1;
use tracing::debug;

use crate::filter::Detection;
use crate::render::overlay::CircleStamp;

/// Exponential decay rate applied per step of point age.
pub const TRACE_DECAY: f32 = 0.2;

/// Radius in pixels of a single trace point.
pub const TRACE_RADIUS: u32 = 4;

/// Trace point color (orange).
pub const TRACE_COLOR: Rgb<u8> = Rgb([255, 165, 0]);

/// Opacity weights for a trace of `tail_len` points, oldest first.
///
/// The weight for age `a` is `exp(-0.2 * a)`, with ages running from
/// `tail_len` down to 1 so the newest point is the most opaque.
pub fn opacity_weights(tail_len: usize) -> Array1<f32> {
    Array1::range(tail_len as f32, 0.0, -1.0).mapv(|age| (-TRACE_DECAY * age).exp())
}

/// Growing sequence of pixel-space centers accumulated over a run.
#[derive(Debug, Clone, Default)]
pub(crate) struct TraceBuffer {
    points: Vec<(i32, i32)>,
}

impl TraceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: (i32, i32)) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// The most recent `n` points, oldest first.
    pub fn tail(&self, n: usize) -> &[(i32, i32)] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }
}

/// Draws the fading trace of detection centers onto frames.
#[derive(Debug, Clone)]
pub struct TraceRenderer {
    tail_len: usize,
    show_trace: bool,
    stamp: CircleStamp,
    weights: Array1<f32>,
}

impl TraceRenderer {
    pub fn new(tail_len: usize) -> Self {
        Self {
            tail_len,
            show_trace: true,
            stamp: CircleStamp::new(TRACE_RADIUS),
            weights: opacity_weights(tail_len),
        }
    }

    /// Enable or disable drawing; centers are still accumulated either way.
    pub fn with_trace(mut self, show_trace: bool) -> Self {
        self.show_trace = show_trace;
        self
    }

    /// Annotate every frame with the trace of centers seen so far.
    ///
    /// # Arguments
    /// * `frames` - Source frames, left untouched
    /// * `tracks` - Filtered detections per frame; a frame without a matching
    ///   entry contributes no new centers
    ///
    /// # Returns
    /// Exactly one annotated copy per input frame, in order.
    pub fn annotate<'a, I>(&self, frames: I, tracks: &[Vec<Detection>]) -> Vec<RgbImage>
    where
        I: IntoIterator<Item = &'a RgbImage>,
    {
        let mut trace = TraceBuffer::new();
        let mut annotated = Vec::new();

        for (frame_idx, frame) in frames.into_iter().enumerate() {
            let mut canvas = frame.clone();
            let (width, height) = canvas.dimensions();

            for det in tracks.get(frame_idx).map(Vec::as_slice).unwrap_or_default() {
                trace.push(det.bbox.pixel_center(width, height));
            }

            if self.show_trace && trace.len() > 1 {
                self.draw_trace(&mut canvas, trace.tail(self.tail_len));
            }
            annotated.push(canvas);
        }

        debug!(
            frames = annotated.len(),
            trace_points = trace.len(),
            "annotated frames"
        );
        annotated
    }

    fn draw_trace(&self, canvas: &mut RgbImage, points: &[(i32, i32)]) {
        // Weights are taken from the front of the vector, so a trace shorter
        // than the tail length uses the faintest weights.
        for (&point, &alpha) in points.iter().zip(self.weights.iter()) {
            self.stamp.composite(canvas, point, TRACE_COLOR, alpha);
        }
    }
}
