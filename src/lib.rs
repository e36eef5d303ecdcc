//! Track a moving ball through a video and overlay a fading motion trace.
//!
//! The crate is split into three layers:
//!
//! - [`filter`]: drops low-confidence and stationary detections;
//! - [`render`]: accumulates detection centers and alpha-composites the trace;
//! - [`integration`]: frame extraction, the hosted tracking API, video
//!   encoding and the [`TracePipeline`] that runs them in order.

pub mod error;
pub mod filter;
pub mod integration;
pub mod render;
pub mod settings;

pub use error::{ConfigError, PipelineError};
pub use filter::{BBox, Detection, MovementFilter, TrackSequence, filter_moving_objects};
pub use integration::{
    Checkpoint, DetectionBuilder, FfmpegVideo, Frame, FrameSource, ObjectTracker, Progress,
    TracePipeline, VideoSink, VisionApiTracker,
};
pub use render::{TraceRenderer, opacity_weights};
pub use settings::{Settings, TraceConfig};
