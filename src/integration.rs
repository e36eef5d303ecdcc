//! Integration module for connecting external video and vision services with
//! the movement filter and trace renderer.
//!
//! This module provides the traits the processing pipeline depends on, an
//! `ffmpeg` based frame source and video sink, and a client for the hosted
//! tracking API.

mod builder;
mod checkpoint;
mod ffmpeg;
mod pipeline;
mod source;
mod vision_api;

pub use builder::DetectionBuilder;
pub use checkpoint::{Checkpoint, Progress};
pub use ffmpeg::{FfmpegError, FfmpegVideo};
pub use pipeline::{OUTPUT_DIR, OUTPUT_FILE, TracePipeline, output_path_for};
pub use source::{Frame, FrameSource, ObjectTracker, VideoSink};
pub use vision_api::{RawDetection, VisionApiError, VisionApiTracker, into_track_sequence};
