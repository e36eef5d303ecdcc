//! TracePipeline for combining frame extraction, tracking and rendering.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::{debug, error, info, warn};

use super::checkpoint::{Checkpoint, Progress};
use super::source::{FrameSource, ObjectTracker, VideoSink};
use crate::error::PipelineError;
use crate::filter::MovementFilter;
use crate::render::TraceRenderer;
use crate::settings::{TraceConfig, credential_hint};

/// Directory created next to the input video for the annotated output.
pub const OUTPUT_DIR: &str = "temp";
/// File name of the annotated output video.
pub const OUTPUT_FILE: &str = "annotated_output.mp4";

/// Where the annotated video for `input` is written.
pub fn output_path_for(input: &Path) -> PathBuf {
    input
        .parent()
        .unwrap_or(Path::new(""))
        .join(OUTPUT_DIR)
        .join(OUTPUT_FILE)
}

/// End-to-end processing of one video.
///
/// Bundles the three external collaborators and runs them in sequence:
/// extract frames, track the object, filter detections, draw the trace and
/// encode the result.
pub struct TracePipeline<F, T, S>
where
    F: FrameSource,
    T: ObjectTracker,
    S: VideoSink,
{
    frames: F,
    tracker: T,
    sink: S,
    api_key: Option<String>,
}

impl<F, T, S> TracePipeline<F, T, S>
where
    F: FrameSource,
    T: ObjectTracker,
    S: VideoSink,
{
    /// Create a new pipeline from its collaborators.
    pub fn new(frames: F, tracker: T, sink: S) -> Self {
        Self {
            frames,
            tracker,
            sink,
            api_key: None,
        }
    }

    /// Set the credential the tracker authenticates with.
    ///
    /// Processing refuses to start without one, and API failures are reported
    /// with its first characters.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Process one video and return the final progress snapshot.
    ///
    /// Failures are logged here and never propagated.
    ///
    /// # Arguments
    /// * `input` - Video to process, or `None` when nothing was uploaded
    /// * `config` - Processing knobs for this run
    /// * `on_progress` - Called after every checkpoint and once more when the
    ///   run stops early
    ///
    /// # Returns
    /// The checkpoints reached, plus the output path when a video was written.
    /// A failed run keeps every checkpoint reached before the failure.
    pub fn process(
        &mut self,
        input: Option<&Path>,
        config: &TraceConfig,
        mut on_progress: impl FnMut(&Progress),
    ) -> Progress {
        let mut progress = Progress::default();

        let Some(input) = input else {
            warn!("No video uploaded");
            on_progress(&progress);
            return progress;
        };

        if let Err(err) = self.run(input, config, &mut progress, &mut on_progress) {
            self.report_failure(&err);
            on_progress(&progress);
        }
        progress
    }

    fn run(
        &mut self,
        input: &Path,
        config: &TraceConfig,
        progress: &mut Progress,
        on_progress: &mut impl FnMut(&Progress),
    ) -> Result<(), PipelineError> {
        if self.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(PipelineError::MissingApiKey);
        }

        let output_path = output_path_for(input);
        if let Some(dir) = output_path.parent() {
            fs::create_dir_all(dir).map_err(|source| PipelineError::OutputDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let frames = self
            .frames
            .extract(input, config.fps)
            .map_err(|e| PipelineError::Frames(Box::new(e)))?;
        if frames.is_empty() {
            warn!(input = %input.display(), "No frames extracted");
            on_progress(&*progress);
            return Ok(());
        }
        debug!(
            frames = frames.len(),
            duration_secs = frames.last().map_or(0.0, |f| f.timestamp),
            "decoded input"
        );
        let images: Vec<RgbImage> = frames.into_iter().map(|f| f.image).collect();
        checkpoint(progress, on_progress, Checkpoint::FramesExtracted);

        let raw_tracks = self
            .tracker
            .track(&config.label, &images)
            .map_err(|e| PipelineError::Tracking(Box::new(e)))?;
        checkpoint(progress, on_progress, Checkpoint::TrackingComplete);

        let filtered = MovementFilter::new(config.confidence_thresh, config.movement_thresh)
            .apply(&raw_tracks);
        checkpoint(progress, on_progress, Checkpoint::FilterApplied);

        let annotated = TraceRenderer::new(config.tail_len)
            .with_trace(config.show_trace)
            .annotate(&images, &filtered);
        checkpoint(progress, on_progress, Checkpoint::FramesAnnotated);

        self.sink
            .write(&annotated, &output_path, config.fps)
            .map_err(|e| PipelineError::Encoding(Box::new(e)))?;
        progress.video = Some(output_path);
        checkpoint(progress, on_progress, Checkpoint::VideoSaved);

        Ok(())
    }

    fn report_failure(&self, err: &PipelineError) {
        if err.is_api_error() {
            let key_prefix = self.api_key.as_deref().map(credential_hint).unwrap_or_default();
            error!(
                error = %err,
                key_prefix = %format_args!("{key_prefix}..."),
                "VisionAgent API error. Please verify your API key is correct and active. \
                 Get your key at https://va.landing.ai/settings/api-key"
            );
        } else {
            error!(error = %err, "processing failed");
        }
    }

    /// Get a reference to the frame source.
    pub fn frame_source(&self) -> &F {
        &self.frames
    }

    /// Get a reference to the tracker.
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Get a reference to the video sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

fn checkpoint(progress: &mut Progress, on_progress: &mut impl FnMut(&Progress), reached: Checkpoint) {
    progress.mark(reached);
    info!(checkpoint = reached.description(), "checkpoint reached");
    on_progress(&*progress);
}
