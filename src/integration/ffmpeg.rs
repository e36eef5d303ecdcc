//! Frame extraction and video encoding through the `ffmpeg` command line tools.
//!
//! Frames travel over pipes as packed RGB24, so no temporary files are
//! written besides the final output video.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use image::RgbImage;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::source::{Frame, FrameSource, VideoSink};

/// Error type for ffmpeg/ffprobe failures.
#[derive(Error, Debug)]
pub enum FfmpegError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("could not read video dimensions from ffprobe output {0:?}")]
    Probe(String),
    #[error("frame {index} is {got:?}, expected {expected:?}")]
    FrameSize {
        index: usize,
        expected: (u32, u32),
        got: (u32, u32),
    },
    #[error("no frames to encode")]
    NoFrames,
    #[error("failed to stream frames to ffmpeg: {0}")]
    Pipe(#[source] io::Error),
}

/// `FrameSource` and `VideoSink` backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone)]
pub struct FfmpegVideo {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegVideo {
    /// Use the given `ffmpeg` and `ffprobe` binaries, resolved through `PATH`
    /// when they are bare names.
    pub fn with_binaries(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Display width and height of the first video stream.
    ///
    /// `ffmpeg` applies the stream's rotation when decoding, so a portrait
    /// clip stored as 1920x1080 with a 90 degree display matrix decodes to
    /// 1080x1920 frames. The returned size already accounts for that.
    pub fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32), FfmpegError> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(["-v", "error", "-select_streams", "v:0"])
            .args([
                "-show_entries",
                "stream=width,height:stream_side_data=rotation:stream_tags=rotate",
            ])
            .args(["-of", "json"])
            .arg(path);

        let stdout = run(&mut cmd, &self.ffprobe)?;
        let text = String::from_utf8_lossy(&stdout);
        parse_dimensions(&text).ok_or_else(|| FfmpegError::Probe(text.trim().to_string()))
    }
}

impl FrameSource for FfmpegVideo {
    type Error = FfmpegError;

    fn extract(&mut self, path: &Path, fps: u32) -> Result<Vec<Frame>, Self::Error> {
        let (width, height) = self.probe_dimensions(path)?;
        debug!(path = %path.display(), width, height, fps, "extracting frames");

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-v", "error", "-i"])
            .arg(path)
            .args(["-vf", format!("fps={fps}").as_str()])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"]);

        let raw = run(&mut cmd, &self.ffmpeg)?;
        let frames = split_frames(&raw, width, height, fps);
        info!(count = frames.len(), "extracted frames");
        Ok(frames)
    }
}

impl VideoSink for FfmpegVideo {
    type Error = FfmpegError;

    fn write(&mut self, frames: &[RgbImage], path: &Path, fps: u32) -> Result<(), Self::Error> {
        let first = frames.first().ok_or(FfmpegError::NoFrames)?;
        let (width, height) = first.dimensions();
        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.dimensions() != (width, height))
        {
            return Err(FfmpegError::FrameSize {
                index,
                expected: (width, height),
                got: frame.dimensions(),
            });
        }

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-v", "error"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", format!("{width}x{height}").as_str()])
            .args(["-r", fps.to_string().as_str()])
            .args(["-i", "pipe:0"])
            .args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| spawn_error(&self.ffmpeg, source))?;
        let streamed = match child.stdin.take() {
            Some(mut stdin) => frames.iter().try_for_each(|f| stdin.write_all(f.as_raw())),
            None => Err(io::Error::other("ffmpeg stdin was not captured")),
        };

        let output = child
            .wait_with_output()
            .map_err(|source| spawn_error(&self.ffmpeg, source))?;
        check_status(&self.ffmpeg, output.status, &output.stderr)?;
        streamed.map_err(FfmpegError::Pipe)?;

        info!(path = %path.display(), frames = frames.len(), fps, "encoded video");
        Ok(())
    }
}

fn run(cmd: &mut Command, program: &Path) -> Result<Vec<u8>, FfmpegError> {
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| spawn_error(program, source))?;
    check_status(program, output.status, &output.stderr)?;
    Ok(output.stdout)
}

fn check_status(program: &Path, status: ExitStatus, stderr: &[u8]) -> Result<(), FfmpegError> {
    if status.success() {
        return Ok(());
    }
    Err(FfmpegError::Exit {
        program: program.display().to_string(),
        status,
        stderr: String::from_utf8_lossy(stderr).trim().to_string(),
    })
}

fn spawn_error(program: &Path, source: io::Error) -> FfmpegError {
    FfmpegError::Spawn {
        program: program.display().to_string(),
        source,
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: u32,
    height: u32,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
    #[serde(default)]
    tags: ProbeTags,
}

#[derive(Debug, Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

impl ProbeStream {
    /// Rotation in degrees from the display matrix, falling back to the
    /// legacy `rotate` tag.
    fn rotation(&self) -> i64 {
        self.side_data_list
            .iter()
            .find_map(|side| side.rotation)
            .map(|degrees| degrees.round() as i64)
            .or_else(|| self.tags.rotate.as_deref().and_then(|r| r.trim().parse().ok()))
            .unwrap_or(0)
    }
}

/// Parse ffprobe's JSON stream report into display dimensions.
fn parse_dimensions(text: &str) -> Option<(u32, u32)> {
    let output: ProbeOutput = serde_json::from_str(text).ok()?;
    let stream = output.streams.first()?;
    let (width, height) = match stream.rotation().rem_euclid(180) {
        90 => (stream.height, stream.width),
        _ => (stream.width, stream.height),
    };
    (width > 0 && height > 0).then_some((width, height))
}

/// Cut a packed RGB24 stream into frames, timestamped at `index / fps`.
fn split_frames(raw: &[u8], width: u32, height: u32, fps: u32) -> Vec<Frame> {
    let frame_len = width as usize * height as usize * 3;
    if frame_len == 0 {
        return Vec::new();
    }

    let chunks = raw.chunks_exact(frame_len);
    if !chunks.remainder().is_empty() {
        warn!(
            trailing_bytes = chunks.remainder().len(),
            "ignoring incomplete trailing frame"
        );
    }

    chunks
        .enumerate()
        .filter_map(|(index, chunk)| {
            RgbImage::from_raw(width, height, chunk.to_vec()).map(|image| Frame {
                image,
                timestamp: index as f64 / fps.max(1) as f64,
            })
        })
        .collect()
}
