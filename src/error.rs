use std::path::PathBuf;

use thiserror::Error;

/// Boxed error raised by an external collaborator (frames, tracking, encoding).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Startup and argument validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "VISION_AGENT_API_KEY not found in environment variables or settings file. \
         Get your API key at https://va.landing.ai/settings/api-key and set it in a \
         .env file, export it, or put `api_key = \"...\"` in ball_trace.toml"
    )]
    MissingApiKey,
    #[error("failed to read {path}: {source}")]
    Dotenv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error("failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("object label must not be empty")]
    EmptyLabel,
}

/// Failures surfaced while processing one video.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("VisionAgent API key not available during processing")]
    MissingApiKey,
    #[error("failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("frame extraction failed: {0}")]
    Frames(#[source] BoxError),
    #[error("tracking request failed: {0}")]
    Tracking(#[source] BoxError),
    #[error("video encoding failed: {0}")]
    Encoding(#[source] BoxError),
}

impl PipelineError {
    /// Whether the failure should be reported as a vision API problem.
    ///
    /// Matches on the rendered message, so collaborator errors that mention the
    /// API anywhere in their text are included.
    pub fn is_api_error(&self) -> bool {
        self.to_string().contains("API")
    }
}
