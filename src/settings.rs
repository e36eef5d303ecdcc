//! Processing knobs and service settings.

use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, Map};
use serde::Deserialize;

use crate::error::ConfigError;

pub const FPS_RANGE: RangeInclusive<u32> = 1..=30;
pub const MOVEMENT_THRESH_RANGE: RangeInclusive<f32> = 0.001..=0.05;
pub const CONFIDENCE_THRESH_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const TAIL_LEN_RANGE: RangeInclusive<usize> = 5..=100;

/// Default settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "ball_trace";

/// Dotenv file read from the working directory.
pub const DOTENV_FILE: &str = ".env";

/// Environment variable prefix; `VISION_AGENT_API_KEY` maps to `api_key`.
pub const ENV_PREFIX: &str = "VISION_AGENT";

pub const DEFAULT_ENDPOINT: &str = "https://api.va.landing.ai/v1/tools/florence2-sam2/video";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Number of credential characters that may appear in diagnostics.
const CREDENTIAL_HINT_LEN: usize = 5;

/// Configuration for one processing run.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceConfig {
    /// Frame rate for both extraction and the output video
    pub fps: u32,
    /// Minimum normalized center displacement for a repeat detection
    pub movement_thresh: f32,
    /// Minimum detection score
    pub confidence_thresh: f32,
    /// Number of recent trace points drawn per frame
    pub tail_len: usize,
    /// Object prompt sent to the tracking service
    pub label: String,
    pub show_trace: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            fps: 15,
            movement_thresh: 0.001,
            confidence_thresh: 0.99,
            tail_len: 30,
            label: "Ball".to_string(),
            show_trace: true,
        }
    }
}

impl TraceConfig {
    /// Check every knob against the range its control allows.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("fps", self.fps, &FPS_RANGE)?;
        check_range("movement threshold", self.movement_thresh, &MOVEMENT_THRESH_RANGE)?;
        check_range("confidence threshold", self.confidence_thresh, &CONFIDENCE_THRESH_RANGE)?;
        if !TAIL_LEN_RANGE.contains(&self.tail_len) {
            return Err(ConfigError::OutOfRange {
                name: "tail length",
                min: *TAIL_LEN_RANGE.start() as f64,
                max: *TAIL_LEN_RANGE.end() as f64,
                value: self.tail_len as f64,
            });
        }
        if self.label.trim().is_empty() {
            return Err(ConfigError::EmptyLabel);
        }
        Ok(())
    }
}

fn check_range<T>(name: &'static str, value: T, range: &RangeInclusive<T>) -> Result<(), ConfigError>
where
    T: PartialOrd + Copy + Into<f64>,
{
    // NaN is never contained, so it is rejected here as well.
    if range.contains(&value) {
        return Ok(());
    }
    Err(ConfigError::OutOfRange {
        name,
        min: (*range.start()).into(),
        max: (*range.end()).into(),
        value: value.into(),
    })
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    api_key: Option<String>,
    endpoint: String,
    timeout_secs: u64,
}

/// Vision service settings, loaded once at startup.
#[derive(Clone)]
pub struct Settings {
    api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &format_args!("{}...", credential_hint(&self.api_key)))
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Settings {
    /// Load settings from the optional settings file, `./.env` and the
    /// environment.
    ///
    /// `path` overrides the default `ball_trace.{toml,json,...}` lookup; an
    /// explicit path must exist. Precedence, highest first: process
    /// environment, `.env`, settings file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_dotenv(path, Path::new(DOTENV_FILE))
    }

    /// Same as [`Settings::load`] with an explicit dotenv file.
    ///
    /// # Arguments
    /// * `path` - Settings file, or `None` for the optional default lookup
    /// * `dotenv` - Dotenv file; a missing file is ignored
    pub fn load_with_dotenv(path: Option<&Path>, dotenv: &Path) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(SETTINGS_FILE).required(false),
        };
        let builder = Config::builder()
            .add_source(file)
            .add_source(environment(dotenv)?);
        Self::from_builder(builder)
    }

    /// Finish loading from an already populated builder.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let raw: RawSettings = builder
            .set_default("endpoint", DEFAULT_ENDPOINT)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .build()?
            .try_deserialize()?;

        let api_key = raw
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            api_key,
            endpoint: raw.endpoint,
            timeout: Duration::from_secs(raw.timeout_secs),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Process environment layered over the entries of a dotenv file.
///
/// The process environment is never modified.
fn environment(dotenv: &Path) -> Result<Environment, ConfigError> {
    let dotenv_error = |source| ConfigError::Dotenv {
        path: dotenv.to_path_buf(),
        source,
    };

    let mut vars = Map::new();
    match dotenvy::from_path_iter(dotenv) {
        Ok(entries) => {
            for entry in entries {
                let (key, value) = entry.map_err(dotenv_error)?;
                vars.insert(key, value);
            }
        }
        Err(err) if err.not_found() => {}
        Err(err) => return Err(dotenv_error(err)),
    }

    vars.extend(
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?))),
    );
    Ok(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
}

/// First characters of a credential, safe to print.
pub fn credential_hint(key: &str) -> String {
    key.chars().take(CREDENTIAL_HINT_LEN).collect()
}
