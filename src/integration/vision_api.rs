//! Blocking client for the hosted VisionAgent video tracking endpoint.
//!
//! Request: `POST <endpoint>` with `Authorization: Basic <api key>` and a JSON
//! body `{"prompt": "<label>", "frames": ["<base64 jpeg>", ...]}`.
//! Response: `{"data": [[{"label": ..., "bbox": [xmin, ymin, xmax, ymax], "score": ...}, ...], ...]}`
//! with one inner list per uploaded frame and normalized boxes.

use std::io::{self, Cursor};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::builder::DetectionBuilder;
use super::source::ObjectTracker;
use crate::filter::TrackSequence;
use crate::settings::Settings;

/// Error type for tracking requests.
#[derive(Error, Debug)]
pub enum VisionApiError {
    #[error("VisionAgent API request failed: {0}")]
    Request(#[source] Box<ureq::Error>),
    #[error("VisionAgent API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("VisionAgent API response could not be decoded: {0}")]
    Decode(#[source] io::Error),
    #[error("failed to encode frame {index} for upload: {source}")]
    Encode {
        index: usize,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Serialize)]
struct TrackingRequest<'a> {
    prompt: &'a str,
    frames: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TrackingResponse {
    data: Vec<Vec<RawDetection>>,
}

/// Detection as returned by the service, before conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetection {
    pub label: String,
    /// Normalized `[xmin, ymin, xmax, ymax]`
    pub bbox: [f32; 4],
    #[serde(default)]
    pub score: f32,
}

/// `ObjectTracker` that uploads frames to the hosted tracking service.
pub struct VisionApiTracker {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
}

impl VisionApiTracker {
    pub fn new(settings: &Settings) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(settings.timeout).build();
        Self {
            agent,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key().to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Encode frames as base64 JPEG payloads.
    pub fn encode_frames(frames: &[RgbImage]) -> Result<Vec<String>, VisionApiError> {
        frames
            .iter()
            .enumerate()
            .map(|(index, frame)| {
                let mut buf = Vec::new();
                frame
                    .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
                    .map_err(|source| VisionApiError::Encode { index, source })?;
                Ok(STANDARD.encode(&buf))
            })
            .collect()
    }

    fn send(&self, request: &TrackingRequest<'_>) -> Result<TrackingResponse, VisionApiError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Basic {}", self.api_key))
            .send_json(request)
            .map_err(|err| match err {
                ureq::Error::Status(status, response) => VisionApiError::Status {
                    status,
                    body: response.into_string().unwrap_or_default(),
                },
                other => VisionApiError::Request(Box::new(other)),
            })?;

        response.into_json().map_err(VisionApiError::Decode)
    }
}

impl ObjectTracker for VisionApiTracker {
    type Error = VisionApiError;

    fn track(&mut self, label: &str, frames: &[RgbImage]) -> Result<TrackSequence, Self::Error> {
        let request = TrackingRequest {
            prompt: label,
            frames: Self::encode_frames(frames)?,
        };
        debug!(endpoint = %self.endpoint, label, frames = frames.len(), "sending tracking request");

        let response = self.send(&request)?;
        if response.data.len() != frames.len() {
            warn!(
                expected = frames.len(),
                got = response.data.len(),
                "tracking result count does not match frame count"
            );
        }

        let tracks = into_track_sequence(response.data);
        info!(
            frames = tracks.len(),
            detections = tracks.iter().map(Vec::len).sum::<usize>(),
            "tracking complete"
        );
        Ok(tracks)
    }
}

/// Convert service detections into the crate's detection type.
pub fn into_track_sequence(data: Vec<Vec<RawDetection>>) -> TrackSequence {
    data.into_iter()
        .map(|frame| {
            frame
                .into_iter()
                .map(|raw| {
                    DetectionBuilder::new()
                        .label(raw.label)
                        .bbox(raw.bbox)
                        .score(raw.score)
                        .build()
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use ::config::{Config, File, FileFormat};

    fn settings(endpoint: &str) -> Settings {
        let toml = format!("api_key = \"test-key\"\nendpoint = \"{endpoint}\"\ntimeout_secs = 2");
        Settings::from_builder(Config::builder().add_source(File::from_str(&toml, FileFormat::Toml)))
            .unwrap()
    }

    #[test]
    fn test_response_conversion() {
        let json = r#"{"data": [
            [{"label": "Ball", "bbox": [0.1, 0.2, 0.3, 0.4], "score": 0.98}],
            [],
            [{"label": "Ball", "bbox": [0.5, 0.5, 0.5, 0.5]}]
        ]}"#;
        let response: TrackingResponse = serde_json::from_str(json).unwrap();
        let tracks = into_track_sequence(response.data);

        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0][0].label, "Ball");
        assert_eq!(tracks[0][0].bbox.to_tlbr(), [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(tracks[0][0].score, 0.98);
        assert!(tracks[1].is_empty());
        assert_eq!(tracks[2][0].score, 0.0);
    }

    #[test]
    fn test_request_shape() {
        let request = TrackingRequest {
            prompt: "Ball",
            frames: vec!["AAAA".to_string()],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["prompt"], "Ball");
        assert_eq!(value["frames"][0], "AAAA");
    }

    #[test]
    fn test_frames_encoded_as_jpeg() {
        let frames = vec![RgbImage::new(8, 8), RgbImage::new(8, 8)];
        let encoded = VisionApiTracker::encode_frames(&frames).unwrap();

        assert_eq!(encoded.len(), 2);
        let bytes = STANDARD.decode(&encoded[0]).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_unreachable_endpoint_is_api_error() {
        let mut tracker = VisionApiTracker::new(&settings("http://127.0.0.1:1/track"));
        assert_eq!(tracker.endpoint(), "http://127.0.0.1:1/track");

        let err = tracker.track("Ball", &[RgbImage::new(4, 4)]).unwrap_err();
        assert!(matches!(err, VisionApiError::Request(_)));
        assert!(err.to_string().contains("API"));
    }
}
