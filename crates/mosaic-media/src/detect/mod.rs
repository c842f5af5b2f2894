//! Face detection.

mod download;
mod yunet;

pub use download::{ensure_model, MODEL_FILE_NAME, MODEL_URL};
pub use yunet::YuNetDetector;

use image::RgbImage;

use crate::error::{MediaError, MediaResult};
use crate::models::FaceBox;

/// Pluggable face detection backend.
///
/// Implementations must be safe to call concurrently; the server shares one
/// detector across all in-flight requests.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in an RGB raster.
    ///
    /// `score_threshold` overrides the instance-level default when given.
    /// Returned boxes are clipped to the image bounds; zero detections is a
    /// success returning an empty list.
    fn detect(&self, image: &RgbImage, score_threshold: Option<f32>) -> MediaResult<Vec<FaceBox>>;
}

/// Detector thresholds, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    /// Minimum confidence for a candidate region to be reported.
    pub score_threshold: f32,
    /// IoU threshold for non-max suppression.
    pub nms_threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.5,
            nms_threshold: 0.3,
        }
    }
}

impl DetectorConfig {
    /// Check both thresholds are in (0, 1].
    pub fn validate(&self) -> MediaResult<()> {
        if !(self.score_threshold > 0.0 && self.score_threshold <= 1.0) {
            return Err(MediaError::InvalidConfig(format!(
                "score_threshold must be in (0, 1], got {}",
                self.score_threshold
            )));
        }
        if !(self.nms_threshold > 0.0 && self.nms_threshold <= 1.0) {
            return Err(MediaError::InvalidConfig(format!(
                "nms_threshold must be in (0, 1], got {}",
                self.nms_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(DetectorConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let zero_score = DetectorConfig {
            score_threshold: 0.0,
            ..Default::default()
        };
        assert!(zero_score.validate().is_err());

        let high_nms = DetectorConfig {
            nms_threshold: 1.5,
            ..Default::default()
        };
        assert!(high_nms.validate().is_err());
    }

    #[test]
    fn one_is_a_valid_threshold() {
        let config = DetectorConfig {
            score_threshold: 1.0,
            nms_threshold: 1.0,
        };
        assert!(config.validate().is_ok());
    }
}
