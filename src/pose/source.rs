//! External collaborators: where frames and pose estimates come from.
//!
//! Both are called from the session's single sampling step, one request at a
//! time. A failure here is transient; the session retries on its next step.

use image::RgbaImage;

use super::keypoint::Pose;
use crate::config::PoseConfig;
use crate::error::SessionError;

/// Parameters forwarded to the pose estimator on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateOptions {
    pub score_threshold: f32,
    pub flip_horizontal: bool,
    pub output_stride: u32,
}

impl From<&PoseConfig> for EstimateOptions {
    fn from(config: &PoseConfig) -> Self {
        Self {
            score_threshold: config.score_threshold,
            flip_horizontal: config.flip_horizontal,
            output_stride: config.output_stride,
        }
    }
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self::from(&PoseConfig::default())
    }
}

pub trait FrameSource {
    /// Latest camera frame, or `FrameUnavailable` while the device is busy.
    fn request_frame(&mut self) -> Result<RgbaImage, SessionError>;
}

pub trait PoseSource {
    /// Keypoints in capture-space pixels of `frame`.
    fn estimate_pose(
        &mut self,
        frame: &RgbaImage,
        options: &EstimateOptions,
    ) -> Result<Pose, SessionError>;
}

impl<T: FrameSource + ?Sized> FrameSource for &mut T {
    fn request_frame(&mut self) -> Result<RgbaImage, SessionError> {
        (**self).request_frame()
    }
}

impl<T: PoseSource + ?Sized> PoseSource for &mut T {
    fn estimate_pose(
        &mut self,
        frame: &RgbaImage,
        options: &EstimateOptions,
    ) -> Result<Pose, SessionError> {
        (**self).estimate_pose(frame, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let config = PoseConfig {
            score_threshold: 0.5,
            flip_horizontal: false,
            output_stride: 8,
            min_confidence: 0.1,
        };
        let options = EstimateOptions::from(&config);
        assert_eq!(options.score_threshold, 0.5);
        assert!(!options.flip_horizontal);
        assert_eq!(options.output_stride, 8);
    }

    #[test]
    fn test_default_matches_posenet_call() {
        let options = EstimateOptions::default();
        assert_eq!(options.score_threshold, 0.25);
        assert!(options.flip_horizontal);
        assert_eq!(options.output_stride, 16);
    }
}
