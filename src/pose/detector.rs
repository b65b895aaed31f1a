use anyhow::{Context, Result};
use image::RgbaImage;
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

use super::keypoint::{Keypoint, KeypointIndex, Pose};
use super::preprocess::preprocess_for_movenet;
use super::source::{EstimateOptions, PoseSource};
use crate::error::SessionError;

/// MoveNet を使用した姿勢推定器
///
/// 出力は正規化座標なので、キャプチャ画像の一辺 `capture_size` を掛けて
/// キャプチャ座標系に揃える。
pub struct MoveNetDetector {
    session: Session,
    capture_size: f32,
}

impl MoveNetDetector {
    /// ONNXモデルを読み込んで初期化
    pub fn new<P: AsRef<Path>>(model_path: P, capture_size: u32) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path.as_ref())
            .context("Failed to load ONNX model")?;

        Ok(Self {
            session,
            capture_size: capture_size as f32,
        })
    }

    /// 前処理済みテンソルから正規化座標の姿勢を検出
    ///
    /// 入力: [1, 192, 192, 3] の f32 テンソル
    pub fn detect(&mut self, input: Array4<f32>) -> Result<Pose> {
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs!["serving_default_input_0" => input_tensor])
            .context("Inference failed")?;

        // MoveNet の出力は [1, 1, 17, 3] (y, x, confidence)
        let output: ndarray::ArrayViewD<f32> = outputs["StatefulPartitionedCall_0"]
            .try_extract_array()
            .context("Failed to extract output tensor")?;

        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        for (i, kp) in keypoints.iter_mut().enumerate() {
            let y = output[[0, 0, i, 0]];
            let x = output[[0, 0, i, 1]];
            *kp = Keypoint::new(x, y, output[[0, 0, i, 2]]);
        }

        Ok(Pose::new(keypoints))
    }
}

/// 正規化座標 → キャプチャ座標。左右反転時は x を鏡像にする
fn to_capture_space(pose: &mut Pose, capture_size: f32, flip_horizontal: bool) {
    for kp in pose.keypoints.iter_mut() {
        let x = if flip_horizontal { 1.0 - kp.x } else { kp.x };
        kp.x = x * capture_size;
        kp.y *= capture_size;
    }
}

impl PoseSource for MoveNetDetector {
    fn estimate_pose(
        &mut self,
        frame: &RgbaImage,
        options: &EstimateOptions,
    ) -> Result<Pose, SessionError> {
        let input = preprocess_for_movenet(frame);
        let mut pose = self
            .detect(input)
            .map_err(|e| SessionError::PoseEstimation(format!("{:#}", e)))?;
        to_capture_space(&mut pose, self.capture_size, options.flip_horizontal);
        Ok(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_capture_space_flips_x() {
        let mut pose = Pose::default();
        pose.keypoints[0] = Keypoint::new(0.25, 0.5, 0.9);
        to_capture_space(&mut pose, 200.0, true);
        assert!((pose.keypoints[0].x - 150.0).abs() < 1e-4);
        assert!((pose.keypoints[0].y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_to_capture_space_without_flip() {
        let mut pose = Pose::default();
        pose.keypoints[0] = Keypoint::new(0.25, 0.5, 0.9);
        to_capture_space(&mut pose, 200.0, false);
        assert!((pose.keypoints[0].x - 50.0).abs() < 1e-4);
    }
}
