use serde::Deserialize;

use crate::geometry::LandmarkPoint;

/// MoveNet / PoseNet 共通の 17 キーポイントインデックス
///
/// 耳 (3/4) と肩 (5/6) のインデックスは姿勢推定器との外部契約。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;

    pub fn from_index(index: usize) -> Option<Self> {
        use KeypointIndex::*;
        const ALL: [KeypointIndex; KeypointIndex::COUNT] = [
            Nose, LeftEye, RightEye, LeftEar, RightEar, LeftShoulder, RightShoulder,
            LeftElbow, RightElbow, LeftWrist, RightWrist, LeftHip, RightHip,
            LeftKnee, RightKnee, LeftAnkle, RightAnkle,
        ];
        ALL.get(index).copied()
    }
}

/// 単一キーポイント（キャプチャ画像のピクセル座標）
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// 信頼度が閾値以上か
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }

    pub fn landmark(&self) -> LandmarkPoint {
        LandmarkPoint::new(self.x, self.y)
    }
}

/// 17キーポイントからなる姿勢
#[derive(Debug, Clone, Default)]
pub struct Pose {
    pub keypoints: [Keypoint; KeypointIndex::COUNT],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; KeypointIndex::COUNT]) -> Self {
        Self { keypoints }
    }

    /// 推定器の出力リストから組み立てる。足りない分は信頼度0
    pub fn from_slice(keypoints: &[Keypoint]) -> Self {
        let mut pose = Self::default();
        for (slot, kp) in pose.keypoints.iter_mut().zip(keypoints) {
            *slot = *kp;
        }
        pose
    }

    pub fn get(&self, index: KeypointIndex) -> &Keypoint {
        &self.keypoints[index as usize]
    }

    /// 左右のキーポイント対の信頼度がどちらも閾値以上か
    pub fn pair_is_valid(&self, left: KeypointIndex, right: KeypointIndex, threshold: f32) -> bool {
        self.get(left).is_valid(threshold) && self.get(right).is_valid(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_index_from_index() {
        assert_eq!(KeypointIndex::from_index(3), Some(KeypointIndex::LeftEar));
        assert_eq!(KeypointIndex::from_index(6), Some(KeypointIndex::RightShoulder));
        assert_eq!(KeypointIndex::from_index(16), Some(KeypointIndex::RightAnkle));
        assert_eq!(KeypointIndex::from_index(17), None);
    }

    #[test]
    fn test_ear_and_shoulder_contract() {
        assert_eq!(KeypointIndex::LeftEar as usize, 3);
        assert_eq!(KeypointIndex::RightEar as usize, 4);
        assert_eq!(KeypointIndex::LeftShoulder as usize, 5);
        assert_eq!(KeypointIndex::RightShoulder as usize, 6);
    }

    #[test]
    fn test_from_slice_pads_missing() {
        let pose = Pose::from_slice(&[Keypoint::new(1.0, 2.0, 0.9); 4]);
        assert_eq!(pose.get(KeypointIndex::LeftEar).x, 1.0);
        assert_eq!(pose.get(KeypointIndex::LeftEar).confidence, 0.9);
        assert_eq!(pose.get(KeypointIndex::RightEar).x, 0.0);
        assert_eq!(pose.get(KeypointIndex::RightEar).confidence, 0.0);
        assert_eq!(pose.get(KeypointIndex::LeftShoulder).confidence, 0.0);
    }

    #[test]
    fn test_pair_is_valid() {
        let mut pose = Pose::default();
        pose.keypoints[KeypointIndex::LeftShoulder as usize] = Keypoint::new(10.0, 20.0, 0.8);
        pose.keypoints[KeypointIndex::RightShoulder as usize] = Keypoint::new(30.0, 20.0, 0.4);
        assert!(pose.pair_is_valid(KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder, 0.3));
        assert!(!pose.pair_is_valid(KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder, 0.5));
    }
}
