use super::descriptor::{derive, BodyPartDescriptor, FeedScale};
use crate::error::SessionError;
use crate::pose::{KeypointIndex, Pose};

/// 追跡する部位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BodyPart {
    Ears = 0,
    Shoulders = 1,
}

impl BodyPart {
    pub const COUNT: usize = 2;
    pub const ALL: [BodyPart; BodyPart::COUNT] = [BodyPart::Ears, BodyPart::Shoulders];

    /// (左, 右) キーポイント
    pub fn keypoints(self) -> (KeypointIndex, KeypointIndex) {
        match self {
            BodyPart::Ears => (KeypointIndex::LeftEar, KeypointIndex::RightEar),
            BodyPart::Shoulders => (KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder),
        }
    }
}

/// 1フレーム分の部位記述子（部位ごと）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyDescriptors {
    parts: [BodyPartDescriptor; BodyPart::COUNT],
}

impl BodyDescriptors {
    pub fn new(ears: BodyPartDescriptor, shoulders: BodyPartDescriptor) -> Self {
        Self {
            parts: [ears, shoulders],
        }
    }

    /// 姿勢から耳・肩の記述子をフィード座標で導出する
    ///
    /// 信頼度不足または NaN を含む部位があれば `InvalidGeometry`。
    pub fn from_pose(pose: &Pose, scale: FeedScale, min_confidence: f32) -> Result<Self, SessionError> {
        let mut parts = [BodyPartDescriptor::default(); BodyPart::COUNT];
        for part in BodyPart::ALL {
            let (left, right) = part.keypoints();
            if !pose.pair_is_valid(left, right, min_confidence) {
                return Err(SessionError::InvalidGeometry(part));
            }
            let descriptor = derive(
                scale.apply(pose.get(left).landmark()),
                scale.apply(pose.get(right).landmark()),
            );
            if !descriptor.is_finite() {
                return Err(SessionError::InvalidGeometry(part));
            }
            parts[part as usize] = descriptor;
        }
        Ok(Self { parts })
    }

    pub fn get(&self, part: BodyPart) -> &BodyPartDescriptor {
        &self.parts[part as usize]
    }

    pub fn ears(&self) -> &BodyPartDescriptor {
        self.get(BodyPart::Ears)
    }

    pub fn shoulders(&self) -> &BodyPartDescriptor {
        self.get(BodyPart::Shoulders)
    }

    /// 全部位・全フィールドに二項演算を適用
    pub fn zip_with(&self, other: &Self, op: impl Fn(f32, f32) -> f32) -> Self {
        Self {
            parts: std::array::from_fn(|i| self.parts[i].zip_with(&other.parts[i], &op)),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.parts.iter().all(BodyPartDescriptor::is_finite)
    }
}
