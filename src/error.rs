//! セッション中に発生する非致命的エラー
//!
//! どのエラーもプロセスを止めない。フレーム単位のスキップか、
//! オーバーレイ描画のスキップに縮退する。

use thiserror::Error;

use crate::geometry::BodyPart;

#[derive(Debug, Error)]
pub enum SessionError {
    /// カメラフレームが一時的に取得できない（次のtickで再試行）
    #[error("frame unavailable: {0}")]
    FrameUnavailable(String),

    /// 姿勢推定の失敗（次のtickで再試行）
    #[error("pose estimation failed: {0}")]
    PoseEstimation(String),

    /// グラフィックIDに対応する変換が見つからない（オーバーレイなしで合成）
    #[error("no transform matches graphic `{0}`")]
    NoTransformMatch(String),

    /// NaN を含む幾何量（平滑化に入れずにフレームを捨てる）
    #[error("invalid geometry for {0:?}")]
    InvalidGeometry(BodyPart),
}

impl SessionError {
    /// 次のtickで再試行すべき一時的エラーか
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionError::FrameUnavailable(_) | SessionError::PoseEstimation(_)
        )
    }
}
