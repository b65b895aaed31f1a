use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::transform::TransformGroup;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub pose: PoseConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// 変換テーブルの上書き（ファイル内の順序が優先順位）
    #[serde(default)]
    pub transforms: Vec<TransformGroup>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// 出力キャンバス（正方形）の一辺ピクセル数
    #[serde(default = "default_feed_size")]
    pub feed_size: u32,
    /// 姿勢推定に渡すキャプチャ画像の一辺ピクセル数
    #[serde(default = "default_capture_size")]
    pub capture_size: u32,
}

fn default_feed_size() -> u32 { 768 }
fn default_capture_size() -> u32 { 200 }

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_size: default_feed_size(),
            capture_size: default_capture_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    /// カウントダウン1tickの長さ（ミリ秒）
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// 「位置について」アニメーションのtick数
    #[serde(default = "default_loading_ticks")]
    pub loading_ticks: u32,
    /// カウントダウン表示のtick数
    #[serde(default = "default_countdown_ticks")]
    pub countdown_ticks: u32,
    /// 撮影アニメーションのtick数
    #[serde(default = "default_capture_ticks")]
    pub capture_ticks: u32,
    /// 撮影から完了通知までの遷移アニメーション（ミリ秒）
    #[serde(default = "default_transition_delay_ms")]
    pub transition_delay_ms: u64,
    /// サンプリングループの間隔（ミリ秒）
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

fn default_tick_interval_ms() -> u64 { 1500 }
fn default_loading_ticks() -> u32 { 3 }
fn default_countdown_ticks() -> u32 { 3 }
fn default_capture_ticks() -> u32 { 2 }
fn default_transition_delay_ms() -> u64 { 3000 }
fn default_frame_interval_ms() -> u64 { 16 }

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            loading_ticks: default_loading_ticks(),
            countdown_ticks: default_countdown_ticks(),
            capture_ticks: default_capture_ticks(),
            transition_delay_ms: default_transition_delay_ms(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmoothingConfig {
    /// 移動平均の窓サイズ
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_buffer_size() -> usize { 5 }

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PoseConfig {
    /// 推定器に渡すスコア閾値
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// 左右反転して推定するか（鏡像プレビューと座標を揃える）
    #[serde(default = "default_flip_horizontal")]
    pub flip_horizontal: bool,
    #[serde(default = "default_output_stride")]
    pub output_stride: u32,
    /// 耳・肩キーポイントの最低信頼度。これ未満のフレームは平滑化に入れない
    #[serde(default)]
    pub min_confidence: f32,
}

fn default_score_threshold() -> f32 { 0.25 }
fn default_flip_horizontal() -> bool { true }
fn default_output_stride() -> u32 { 16 }

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            flip_horizontal: default_flip_horizontal(),
            output_stride: default_output_stride(),
            min_confidence: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnimationConfig {
    /// 落下アイテム数
    #[serde(default = "default_falling_items")]
    pub falling_items: usize,
    /// アイテムサイズ（フィード幅に対する比率）
    #[serde(default = "default_item_size")]
    pub item_size: f32,
    /// 1描画tickあたりの落下量（ピクセル）
    #[serde(default = "default_fall_speed")]
    pub fall_speed: f32,
    /// 1描画tickあたりの回転量（ラジアン）
    #[serde(default = "default_spin_speed")]
    pub spin_speed: f32,
}

fn default_falling_items() -> usize { 3 }
fn default_item_size() -> f32 { 0.2 }
fn default_fall_speed() -> f32 { 3.0 }
fn default_spin_speed() -> f32 { 0.03 }

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            falling_items: default_falling_items(),
            item_size: default_item_size(),
            fall_speed: default_fall_speed(),
            spin_speed: default_spin_speed(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    /// 顔の切り抜き楕円を近似する多角形の頂点数
    #[serde(default = "default_clip_points")]
    pub clip_points: usize,
}

fn default_clip_points() -> usize { 40 }

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            clip_points: default_clip_points(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default)]
    pub index: i32,
    #[serde(default = "default_camera_width")]
    pub width: u32,
    #[serde(default = "default_camera_height")]
    pub height: u32,
}

fn default_camera_width() -> u32 { 640 }
fn default_camera_height() -> u32 { 480 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: default_camera_width(),
            height: default_camera_height(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: String,
}

fn default_model_path() -> String { "models/movenet_lightning.onnx".to_string() }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// RUST_LOG 未設定時のフィルタ
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// カウントダウンが0tickだと一度もサンプリングせずに撮影してしまう
    fn validate(&self) -> Result<()> {
        if self.timing.countdown_ticks == 0 {
            anyhow::bail!("timing.countdown_ticks must be at least 1");
        }
        Ok(())
    }

    /// ファイルがなければデフォルト。壊れていれば警告してデフォルト
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}; using defaults", e);
                Self::default()
            }
        }
    }

    /// キャプチャ座標 → フィード座標の倍率
    pub fn feed_factor(&self) -> f32 {
        self.feed.feed_size as f32 / self.feed.capture_size.max(1) as f32
    }
}
