//! 静止画と記録済みの姿勢列からオフラインで撮影画像を合成する
//!
//! 使い方: compose_still <background.png> <graphic.png> <graphic-id> <poses.json> [output.png]
//!
//! poses.json は姿勢の配列。各姿勢はキャプチャ座標のキーポイント17個
//! `[{"x": .., "y": .., "confidence": ..}, ...]`。

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use snackchat::config::Config;
use snackchat::geometry::{BodyDescriptors, FeedScale};
use snackchat::logging::init_tracing;
use snackchat::pose::{Keypoint, Pose};
use snackchat::render::{encode_data_url, Compositor};
use snackchat::tracker::PoseSmoother;
use snackchat::transform::TransformResolver;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);
    init_tracing(&config.log);

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        eprintln!(
            "Usage: {} <background.png> <graphic.png> <graphic-id> <poses.json> [output.png]",
            args[0]
        );
        std::process::exit(1);
    }
    let output_path = args.get(5).map(String::as_str).unwrap_or("capture.png");

    info!("Compose Still ({})", env!("GIT_VERSION"));

    let background = load_rgba(&args[1])?;
    let graphic = load_rgba(&args[2])?;
    let graphic_id = &args[3];

    let content = fs::read_to_string(&args[4]).with_context(|| format!("Failed to read {}", args[4]))?;
    let poses: Vec<Vec<Keypoint>> =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", args[4]))?;

    let scale = FeedScale::new(config.feed.feed_size, config.feed.capture_size);
    let mut smoother = PoseSmoother::from_config(&config.smoothing);
    let mut accepted = 0usize;
    for (i, keypoints) in poses.iter().enumerate() {
        let pose = Pose::from_slice(keypoints);
        match BodyDescriptors::from_pose(&pose, scale, config.pose.min_confidence) {
            Ok(body) => {
                smoother.feed(body);
                accepted += 1;
            }
            Err(e) => warn!("Pose {} skipped: {}", i, e),
        }
    }
    info!("{} of {} poses smoothed", accepted, poses.len());

    let resolver = TransformResolver::from_config(&config);
    let transform = resolver.resolve(graphic_id);
    if transform.is_none() {
        warn!("No transform matches graphic `{}`; background only", graphic_id);
    }

    let compositor = Compositor::from_config(&config);
    let image = compositor.compose(&background, smoother.current(), transform.as_ref(), &graphic);
    image
        .save(output_path)
        .with_context(|| format!("Failed to write {}", output_path))?;

    let url = encode_data_url(&image)?;
    info!("Saved {} ({} byte data URL)", output_path, url.len());

    Ok(())
}

fn load_rgba<P: AsRef<Path>>(path: P) -> Result<image::RgbaImage> {
    let path = path.as_ref();
    Ok(image::open(path)
        .with_context(|| format!("Failed to load {}", path.display()))?
        .to_rgba8())
}
