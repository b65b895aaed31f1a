use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use snackchat::camera::ThreadedCamera;
use snackchat::capture::{run_session, CaptureSession, Graphic, SessionOutcome};
use snackchat::config::Config;
use snackchat::logging::init_tracing;
use snackchat::pose::MoveNetDetector;
use snackchat::render::{Key, PreviewWindow};
use snackchat::transform::TransformResolver;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);
    init_tracing(&config.log);

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <graphic-id> <graphic.png> [output.png]", args[0]);
        std::process::exit(1);
    }
    let graphic_id = args[1].clone();
    let graphic_path = PathBuf::from(&args[2]);
    let output_path = PathBuf::from(args.get(3).map(String::as_str).unwrap_or("capture.png"));

    info!("SnackChat ({})", env!("GIT_VERSION"));

    let graphic_image = image::open(&graphic_path)
        .with_context(|| format!("Failed to load graphic {}", graphic_path.display()))?
        .to_rgba8();
    let graphic = Graphic::new(graphic_id, graphic_image);

    let mut camera = ThreadedCamera::start(&config.camera)?;
    let (width, height) = camera.resolution();
    info!("Camera resolution: {}x{}", width, height);

    info!("Loading model from {}...", config.model.path);
    let mut detector = MoveNetDetector::new(&config.model.path, config.feed.capture_size)?;

    let mut window = PreviewWindow::new("SnackChat", config.feed.feed_size as usize)?;

    let resolver = TransformResolver::from_config(&config);
    let session = CaptureSession::start(
        &config,
        &resolver,
        graphic,
        Instant::now(),
        &mut rand::thread_rng(),
    );
    let cancel = session.cancel_token();

    info!("Press ESC to cancel");
    let outcome = run_session(
        session,
        &mut camera,
        &mut detector,
        config.timing.frame_interval(),
        |session| {
            if !window.is_open() || window.is_key_down(Key::Escape) {
                cancel.cancel();
                return;
            }
            window.draw_session(session);
            if let Err(e) = window.update() {
                warn!("Window update failed: {:#}", e);
            }
        },
        |captured| match captured.to_data_url() {
            Ok(url) => info!("Data URL ready ({} bytes)", url.len()),
            Err(e) => warn!("Failed to encode data URL: {}", e),
        },
    );

    match outcome {
        SessionOutcome::Completed(captured) => {
            captured
                .image()
                .save(&output_path)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            info!("Saved {}", output_path.display());
        }
        SessionOutcome::Aborted => info!("Cancelled, nothing saved"),
    }

    Ok(())
}
