use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use opencv::{
    core::{Mat, Vec3b},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs, VideoCaptureTrait},
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{info, warn};

use crate::config::CameraConfig;
use crate::error::SessionError;
use crate::pose::FrameSource;

/// OpenCVを使用したカメラキャプチャ
pub struct OpenCvCamera {
    capture: VideoCapture,
    width: u32,
    height: u32,
}

impl OpenCvCamera {
    pub fn open(config: &CameraConfig) -> Result<Self> {
        Self::open_with_resolution(config.index, Some(config.width), Some(config.height))
    }

    /// 解像度を指定してカメラを開く
    pub fn open_with_resolution(index: i32, width: Option<u32>, height: Option<u32>) -> Result<Self> {
        let mut capture =
            VideoCapture::new(index, VideoCaptureAPIs::CAP_ANY as i32).context("Failed to open camera")?;

        if !capture.is_opened()? {
            anyhow::bail!("Camera {} is not available", index);
        }

        if let Some(w) = width {
            capture.set(videoio::CAP_PROP_FRAME_WIDTH, w as f64)?;
        }
        if let Some(h) = height {
            capture.set(videoio::CAP_PROP_FRAME_HEIGHT, h as f64)?;
        }
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

        let actual_width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let actual_height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        info!("Camera {} opened at {}x{}", index, actual_width, actual_height);

        Ok(Self {
            capture,
            width: actual_width,
            height: actual_height,
        })
    }

    /// 解像度を取得
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// フレームを読み込む（BGR形式）
    pub fn read_frame(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();
        self.capture
            .read(&mut frame)
            .context("Failed to read frame")?;

        if frame.empty() {
            anyhow::bail!("Empty frame received");
        }

        Ok(frame)
    }
}

impl FrameSource for OpenCvCamera {
    fn request_frame(&mut self) -> Result<RgbaImage, SessionError> {
        let frame = self
            .read_frame()
            .map_err(|e| SessionError::FrameUnavailable(format!("{:#}", e)))?;
        mat_to_square_rgba(&frame).map_err(|e| SessionError::FrameUnavailable(format!("{:#}", e)))
    }
}

/// 別スレッドでカメラキャプチャを行い、最新フレームを提供する
pub struct ThreadedCamera {
    latest: Arc<Mutex<Option<Mat>>>,
    frame_id: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    last_served: u64,
    width: u32,
    height: u32,
    handle: Option<thread::JoinHandle<()>>,
}

impl ThreadedCamera {
    pub fn start(config: &CameraConfig) -> Result<Self> {
        let mut camera = OpenCvCamera::open(config)?;
        let (w, h) = camera.resolution();
        let latest = Arc::new(Mutex::new(None::<Mat>));
        let latest_ref = latest.clone();
        let frame_id = Arc::new(AtomicU64::new(0));
        let frame_id_ref = frame_id.clone();
        let running = Arc::new(AtomicBool::new(true));
        let running_ref = running.clone();

        let handle = thread::spawn(move || {
            while running_ref.load(Ordering::Acquire) {
                match camera.read_frame() {
                    Ok(frame) => {
                        if let Ok(mut guard) = latest_ref.lock() {
                            *guard = Some(frame);
                        }
                        frame_id_ref.fetch_add(1, Ordering::Release);
                    }
                    Err(e) => warn!("Camera read failed: {:#}", e),
                }
            }
        });

        Ok(Self {
            latest,
            frame_id,
            running,
            last_served: 0,
            width: w,
            height: h,
            handle: Some(handle),
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 現在のフレームIDを取得。新フレームが到着するたびにインクリメントされる。
    pub fn frame_id(&self) -> u64 {
        self.frame_id.load(Ordering::Acquire)
    }

    /// 最新フレームを取得。初回フレーム到着前のみNone。
    pub fn get_frame(&self) -> Option<Mat> {
        let guard = self.latest.lock().ok()?;
        guard.as_ref().map(|m| m.clone())
    }
}

impl FrameSource for ThreadedCamera {
    /// 前回から新しいフレームが届いていなければ `FrameUnavailable`
    fn request_frame(&mut self) -> Result<RgbaImage, SessionError> {
        let id = self.frame_id();
        if id == self.last_served {
            return Err(SessionError::FrameUnavailable("no new frame".to_string()));
        }
        let frame = self
            .get_frame()
            .ok_or_else(|| SessionError::FrameUnavailable("camera not ready".to_string()))?;
        self.last_served = id;
        mat_to_square_rgba(&frame).map_err(|e| SessionError::FrameUnavailable(format!("{:#}", e)))
    }
}

impl Drop for ThreadedCamera {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// BGR Mat の中央を正方形に切り出して RGBA に変換
///
/// キャプチャ座標は正方形前提なので、ここで縦横比を揃える。
pub fn mat_to_square_rgba(frame: &Mat) -> Result<RgbaImage> {
    let cols = frame.cols();
    let rows = frame.rows();
    let side = cols.min(rows);
    if side <= 0 {
        anyhow::bail!("Empty frame received");
    }
    let x0 = (cols - side) / 2;
    let y0 = (rows - side) / 2;

    let mut image = RgbaImage::new(side as u32, side as u32);
    for y in 0..side {
        for x in 0..side {
            let pixel = frame.at_2d::<Vec3b>(y0 + y, x0 + x)?;
            image.put_pixel(x as u32, y as u32, Rgba([pixel[2], pixel[1], pixel[0], 255]));
        }
    }
    Ok(image)
}
