use image::{ImageResult, RgbaImage};
use rand::Rng;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::animation::FallingItems;
use super::phase::{CaptureStateMachine, Phase, TickSchedule, Transition};
use super::runner::CancelToken;
use crate::config::Config;
use crate::error::SessionError;
use crate::geometry::{BodyDescriptors, FeedScale};
use crate::pose::{EstimateOptions, FrameSource, PoseSource};
use crate::render::{encode_data_url, Compositor};
use crate::tracker::PoseSmoother;
use crate::transform::{ResolvedTransform, TransformResolver};

/// 被写体に重ねるグラフィック
#[derive(Debug, Clone)]
pub struct Graphic {
    pub id: String,
    pub image: RgbaImage,
}

impl Graphic {
    pub fn new(id: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            id: id.into(),
            image,
        }
    }
}

/// 撮影結果
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    image: RgbaImage,
}

impl CapturedImage {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn to_data_url(&self) -> ImageResult<String> {
        encode_data_url(&self.image)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(CapturedImage),
    Aborted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// 平滑化に入ったフレーム数
    pub samples: u32,
    /// 取得・推定・幾何の失敗で捨てたフレーム数
    pub skipped: u32,
    pub ticks: u32,
}

/// 1回分の撮影セッション
///
/// 状態機械・平滑化・変換・アニメーション・出力をまとめて所有する。
/// `step` を呼び続けると Positioning → CountingDown → Capturing → Done と進む。
pub struct CaptureSession {
    machine: CaptureStateMachine,
    smoother: PoseSmoother,
    transform: Option<ResolvedTransform>,
    graphic: Graphic,
    compositor: Compositor,
    falling: FallingItems,
    feed_scale: FeedScale,
    min_confidence: f32,
    options: EstimateOptions,
    tick_interval: Duration,
    transition_delay: Duration,
    next_tick: Instant,
    done_at: Option<Instant>,
    last_frame: Option<RgbaImage>,
    output: Option<CapturedImage>,
    cancel: CancelToken,
    stats: SessionStats,
}

impl CaptureSession {
    pub fn start<R: Rng + ?Sized>(
        config: &Config,
        resolver: &TransformResolver,
        graphic: Graphic,
        now: Instant,
        rng: &mut R,
    ) -> Self {
        let transform = resolver.resolve(&graphic.id);
        match &transform {
            Some(t) => info!("Graphic `{}` -> {} ({:?})", graphic.id, t.group, t.orientation),
            None => warn!("{}; compositing background only", SessionError::NoTransformMatch(graphic.id.clone())),
        }

        let tick_interval = config.timing.tick_interval();
        let schedule = TickSchedule::from_config(&config.timing);
        info!(
            "Session started: {} ticks x {}ms",
            schedule.total(),
            tick_interval.as_millis()
        );

        Self {
            machine: CaptureStateMachine::new(schedule),
            smoother: PoseSmoother::from_config(&config.smoothing),
            transform,
            graphic,
            compositor: Compositor::from_config(config),
            falling: FallingItems::new(&config.animation, config.feed.feed_size, rng),
            feed_scale: FeedScale::new(config.feed.feed_size, config.feed.capture_size),
            min_confidence: config.pose.min_confidence,
            options: EstimateOptions::from(&config.pose),
            tick_interval,
            transition_delay: config.timing.transition_delay(),
            next_tick: now + tick_interval,
            done_at: None,
            last_frame: None,
            output: None,
            cancel: CancelToken::new(),
            stats: SessionStats::default(),
        }
    }

    /// ループ本体。終了したら `Break(outcome)`
    pub fn step<F, P>(&mut self, now: Instant, frames: &mut F, poses: &mut P) -> ControlFlow<SessionOutcome>
    where
        F: FrameSource + ?Sized,
        P: PoseSource + ?Sized,
    {
        if let Some(outcome) = self.outcome() {
            return ControlFlow::Break(outcome);
        }
        if self.cancel.is_cancelled() {
            self.abort();
            return ControlFlow::Break(SessionOutcome::Aborted);
        }

        self.advance_timer(now);

        match self.machine.phase() {
            Phase::Positioning => self.falling.advance(),
            Phase::CountingDown => self.sample(frames, poses),
            Phase::Capturing => {
                if self.output.is_none() {
                    self.capture(now, frames);
                }
                if self.done_at.is_some_and(|done_at| now >= done_at) {
                    if self.machine.finish() == Some(Transition::Completed) {
                        info!("Transition finished");
                    }
                }
            }
            Phase::Done | Phase::Aborted => {}
        }

        match self.outcome() {
            Some(outcome) => ControlFlow::Break(outcome),
            None => ControlFlow::Continue(()),
        }
    }

    pub fn abort(&mut self) {
        if self.machine.abort().is_some() {
            self.done_at = None;
            info!("Session aborted at counter {}", self.machine.counter());
        }
    }

    /// 期限の来たtickをすべて適用する
    fn advance_timer(&mut self, now: Instant) {
        while now >= self.next_tick
            && matches!(self.machine.phase(), Phase::Positioning | Phase::CountingDown)
        {
            self.next_tick += self.tick_interval;
            self.stats.ticks += 1;
            match self.machine.tick() {
                Some(Transition::CountdownStarted) => info!("Countdown started"),
                Some(Transition::Captured) => info!("Capture triggered"),
                _ => {}
            }
        }
    }

    /// 1フレーム取得して推定し、平滑化に入れる。失敗はtickを消費しない
    fn sample<F, P>(&mut self, frames: &mut F, poses: &mut P)
    where
        F: FrameSource + ?Sized,
        P: PoseSource + ?Sized,
    {
        let frame = match frames.request_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.skip(&e);
                return;
            }
        };
        let pose = match poses.estimate_pose(&frame, &self.options) {
            Ok(pose) => pose,
            Err(e) => {
                self.skip(&e);
                return;
            }
        };

        // 推定中に中断・撮影されていたら結果は使わない
        if self.cancel.is_cancelled() || !self.machine.is_sampling() {
            debug!("Discarding stale estimate");
            return;
        }
        self.last_frame = Some(frame);

        match BodyDescriptors::from_pose(&pose, self.feed_scale, self.min_confidence) {
            Ok(body) => {
                let mean = self.smoother.feed(body);
                self.stats.samples += 1;
                debug!(
                    "Sample {}: shoulders span={:.1} angle={:.3}",
                    self.stats.samples,
                    mean.shoulders().span,
                    mean.shoulders().angle
                );
            }
            Err(e) => self.skip(&e),
        }
    }

    fn skip(&mut self, error: &SessionError) {
        self.stats.skipped += 1;
        warn!("Skipping frame: {}", error);
    }

    /// 合成は1回だけ。フレームがなければ次のstepで再試行
    fn capture<F>(&mut self, now: Instant, frames: &mut F)
    where
        F: FrameSource + ?Sized,
    {
        let fresh = match frames.request_frame() {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("Capture frame unavailable: {}", e);
                None
            }
        };
        let frame = match fresh.as_ref().or(self.last_frame.as_ref()) {
            Some(frame) => frame,
            None => return,
        };

        let image = self.compositor.compose(
            frame,
            self.smoother.current(),
            self.transform.as_ref(),
            &self.graphic.image,
        );
        info!("Captured {}x{} image", image.width(), image.height());
        self.output = Some(CapturedImage { image });
        self.done_at = Some(now + self.transition_delay);
    }

    fn outcome(&self) -> Option<SessionOutcome> {
        match self.machine.phase() {
            Phase::Done => Some(match &self.output {
                Some(image) => SessionOutcome::Completed(image.clone()),
                None => SessionOutcome::Aborted,
            }),
            Phase::Aborted => Some(SessionOutcome::Aborted),
            _ => None,
        }
    }

    /// 最新フレームに現在の平滑化値でオーバーレイを重ねたプレビュー
    pub fn preview(&self) -> Option<RgbaImage> {
        if let Some(output) = &self.output {
            return Some(output.image().clone());
        }
        self.last_frame.as_ref().map(|frame| {
            self.compositor.compose(
                frame,
                self.smoother.current(),
                self.transform.as_ref(),
                &self.graphic.image,
            )
        })
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn machine(&self) -> &CaptureStateMachine {
        &self.machine
    }

    pub fn smoothed(&self) -> Option<&BodyDescriptors> {
        self.smoother.current()
    }

    pub fn transform(&self) -> Option<&ResolvedTransform> {
        self.transform.as_ref()
    }

    pub fn graphic(&self) -> &Graphic {
        &self.graphic
    }

    pub fn falling_items(&self) -> &FallingItems {
        &self.falling
    }

    pub fn last_frame(&self) -> Option<&RgbaImage> {
        self.last_frame.as_ref()
    }

    pub fn output(&self) -> Option<&CapturedImage> {
        self.output.as_ref()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn feed_size(&self) -> u32 {
        self.compositor.feed_size()
    }
}
