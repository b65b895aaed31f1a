use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use super::session::{CaptureSession, CapturedImage, SessionOutcome};
use crate::pose::{FrameSource, PoseSource};

/// 別スレッド（UI側）からセッションを中断するためのトークン
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// セッションを終了までループで回す
///
/// 1ループ = `step` 1回 + `observe` 1回。`frame_interval` に満たない分は
/// sleep で埋める。完了時のみ `on_complete` を呼ぶ。
pub fn run_session<F, P, O, C>(
    mut session: CaptureSession,
    frames: &mut F,
    poses: &mut P,
    frame_interval: Duration,
    mut observe: O,
    on_complete: C,
) -> SessionOutcome
where
    F: FrameSource + ?Sized,
    P: PoseSource + ?Sized,
    O: FnMut(&CaptureSession),
    C: FnOnce(&CapturedImage),
{
    loop {
        let loop_start = Instant::now();

        if let ControlFlow::Break(outcome) = session.step(loop_start, frames, poses) {
            match &outcome {
                SessionOutcome::Completed(image) => {
                    info!(
                        "Session completed: {} samples, {} skipped",
                        session.stats().samples,
                        session.stats().skipped
                    );
                    on_complete(image);
                }
                SessionOutcome::Aborted => info!("Session aborted"),
            }
            return outcome;
        }

        observe(&session);

        let elapsed = loop_start.elapsed();
        if elapsed < frame_interval {
            thread::sleep(frame_interval - elapsed);
        }
    }
}
