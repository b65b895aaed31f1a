use super::ring::CircularBuffer;
use crate::config::SmoothingConfig;
use crate::geometry::BodyDescriptors;

/// 直近 N フレームの部位記述子の移動平均
///
/// 充填中は逐次平均、満杯後は追い出し値を使った O(1) の窓平均で更新する。
/// バッファを再走査しない。NaN を含むフレームは呼び出し側で弾くこと。
pub struct PoseSmoother {
    buffer: CircularBuffer<BodyDescriptors>,
    mean: Option<BodyDescriptors>,
}

impl PoseSmoother {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: CircularBuffer::new(capacity),
            mean: None,
        }
    }

    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self::new(config.buffer_size)
    }

    pub fn feed(&mut self, sample: BodyDescriptors) -> BodyDescriptors {
        let mean = next_mean(
            self.mean.as_ref(),
            self.buffer.len(),
            self.buffer.capacity(),
            self.buffer.peek_evicted(),
            &sample,
        );
        self.buffer.push(sample);
        self.mean = Some(mean);
        mean
    }

    /// 最新の平均（未入力なら None）
    pub fn current(&self) -> Option<&BodyDescriptors> {
        self.mean.as_ref()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.mean = None;
    }
}

/// 平均の差分更新
///
/// - 初回: 入力値そのもの
/// - 充填中: (avg * n + new) / (n + 1)
/// - 満杯: (avg * cap - evicted + new) / cap
fn next_mean(
    mean: Option<&BodyDescriptors>,
    count: usize,
    capacity: usize,
    evicted: Option<&BodyDescriptors>,
    sample: &BodyDescriptors,
) -> BodyDescriptors {
    match (mean, evicted) {
        (None, _) => *sample,
        (Some(avg), None) => {
            let n = count as f32;
            avg.zip_with(sample, |a, s| (a * n + s) / (n + 1.0))
        }
        (Some(avg), Some(oldest)) => {
            let cap = capacity as f32;
            avg.zip_with(oldest, |a, o| a * cap - o)
                .zip_with(sample, |rest, s| (rest + s) / cap)
        }
    }
}
