use crate::config::TimingConfig;

/// 撮影セッションのフェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 位置合わせ中（落下アニメーション）
    Positioning,
    /// カウントダウン中（姿勢をサンプリング）
    CountingDown,
    /// 撮影済み、遷移アニメーション中
    Capturing,
    Done,
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Aborted)
    }
}

/// tick / finish / abort で起きた遷移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    CountdownStarted,
    Captured,
    Completed,
    Aborted,
}

/// 各フェーズのtick数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSchedule {
    pub loading: u32,
    pub countdown: u32,
    pub capture: u32,
}

impl TickSchedule {
    pub fn new(loading: u32, countdown: u32, capture: u32) -> Self {
        Self {
            loading,
            countdown,
            capture,
        }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.loading_ticks, timing.countdown_ticks, timing.capture_ticks)
    }

    pub fn total(&self) -> u32 {
        self.loading + self.countdown + self.capture
    }
}

impl Default for TickSchedule {
    fn default() -> Self {
        Self::from_config(&TimingConfig::default())
    }
}

/// カウントダウン状態機械
///
/// カウンタは `loading + countdown + capture` から始まり、tickごとに1減る。
/// `countdown + capture` 以下でサンプリング開始、`capture` 以下で撮影。
/// 時間は持たないので、tickを打つタイミングは呼び出し側が決める。
/// `countdown == 0` だと CountingDown を経ずに撮影する（設定読み込みでは弾く）。
#[derive(Debug, Clone)]
pub struct CaptureStateMachine {
    schedule: TickSchedule,
    counter: u32,
    phase: Phase,
    captured: bool,
}

impl CaptureStateMachine {
    pub fn new(schedule: TickSchedule) -> Self {
        let mut machine = Self {
            schedule,
            counter: schedule.total(),
            phase: Phase::Positioning,
            captured: false,
        };
        // tick数0の設定でも初期状態が閾値と矛盾しないようにする
        if machine.counter <= schedule.countdown + schedule.capture {
            machine.phase = Phase::CountingDown;
        }
        machine
    }

    pub fn tick(&mut self) -> Option<Transition> {
        if !matches!(self.phase, Phase::Positioning | Phase::CountingDown) {
            return None;
        }
        self.counter = self.counter.saturating_sub(1);

        if self.counter <= self.schedule.capture && !self.captured {
            self.captured = true;
            self.phase = Phase::Capturing;
            return Some(Transition::Captured);
        }
        if self.phase == Phase::Positioning
            && self.counter <= self.schedule.countdown + self.schedule.capture
        {
            self.phase = Phase::CountingDown;
            return Some(Transition::CountdownStarted);
        }
        None
    }

    /// 遷移アニメーション終了
    pub fn finish(&mut self) -> Option<Transition> {
        if self.phase != Phase::Capturing {
            return None;
        }
        self.phase = Phase::Done;
        Some(Transition::Completed)
    }

    pub fn abort(&mut self) -> Option<Transition> {
        if self.phase.is_terminal() {
            return None;
        }
        self.phase = Phase::Aborted;
        Some(Transition::Aborted)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn schedule(&self) -> TickSchedule {
        self.schedule
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// 姿勢サンプリングを行うフェーズか
    pub fn is_sampling(&self) -> bool {
        self.phase == Phase::CountingDown
    }

    /// 落下アニメーションを動かすフェーズか
    pub fn is_animating(&self) -> bool {
        self.phase == Phase::Positioning
    }

    /// ヘッダに表示するカウントダウン数字
    pub fn display_count(&self) -> Option<u32> {
        self.is_sampling()
            .then(|| self.counter.saturating_sub(self.schedule.capture))
    }
}

impl Default for CaptureStateMachine {
    fn default() -> Self {
        Self::new(TickSchedule::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> CaptureStateMachine {
        CaptureStateMachine::new(TickSchedule::new(3, 3, 2))
    }

    #[test]
    fn test_initial_state() {
        let m = machine();
        assert_eq!(m.counter(), 8);
        assert_eq!(m.phase(), Phase::Positioning);
        assert!(m.is_animating());
        assert!(!m.is_sampling());
        assert!(!m.is_captured());
    }

    #[test]
    fn test_full_countdown() {
        let mut m = machine();
        assert_eq!(m.tick(), None);
        assert_eq!(m.tick(), None);
        assert_eq!(m.tick(), Some(Transition::CountdownStarted));
        assert_eq!(m.counter(), 5);
        assert_eq!(m.phase(), Phase::CountingDown);
        assert_eq!(m.display_count(), Some(3));

        assert_eq!(m.tick(), None);
        assert_eq!(m.display_count(), Some(2));
        assert_eq!(m.tick(), None);
        assert_eq!(m.tick(), Some(Transition::Captured));
        assert_eq!(m.counter(), 2);
        assert_eq!(m.phase(), Phase::Capturing);
        assert!(m.is_captured());
        assert!(!m.is_sampling());
    }

    #[test]
    fn test_capture_fires_once() {
        let mut m = machine();
        let captured = (0..20).filter_map(|_| m.tick()).filter(|t| *t == Transition::Captured).count();
        assert_eq!(captured, 1);
        // 撮影後はtickでカウンタが動かない
        assert_eq!(m.counter(), 2);
    }

    #[test]
    fn test_finish_only_from_capturing() {
        let mut m = machine();
        assert_eq!(m.finish(), None);
        for _ in 0..6 {
            m.tick();
        }
        assert_eq!(m.finish(), Some(Transition::Completed));
        assert_eq!(m.phase(), Phase::Done);
        assert_eq!(m.abort(), None);
    }

    #[test]
    fn test_abort_mid_countdown() {
        let mut m = machine();
        for _ in 0..4 {
            m.tick();
        }
        assert_eq!(m.abort(), Some(Transition::Aborted));
        let counter = m.counter();
        for _ in 0..10 {
            assert_eq!(m.tick(), None);
        }
        assert_eq!(m.counter(), counter);
        assert_eq!(m.phase(), Phase::Aborted);
        assert!(!m.is_captured());
        assert_eq!(m.finish(), None);
    }

    #[test]
    fn test_zero_countdown_skips_sampling() {
        let mut m = CaptureStateMachine::new(TickSchedule::new(2, 0, 1));
        assert_eq!(m.tick(), None);
        assert_eq!(m.tick(), Some(Transition::Captured));
        assert_eq!(m.phase(), Phase::Capturing);
        assert_eq!(m.display_count(), None);
    }

    #[test]
    fn test_zero_loading_starts_counting() {
        let m = CaptureStateMachine::new(TickSchedule::new(0, 2, 1));
        assert_eq!(m.phase(), Phase::CountingDown);
    }

    #[test]
    fn test_schedule_from_config() {
        let schedule = TickSchedule::from_config(&TimingConfig::default());
        assert_eq!(schedule, TickSchedule::new(3, 3, 2));
        assert_eq!(schedule.total(), 8);
    }
}
