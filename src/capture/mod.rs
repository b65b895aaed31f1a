pub mod animation;
pub mod phase;
pub mod runner;
pub mod session;

pub use animation::{FallingItem, FallingItems};
pub use phase::{CaptureStateMachine, Phase, TickSchedule, Transition};
pub use runner::{run_session, CancelToken};
pub use session::{CaptureSession, CapturedImage, Graphic, SessionOutcome, SessionStats};
