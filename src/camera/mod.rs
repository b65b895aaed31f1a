pub mod capture;

pub use capture::{mat_to_square_rgba, OpenCvCamera, ThreadedCamera};
