pub mod ring;
pub mod smooth;

pub use ring::CircularBuffer;
pub use smooth::PoseSmoother;
