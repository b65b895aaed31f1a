pub mod clip;
pub mod compositor;
#[cfg(feature = "desktop")]
pub mod window;

pub use compositor::{encode_data_url, Compositor, Placement};
#[cfg(feature = "desktop")]
pub use minifb::Key;
#[cfg(feature = "desktop")]
pub use window::PreviewWindow;
