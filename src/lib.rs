#[cfg(feature = "desktop")]
pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod pose;
pub mod render;
pub mod tracker;
pub mod transform;
