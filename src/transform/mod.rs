pub mod affine;
pub mod catalog;

pub use affine::{Affine, Orientation};
pub use catalog::{ResolvedTransform, TransformGroup, TransformResolver};
