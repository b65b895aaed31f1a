pub mod body;
pub mod descriptor;

pub use body::{BodyDescriptors, BodyPart};
pub use descriptor::{derive, wrap_angle, BodyPartDescriptor, FeedScale, LandmarkPoint};
