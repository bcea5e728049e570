//! Binary space partition visibility
//!
//! - [`BspPlane`]: a separating plane with front/back classification
//! - [`BspNode`]: partition tree built from the plane list, kept for tooling
//! - [`BspSystem`]: registered objects and the per-frame cull/draw pass

mod node;
mod plane;
mod system;


pub use node::BspNode;
pub use plane::BspPlane;
pub use system::BspSystem;
