//! CLI command implementations.

pub mod render;
pub mod ssg;

pub use render::RenderArgs;
pub use ssg::SsgArgs;
