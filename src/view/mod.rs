//! Viewport and projection layer
//!
//! Zoom/pan transform, minimap projection and search highlighting, all
//! layered over layout positions without modifying them.

mod bounds;
mod highlight;
mod minimap;
mod transform;

pub use bounds::{Bounds, Point, Size};
pub use highlight::{Emphasis, Highlight, Partition};
pub use minimap::{Minimap, MinimapFrame, MinimapProjection};
pub use transform::{ease_out_cubic, TransformAnimation, ViewTransform, ZoomRange};
