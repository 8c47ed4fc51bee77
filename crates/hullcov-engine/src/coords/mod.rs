//! Geometry types for curve segments.
//!
//! Device space:
//! - Pixels, origin top-left
//! - +X right, +Y down
//!
//! Orientation and winding are defined with the usual y-up cross product, so a
//! segment that looks clockwise on screen has positive winding.

mod control_points;
mod rect;
mod vec2;

pub use control_points::ControlPoints;
pub use rect::Rect;
pub use vec2::Vec2;
