use hullcov_ir::{Expr, ShaderType, Var};

use super::context::StageWriter;

/// Pushes a rasterized corner `bloat` pixels away from the triangle
/// centroid on each axis and returns the bloated position.
///
/// The control triangle and the four-corner hull are both convex with the
/// centroid inside, so every corner moves outward. A per-axis step of
/// `bloat` only guarantees `bloat` of clearance along the axes: at an acute
/// corner the perpendicular distance to the outset edges can fall below
/// `bloat`, and fragments just past the ramp may be clipped.
pub fn emit_outset_corner(
    w: &mut StageWriter<'_>,
    points: &Expr,
    corner: &Expr,
    bloat: &Expr,
) -> Var {
    let sum = points.clone().at(0) + points.clone().at(1) + points.clone().at(2);
    let centroid = w.local("centroid", ShaderType::Vec2, sum / 3.0);
    let away = Expr::sign(corner.clone() - centroid);
    w.local("position", ShaderType::Vec2, corner.clone() + bloat.clone() * away)
}
