use hullcov_ir::{Expr, ShaderType, Var};

use super::context::StageWriter;

/// Emits the distance equation of the flat edge from `left` to `right` into
/// `out` (a `Vec3`).
///
/// The normal is scaled by its L1 length times `2 * bloat`, so
/// `dot(out, (p, 1))` changes by about one unit per pixel, and offset by −½
/// so the coverage ramp is centred on the edge. The value grows toward the
/// left of the edge (y-up frame).
///
/// A zero-length edge leaves the equation zero; callers only produce one when
/// the winding, and with it the coverage, is zero too.
pub fn emit_edge_distance_equation(
    w: &mut StageWriter<'_>,
    left: &Expr,
    right: &Expr,
    bloat: &Expr,
    out: &Var,
) {
    debug_assert_eq!(out.ty, ShaderType::Vec3);

    let n = w.local(
        "n",
        ShaderType::Vec2,
        Expr::vec2(right.clone().y() - left.clone().y(), left.clone().x() - right.clone().x()),
    );
    let nwidth = w.local(
        "nwidth",
        ShaderType::Float,
        (Expr::abs(n.expr().x()) + Expr::abs(n.expr().y())) * (bloat.clone() * 2.0),
    );
    w.assign(
        &n,
        Expr::select(
            nwidth.expr().not_equal(0.0),
            n.expr() / nwidth.expr(),
            Expr::vec2(0.0, 0.0),
        ),
    );
    w.assign(
        out,
        Expr::construct(
            ShaderType::Vec3,
            [-n.expr(), Expr::dot(n.expr(), left.clone()) - 0.5],
        ),
    );
}
