use hullcov_ir::{Expr, ShaderType, Var};

use super::context::{EmitContext, Stage, StageWriter, Varying};
use super::edge::emit_edge_distance_equation;
use super::{CurveShader, SetupHandles, SetupInputs, VertexInputs};

/// Coverage shader for quadratic Bézier hulls.
///
/// Maps each segment into canonical space where the curve is `y = x²`, so the
/// implicit function `f = x² − y` is zero on the curve and negative on the
/// filled side. Coverage is a one-pixel linear ramp on `f`, clipped by the
/// flat edge P0–P2.
#[derive(Debug, Clone)]
pub struct QuadraticShader {
    bloat: Expr,
}

/// Setup-phase results, read by the varying phase.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticSetup {
    /// Screen → canonical matrix (applied to `position − coord_origin`).
    pub coord_matrix: Var,
    pub coord_origin: Var,
    pub edge_equation: Var,
    pub hull: Option<Var>,
}

impl SetupHandles for QuadraticSetup {
    fn hull(&self) -> Option<&Var> {
        self.hull.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticVaryings {
    /// `xy` canonical coordinate, `zw` bloated gradient of `f`.
    pub coord_and_grad: Varying,
    /// `x` edge distance, `y` winding, `zw` corner terms when enabled.
    pub edge_wind_corner: Varying,
}

impl QuadraticVaryings {
    #[inline]
    pub fn has_corner(&self) -> bool {
        self.edge_wind_corner.ty() == ShaderType::Vec4
    }
}

impl QuadraticShader {
    /// `bloat` is the antialiasing half-width, usually an input or constant.
    pub fn new(bloat: Expr) -> Self {
        debug_assert_eq!(bloat.ty(), Ok(ShaderType::Float));
        Self { bloat }
    }
}

impl CurveShader for QuadraticShader {
    type Setup = QuadraticSetup;
    type Varyings = QuadraticVaryings;

    fn emit_setup(&self, ctx: &mut EmitContext, inputs: &SetupInputs) -> QuadraticSetup {
        log::trace!("quadratic: emitting setup (hull: {})", inputs.emit_hull);

        let coord_matrix = ctx.declare_global("qcoord_matrix", ShaderType::Mat2);
        let coord_origin = ctx.declare_global("qcoord0", ShaderType::Vec2);
        let edge_equation = ctx.declare_global("edge_distance_equation", ShaderType::Vec3);

        let p = |i: usize| inputs.points.clone().at(i);
        let mut w = ctx.stage(Stage::Setup);

        // Basis (P2−P0, P1−P0) → canonical: P2 lands on (1, 1), P1 on (½, 0).
        w.assign(
            &coord_matrix,
            Expr::mat2(1.0, 1.0, 0.5, 0.0) * Expr::inverse(Expr::mat2_cols(p(2) - p(0), p(1) - p(0))),
        );
        w.assign(&coord_origin, p(0));

        let positive = inputs.wind.clone().greater_than(0.0);
        let edgept0 = w.local("edgept0", ShaderType::Vec2, Expr::select(positive.clone(), p(2), p(0)));
        let edgept1 = w.local("edgept1", ShaderType::Vec2, Expr::select(positive, p(0), p(2)));
        emit_edge_distance_equation(&mut w, &edgept0.expr(), &edgept1.expr(), &self.bloat, &edge_equation);

        // Clip the control triangle by the tangent at t = ½, where a quadratic
        // peaks. One De Casteljau split, exact for quadratics.
        let hull = inputs.emit_hull.then(|| {
            let ty = ShaderType::Vec2Array(4);
            let corners = [p(0), (p(0) + p(1)) * 0.5, (p(1) + p(2)) * 0.5, p(2)];
            w.local("quadratic_hull", ty, Expr::construct(ty, corners))
        });

        QuadraticSetup { coord_matrix, coord_origin, edge_equation, hull }
    }

    fn declare_varyings(
        &self,
        ctx: &mut EmitContext,
        setup: &QuadraticSetup,
        inputs: &VertexInputs,
    ) -> QuadraticVaryings {
        log::trace!("quadratic: declaring varyings (corner: {})", inputs.corner_coverage.is_some());

        let coord_and_grad = ctx.add_varying("coord_and_grad", ShaderType::Vec4);
        // Full precision: the distance to the opposite edge can be large.
        let ewc_ty = if inputs.corner_coverage.is_some() { ShaderType::Vec4 } else { ShaderType::Vec2 };
        let edge_wind_corner = ctx.add_varying("edge_and_wind_and_corner", ewc_ty);

        let m = setup.coord_matrix.expr();
        let mut w = ctx.stage(Stage::Vertex);

        let coord = w.local(
            "coord",
            ShaderType::Vec2,
            m.clone() * (inputs.position.clone() - setup.coord_origin.expr()),
        );
        // d(x² − y)/d(screen) = (2x, −1) · M, as a row vector.
        let grad = w.local(
            "grad",
            ShaderType::Vec2,
            Expr::lit(2.0) * self.bloat.clone() * Expr::vec2(Expr::lit(2.0) * coord.expr().x(), -1.0) * m,
        );
        w.assign(
            &coord_and_grad.out,
            Expr::construct(ShaderType::Vec4, [coord.expr(), grad.expr()]),
        );

        let edge = w.local(
            "edge",
            ShaderType::Float,
            Expr::dot(
                setup.edge_equation.expr(),
                Expr::construct(ShaderType::Vec3, [inputs.position.clone(), Expr::lit(1.0)]),
            ),
        );

        match &inputs.corner_coverage {
            None => w.assign(
                &edge_wind_corner.out,
                Expr::vec2(edge.expr(), inputs.coverage.clone()),
            ),
            Some(corner_coverage) => {
                let hull_coverage = w.local("hull_coverage", ShaderType::Float, Expr::lit(0.0));
                emit_hull_coverage(&mut w, &coord_and_grad.out.expr(), &edge.expr(), &hull_coverage);
                let corner = w.local(
                    "corner",
                    ShaderType::Vec2,
                    Expr::vec2(hull_coverage.expr(), 1.0) * corner_coverage.clone(),
                );
                w.assign(
                    &edge_wind_corner.out,
                    Expr::construct(
                        ShaderType::Vec4,
                        [edge.expr(), inputs.coverage.clone(), corner.expr()],
                    ),
                );
            }
        }

        QuadraticVaryings { coord_and_grad, edge_wind_corner }
    }

    fn emit_coverage(&self, ctx: &mut EmitContext, varyings: &QuadraticVaryings, output: &Var) {
        log::trace!("quadratic: emitting fragment coverage into `{}`", output.name);

        let ewc = varyings.edge_wind_corner.input.expr();
        let mut w = ctx.stage(Stage::Fragment);

        emit_hull_coverage(&mut w, &varyings.coord_and_grad.input.expr(), &ewc.clone().x(), output);
        w.assign(output, output.expr() * ewc.clone().y());

        if varyings.has_corner() {
            // Attenuated corner coverage.
            w.assign(output, ewc.clone().z() * ewc.w() + output.expr());
        }
    }
}

/// Emits coverage of the region between the curve and the flat edge into
/// `out`, from a canonical coordinate + gradient (`Vec4`) and an edge
/// distance.
///
/// Shared by the vertex stage (corner attenuation) and the fragment stage.
pub fn emit_hull_coverage(w: &mut StageWriter<'_>, coord_and_grad: &Expr, edge: &Expr, out: &Var) {
    let x = w.local("x", ShaderType::Float, coord_and_grad.clone().x());
    let y = w.local("y", ShaderType::Float, coord_and_grad.clone().y());
    let grad = w.local("grad", ShaderType::Vec2, coord_and_grad.clone().zw());
    let f = w.local("f", ShaderType::Float, x.expr() * x.expr() - y.expr());
    // L1 stand-in for the gradient length.
    let fwidth = w.local(
        "fwidth_l1",
        ShaderType::Float,
        Expr::abs(grad.expr().x()) + Expr::abs(grad.expr().y()),
    );
    // Curve coverage.
    w.assign(out, Expr::min(Expr::lit(0.5) - f.expr() / fwidth.expr(), 1.0));
    // Flat edge opposite the curve.
    let d = w.local("d", ShaderType::Float, Expr::min(edge.clone(), 0.0));
    w.assign(out, Expr::max(out.expr() + d.expr(), 0.0));
}

#[cfg(test)]
mod tests {
    use hullcov_ir::{Builtin, Stmt, Storage};

    use super::*;

    fn inputs(corner: bool, hull: bool) -> (SetupInputs, VertexInputs) {
        let wind = Var::input("wind", ShaderType::Float).expr();
        (
            SetupInputs {
                points: Var::input("pts", ShaderType::Vec2Array(3)).expr(),
                wind: wind.clone(),
                emit_hull: hull,
            },
            VertexInputs {
                position: Var::input("position", ShaderType::Vec2).expr(),
                coverage: wind,
                corner_coverage: corner
                    .then(|| Var::input("corner_coverage", ShaderType::Vec2).expr()),
            },
        )
    }

    fn emit(corner: bool, hull: bool) -> (QuadraticSetup, QuadraticVaryings, crate::shader::ShaderParts) {
        let shader = QuadraticShader::new(Var::input("bloat", ShaderType::Float).expr());
        let (si, vi) = inputs(corner, hull);
        let mut ctx = EmitContext::new();
        let setup = shader.emit_setup(&mut ctx, &si);
        let varyings = shader.declare_varyings(&mut ctx, &setup, &vi);
        let out = ctx.declare_output("coverage", ShaderType::Float);
        shader.emit_coverage(&mut ctx, &varyings, &out);
        (setup, varyings, ctx.finish())
    }

    #[test]
    fn setup_declares_three_globals() {
        let (setup, _, parts) = emit(false, true);
        assert_eq!(parts.globals, vec![setup.coord_matrix, setup.coord_origin, setup.edge_equation]);
        assert!(parts.globals.iter().all(|g| g.storage == Storage::Global));
    }

    #[test]
    fn hull_is_only_emitted_on_request() {
        let (with, _, parts) = emit(false, true);
        let hull = with.hull.expect("hull requested");
        assert_eq!(hull.ty, ShaderType::Vec2Array(4));
        assert!(parts.setup.iter().any(|s| s.target() == &hull));

        let (without, _, parts) = emit(false, false);
        assert!(without.hull.is_none());
        assert!(parts.setup.iter().all(|s| s.target().ty != ShaderType::Vec2Array(4)));
    }

    #[test]
    fn edge_varying_widens_for_corners() {
        let (_, plain, _) = emit(false, true);
        assert_eq!(plain.edge_wind_corner.ty(), ShaderType::Vec2);
        assert!(!plain.has_corner());

        let (_, cornered, _) = emit(true, true);
        assert_eq!(cornered.edge_wind_corner.ty(), ShaderType::Vec4);
        assert_eq!(cornered.coord_and_grad.ty(), ShaderType::Vec4);
    }

    #[test]
    fn corner_mode_adds_one_fragment_statement() {
        let (_, _, plain) = emit(false, true);
        let (_, _, cornered) = emit(true, true);
        assert_eq!(cornered.fragment.len(), plain.fragment.len() + 1);
    }

    #[test]
    fn corner_mode_evaluates_hull_coverage_per_vertex() {
        let (_, _, plain) = emit(false, true);
        let (_, _, cornered) = emit(true, true);
        fn has_fwidth(stmts: &[Stmt]) -> bool {
            stmts.iter().any(|s| s.target().name.starts_with("fwidth_l1"))
        }
        assert!(!has_fwidth(&plain.vertex));
        assert!(has_fwidth(&cornered.vertex));
        assert!(has_fwidth(&cornered.fragment));
    }

    #[test]
    fn every_stage_type_checks() {
        for corner in [false, true] {
            for hull in [false, true] {
                let (_, _, parts) = emit(corner, hull);
                assert_eq!(parts.check(), Ok(()), "corner={corner} hull={hull}");
            }
        }
    }

    #[test]
    fn setup_inverts_the_control_basis() {
        let (_, _, parts) = emit(false, false);
        assert!(parts.setup.iter().any(|s| s.value().uses(Builtin::Inverse)));
        assert!(!parts.vertex.iter().any(|s| s.value().uses(Builtin::Inverse)));
    }
}
