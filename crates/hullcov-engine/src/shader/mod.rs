//! Curve coverage shaders.
//!
//! A curve shader runs in three phases, each appending IR to an
//! [`EmitContext`]:
//!
//! 1. setup: once per primitive, derives per-segment values
//! 2. varyings: per vertex, writes the interpolated values
//! 3. coverage: per fragment, turns interpolated values into coverage
//!
//! Between setup and varyings the driver places the rasterized corner (see
//! [`emit_outset_corner`]). Phases hand typed handles forward instead of
//! sharing mutable state.

mod context;
mod edge;
mod outset;
mod quadratic;

use hullcov_ir::{Expr, ShaderType, Var};

pub use context::{EmitContext, ShaderParts, Stage, StageWriter, Varying};
pub use edge::emit_edge_distance_equation;
pub use outset::emit_outset_corner;
pub use quadratic::{QuadraticSetup, QuadraticShader, QuadraticVaryings, emit_hull_coverage};

/// Symbolic inputs to the setup phase.
#[derive(Debug, Clone)]
pub struct SetupInputs {
    /// `Vec2Array(3)`: P0, P1, P2.
    pub points: Expr,
    /// Signed winding. Its sign selects the flat edge orientation.
    pub wind: Expr,
    /// Emit bounding geometry for rasterization.
    pub emit_hull: bool,
}

/// Symbolic per-vertex inputs to the varying phase.
#[derive(Debug, Clone)]
pub struct VertexInputs {
    pub position: Expr,
    /// Coverage multiplier; the winding itself for plain fills.
    pub coverage: Expr,
    /// `(weight, attenuation)`, or one scalar for both, when corner coverage
    /// is enabled.
    pub corner_coverage: Option<Expr>,
}

/// Symbolic per-vertex inputs before the corner is placed.
#[derive(Debug, Clone)]
pub struct CornerInputs {
    /// Hull or triangle corner selected for this vertex, before the outset.
    pub corner: Expr,
    /// Outset distance in pixels.
    pub bloat: Expr,
    pub coverage: Expr,
    pub corner_coverage: Option<Expr>,
}

/// Handles every setup result exposes to the program assembler.
pub trait SetupHandles {
    /// Bounding polygon to rasterize, when one was requested.
    fn hull(&self) -> Option<&Var>;
}

/// A coverage shader for one curve type.
pub trait CurveShader {
    type Setup: SetupHandles;
    type Varyings;

    fn emit_setup(&self, ctx: &mut EmitContext, inputs: &SetupInputs) -> Self::Setup;

    fn declare_varyings(
        &self,
        ctx: &mut EmitContext,
        setup: &Self::Setup,
        inputs: &VertexInputs,
    ) -> Self::Varyings;

    /// Writes the signed fragment coverage into `output` (a `Float`).
    fn emit_coverage(&self, ctx: &mut EmitContext, varyings: &Self::Varyings, output: &Var);
}

/// Result of running all three phases of a curve shader.
#[derive(Debug)]
pub struct EmittedCurve<S: CurveShader> {
    pub setup: S::Setup,
    pub varyings: S::Varyings,
    /// Bloated vertex position, written in [`Stage::Placement`].
    pub position: Var,
    pub coverage: Var,
    pub parts: ShaderParts,
}

/// Runs setup, corner placement, varyings and coverage in order on a fresh
/// context.
///
/// `reserved` lists identifiers the surrounding program already uses.
pub fn emit_curve<'n, S: CurveShader>(
    shader: &S,
    setup_inputs: &SetupInputs,
    corner_inputs: &CornerInputs,
    reserved: impl IntoIterator<Item = &'n str>,
) -> EmittedCurve<S> {
    let mut ctx = EmitContext::new();
    ctx.reserve(reserved);

    let setup = shader.emit_setup(&mut ctx, setup_inputs);
    let position = emit_outset_corner(
        &mut ctx.stage(Stage::Placement),
        &setup_inputs.points,
        &corner_inputs.corner,
        &corner_inputs.bloat,
    );
    let vertex_inputs = VertexInputs {
        position: position.expr(),
        coverage: corner_inputs.coverage.clone(),
        corner_coverage: corner_inputs.corner_coverage.clone(),
    };
    let varyings = shader.declare_varyings(&mut ctx, &setup, &vertex_inputs);
    let coverage = ctx.declare_output("coverage", ShaderType::Float);
    shader.emit_coverage(&mut ctx, &varyings, &coverage);

    EmittedCurve { setup, varyings, position, coverage, parts: ctx.finish() }
}
