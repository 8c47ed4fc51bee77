//! CPU evaluation of a generated program for one concrete segment.
//!
//! The probe runs the same IR the backend serializes: setup once, then for a
//! sample position the vertex statements followed by the fragment statements,
//! with varyings copied across unchanged. The canonical coordinate, gradient
//! and edge distance are affine in screen space, so interpolating them is
//! exact and a direct evaluation at any point matches what the rasterizer
//! would produce. The corner term is only exact at the vertices, which
//! [`CoverageProbe::vertex_position`] places the same way the vertex entry
//! point does.

use hullcov_ir::{Env, IrError, Storage, Value, Var};

use crate::coords::Vec2;
use crate::program::{CurveInstance, CurveProgram};

/// Varyings evaluated at one position.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProbeSample {
    pub coord: Vec2,
    pub grad: Vec2,
    pub edge: f32,
    pub wind: f32,
    pub corner: Option<[f32; 2]>,
}

/// A program bound to one segment, with setup already executed.
pub struct CoverageProbe<'p> {
    program: &'p CurveProgram,
    setup: Env,
}

impl<'p> CoverageProbe<'p> {
    pub fn new(program: &'p CurveProgram, instance: &CurveInstance) -> Result<Self, IrError> {
        debug_assert!(!instance.points().is_degenerate(), "collinear control points");
        let inputs = program.inputs();
        let parts = program.parts();

        let mut env = Env::new();
        env.bind(&inputs.points, Value::Vec2Array(vec![instance.p0, instance.p1, instance.p2]));
        env.bind(&inputs.wind, instance.wind);
        env.bind(&inputs.bloat, program.config().bloat);
        if let Some(corner) = &inputs.corner_coverage {
            env.bind(corner, instance.corner_coverage);
        }
        for global in &parts.globals {
            env.declare(global);
        }
        env.exec(&parts.setup)?;

        log::trace!("probe: setup done for {instance:?}");
        Ok(Self { program, setup: env })
    }

    fn global(&self, var: &Var) -> Result<&Value, IrError> {
        self.setup.get(var).ok_or_else(|| IrError::Unbound(var.name.clone()))
    }

    /// Screen → canonical matrix, column-major.
    pub fn coord_transform(&self) -> Result<[[f32; 2]; 2], IrError> {
        let v = self.global(&self.program.setup().coord_matrix)?;
        v.as_mat2().ok_or_else(|| IrError::ty("coord_transform", [v.ty()]))
    }

    pub fn coord_origin(&self) -> Result<Vec2, IrError> {
        let v = self.global(&self.program.setup().coord_origin)?;
        v.as_vec2().map(Vec2::from).ok_or_else(|| IrError::ty("coord_origin", [v.ty()]))
    }

    pub fn edge_equation(&self) -> Result<[f32; 3], IrError> {
        let v = self.global(&self.program.setup().edge_equation)?;
        v.as_vec3().ok_or_else(|| IrError::ty("edge_equation", [v.ty()]))
    }

    /// Evaluated hull corners, if the program emits a hull.
    pub fn hull(&self) -> Result<Option<Vec<Vec2>>, IrError> {
        let Some(hull) = &self.program.setup().hull else { return Ok(None) };
        self.corners(hull).map(Some)
    }

    fn corners(&self, var: &Var) -> Result<Vec<Vec2>, IrError> {
        let v = self.global(var)?;
        let corners = v.as_vec2_array().ok_or_else(|| IrError::ty("corners", [v.ty()]))?;
        Ok(corners.iter().copied().map(Vec2::from).collect())
    }

    /// Corner the vertex entry point selects for `vertex_index`, before the
    /// outset: hull corners in strip order, or the control points.
    pub fn vertex_corner(&self, vertex_index: u32) -> Result<Vec2, IrError> {
        let count = self.program.vertices_per_instance();
        if vertex_index >= count {
            return Err(IrError::Index { len: count as usize, index: vertex_index as usize });
        }
        let corners = match &self.program.setup().hull {
            Some(hull) => self.corners(hull)?,
            None => self.corners(&self.program.inputs().points)?,
        };
        let slot = if self.program.config().hull { strip_slot(vertex_index) } else { vertex_index };
        corners
            .get(slot as usize)
            .copied()
            .ok_or(IrError::Index { len: corners.len(), index: slot as usize })
    }

    /// Rasterized position of `vertex_index`, outset by the bloat.
    pub fn vertex_position(&self, vertex_index: u32) -> Result<Vec2, IrError> {
        let corner = self.vertex_corner(vertex_index)?;
        let mut env = self.setup.clone();
        env.bind(&self.program.inputs().corner, corner.to_array());
        env.exec(&self.program.parts().placement)?;

        let position = self.program.position();
        let v = env.get(position).ok_or_else(|| IrError::Unbound(position.name.clone()))?;
        v.as_vec2().map(Vec2::from).ok_or_else(|| IrError::ty("position", [v.ty()]))
    }

    /// Canonical coordinate of a screen position.
    pub fn canonical(&self, pos: Vec2) -> Result<Vec2, IrError> {
        let m = self.coord_transform()?;
        let d = pos - self.coord_origin()?;
        Ok(Vec2::new(m[0][0] * d.x + m[1][0] * d.y, m[0][1] * d.x + m[1][1] * d.y))
    }

    fn run_vertex(&self, pos: Vec2) -> Result<Env, IrError> {
        let parts = self.program.parts();
        let mut env = self.setup.clone();
        env.bind(self.program.position(), pos.to_array());
        for v in &parts.varyings {
            env.declare(&v.out);
        }
        env.exec(&parts.vertex)?;
        Ok(env)
    }

    pub fn varyings_at(&self, pos: Vec2) -> Result<ProbeSample, IrError> {
        let env = self.run_vertex(pos)?;
        let varyings = self.program.varyings();

        let cg = lanes(&env, &varyings.coord_and_grad.out)?;
        let ewc = lanes(&env, &varyings.edge_wind_corner.out)?;
        let [edge, wind] = [ewc[0], ewc[1]];

        Ok(ProbeSample {
            coord: Vec2::new(cg[0], cg[1]),
            grad: Vec2::new(cg[2], cg[3]),
            edge,
            wind,
            corner: varyings.has_corner().then(|| [ewc[2], ewc[3]]),
        })
    }

    /// Signed fragment coverage at `pos`.
    pub fn coverage_at(&self, pos: Vec2) -> Result<f32, IrError> {
        let vertex = self.run_vertex(pos)?;
        let parts = self.program.parts();

        let mut fragment = Env::new();
        for v in &parts.varyings {
            let value = vertex.get(&v.out).ok_or_else(|| IrError::Unbound(v.name().to_owned()))?;
            fragment.bind(&v.input, value.clone());
        }
        for out in &parts.outputs {
            fragment.declare(out);
        }
        fragment.exec(&parts.fragment)?;

        let coverage = self.program.coverage();
        let v = fragment.get(coverage).ok_or_else(|| IrError::Unbound(coverage.name.clone()))?;
        v.as_float().ok_or_else(|| IrError::ty("coverage", [v.ty()]))
    }
}

fn lanes(env: &Env, var: &Var) -> Result<Vec<f32>, IrError> {
    debug_assert_eq!(var.storage, Storage::VaryingOut);
    let v = env.get(var).ok_or_else(|| IrError::Unbound(var.name.clone()))?;
    v.lanes().map(<[f32]>::to_vec).ok_or_else(|| IrError::ty("varying", [v.ty()]))
}

/// Triangle-strip order 0, 1, 3, 2 over the hull corners.
fn strip_slot(vertex_index: u32) -> u32 {
    vertex_index ^ (vertex_index >> 1)
}
