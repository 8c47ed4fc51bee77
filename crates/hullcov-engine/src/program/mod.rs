//! Complete shader programs built from a curve shader.

mod assemble;
mod gpu;

use std::borrow::Cow;

use hullcov_ir::{ShaderType, Var};

use crate::config::EmitConfig;
use crate::shader::{
    CornerInputs, EmittedCurve, QuadraticSetup, QuadraticShader, QuadraticVaryings, SetupHandles,
    SetupInputs, ShaderParts, emit_curve,
};

pub use gpu::{
    COVERAGE_FORMAT, CurveInstance, ViewportUniform, coverage_count_blend, coverage_target,
};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Variables the program template binds before the emitted statements run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramInputs {
    /// `array<vec2<f32>, 3>` built from the instance attributes.
    pub points: Var,
    pub wind: Var,
    /// Hull or triangle corner picked by `vertex_index`, before the outset.
    pub corner: Var,
    pub corner_coverage: Option<Var>,
    /// Module-scope constant.
    pub bloat: Var,
}

impl ProgramInputs {
    fn new(config: &EmitConfig) -> Self {
        Self {
            points: Var::input("pts", ShaderType::Vec2Array(3)),
            wind: Var::input("wind", ShaderType::Float),
            corner: Var::input("vertex_corner", ShaderType::Vec2),
            corner_coverage: config
                .corner_coverage
                .then(|| Var::input("corner_coverage", ShaderType::Vec2)),
            bloat: Var::input("bloat", ShaderType::Float),
        }
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        [&self.points, &self.wind, &self.corner, &self.bloat]
            .into_iter()
            .chain(self.corner_coverage.as_ref())
            .map(|v| v.name.as_str())
    }
}

/// A quadratic coverage program: emitted IR plus the WGSL module around it.
#[derive(Debug)]
pub struct CurveProgram {
    config: EmitConfig,
    inputs: ProgramInputs,
    curve: EmittedCurve<QuadraticShader>,
    source: String,
}

impl CurveProgram {
    /// Runs the quadratic phases for `config` and assembles the module.
    pub fn quadratic(config: EmitConfig) -> Self {
        debug_assert!(config.is_valid(), "invalid emit config: {config:?}");

        let inputs = ProgramInputs::new(&config);
        let shader = QuadraticShader::new(inputs.bloat.expr());
        let setup_inputs = SetupInputs {
            points: inputs.points.expr(),
            wind: inputs.wind.expr(),
            emit_hull: config.hull,
        };
        let corner_inputs = CornerInputs {
            corner: inputs.corner.expr(),
            bloat: inputs.bloat.expr(),
            coverage: inputs.wind.expr(),
            corner_coverage: inputs.corner_coverage.as_ref().map(Var::expr),
        };

        let reserved = assemble::RESERVED.iter().copied().chain(inputs.names());
        let curve = emit_curve(&shader, &setup_inputs, &corner_inputs, reserved);
        debug_assert_eq!(curve.parts.check(), Ok(()));

        let layout = assemble::Layout {
            config: &config,
            inputs: &inputs,
            parts: &curve.parts,
            hull: curve.setup.hull(),
            position: &curve.position,
            coverage: &curve.coverage,
        };
        // Formatting into a String only fails if a Display impl does.
        let source = assemble::wgsl_module(&layout).unwrap_or_default();

        log::debug!(
            "assembled quadratic program: {} globals, {} varyings, {} bytes of WGSL",
            curve.parts.globals.len(),
            curve.parts.varyings.len(),
            source.len()
        );

        Self { config, inputs, curve, source }
    }

    pub fn config(&self) -> &EmitConfig {
        &self.config
    }

    pub fn inputs(&self) -> &ProgramInputs {
        &self.inputs
    }

    pub fn parts(&self) -> &ShaderParts {
        &self.curve.parts
    }

    pub fn setup(&self) -> &QuadraticSetup {
        &self.curve.setup
    }

    pub fn varyings(&self) -> &QuadraticVaryings {
        &self.curve.varyings
    }

    /// Bloated vertex position the rasterizer sees.
    pub fn position(&self) -> &Var {
        &self.curve.position
    }

    /// Fragment output holding the signed coverage.
    pub fn coverage(&self) -> &Var {
        &self.curve.coverage
    }

    /// Generated WGSL.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn module_descriptor(&self) -> wgpu::ShaderModuleDescriptor<'_> {
        wgpu::ShaderModuleDescriptor {
            label: Some("hullcov quadratic shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&self.source)),
        }
    }

    pub fn vertex_buffer_layout(&self) -> wgpu::VertexBufferLayout<'static> {
        CurveInstance::layout(self.config.corner_coverage)
    }

    pub fn vertices_per_instance(&self) -> u32 {
        if self.config.hull { 4 } else { 3 }
    }

    pub fn primitive_state(&self) -> wgpu::PrimitiveState {
        let topology = if self.config.hull {
            wgpu::PrimitiveTopology::TriangleStrip
        } else {
            wgpu::PrimitiveTopology::TriangleList
        };
        wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Either winding may face the camera.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(hull: bool, corner: bool) -> CurveProgram {
        CurveProgram::quadratic(
            EmitConfig::default().with_hull(hull).with_corner_coverage(corner),
        )
    }

    #[test]
    fn default_module_shape() {
        let p = program(true, false);
        let src = p.source();
        assert!(src.contains("@group(0) @binding(0) var<uniform> viewport: Viewport;"));
        assert!(src.contains("const bloat: f32 = 0.5;"));
        assert!(src.contains("fn vs_main(@builtin(vertex_index) vertex_index: u32, instance: CurveInstance) -> VertexOut {"));
        assert!(src.contains("fn fs_main(fs_in: VertexOut) -> @location(0) vec4<f32> {"));
        assert!(src.contains("var<private> qcoord_matrix: mat2x2<f32>;"));
        assert!(src.contains("@location(0) coord_and_grad: vec4<f32>,"));
        assert!(src.contains("@location(1) edge_and_wind_and_corner: vec2<f32>,"));
        assert!(!src.contains("corner_coverage"));
    }

    #[test]
    fn setup_formulas() {
        let src = program(true, false).source().to_owned();
        assert!(src.contains(
            "qcoord_matrix = mat2x2<f32>(1.0, 1.0, 0.5, 0.0) * inverse_2x2(mat2x2<f32>(pts[2] - pts[0], pts[1] - pts[0]));"
        ));
        assert!(src.contains("qcoord0 = pts[0];"));
        assert!(src.contains("var edgept0: vec2<f32> = select(pts[0], pts[2], wind > 0.0);"));
        assert!(src.contains(
            "var quadratic_hull: array<vec2<f32>, 4> = array<vec2<f32>, 4>(pts[0], (pts[0] + pts[1]) * 0.5, (pts[1] + pts[2]) * 0.5, pts[2]);"
        ));
        assert!(src.contains("fn inverse_2x2("));
    }

    #[test]
    fn varying_and_coverage_formulas() {
        let src = program(true, false).source().to_owned();
        assert!(src.contains("var coord: vec2<f32> = qcoord_matrix * (position - qcoord0);"));
        assert!(src.contains(
            "var grad: vec2<f32> = 2.0 * bloat * vec2<f32>(2.0 * coord.x, -1.0) * qcoord_matrix;"
        ));
        assert!(src.contains("vs_out.coord_and_grad = vec4<f32>(coord, grad);"));
        assert!(src.contains("vs_out.edge_and_wind_and_corner = vec2<f32>(edge, wind);"));
        assert!(src.contains("coverage = min(0.5 - f / fwidth_l1, 1.0);"));
        assert!(src.contains("coverage = coverage * fs_in.edge_and_wind_and_corner.y;"));
        assert!(src.contains("return vec4<f32>(coverage, 0.0, 0.0, 0.0);"));
    }

    #[test]
    fn hull_selects_gray_code_corners() {
        let p = program(true, false);
        let src = p.source();
        assert!(src.contains("var vertex_corner: vec2<f32> = quadratic_hull[vertex_index ^ (vertex_index >> 1u)];"));
        assert!(src.contains("var centroid: vec2<f32> = (pts[0] + pts[1] + pts[2]) / 3.0;"));
        assert!(src.contains("var position: vec2<f32> = vertex_corner + bloat * sign(vertex_corner - centroid);"));
        assert_eq!(p.vertices_per_instance(), 4);
        assert_eq!(p.primitive_state().topology, wgpu::PrimitiveTopology::TriangleStrip);
    }

    #[test]
    fn triangle_mode_uses_control_points() {
        let p = program(false, false);
        assert!(p.setup().hull.is_none());
        assert!(p.source().contains("var vertex_corner: vec2<f32> = pts[vertex_index];"));
        assert!(!p.source().contains("quadratic_hull"));
        assert_eq!(p.vertices_per_instance(), 3);
        assert_eq!(p.primitive_state().topology, wgpu::PrimitiveTopology::TriangleList);
    }

    #[test]
    fn corner_mode_module() {
        let p = program(true, true);
        let src = p.source();
        assert!(src.contains("@location(4) corner_coverage: vec2<f32>,"));
        assert!(src.contains("var corner_coverage: vec2<f32> = instance.corner_coverage;"));
        assert!(src.contains("@location(1) edge_and_wind_and_corner: vec4<f32>,"));
        assert!(src.contains("var corner: vec2<f32> = vec2<f32>(hull_coverage, 1.0) * corner_coverage;"));
        assert!(src.contains(
            "coverage = fs_in.edge_and_wind_and_corner.z * fs_in.edge_and_wind_and_corner.w + coverage;"
        ));
        assert_eq!(p.vertex_buffer_layout().attributes.len(), 5);
    }

    #[test]
    fn emitted_names_avoid_template_names() {
        let p = program(true, true);
        let parts = p.parts();
        let emitted = parts
            .globals
            .iter()
            .chain(
                parts.setup.iter().chain(&parts.placement).chain(&parts.vertex).chain(&parts.fragment).map(|s| s.target()),
            );
        for var in emitted {
            if var.storage == hullcov_ir::Storage::Local || var.storage == hullcov_ir::Storage::Global {
                assert!(!assemble::RESERVED.contains(&var.name.as_str()), "{}", var.name);
                assert_ne!(var.name, "vertex_corner");
                assert_ne!(var.name, "pts");
            }
        }
        assert_eq!(p.coverage().name, "coverage");
        assert_eq!(p.position().name, "position");
    }

    #[test]
    fn bloat_is_tunable() {
        let p = CurveProgram::quadratic(EmitConfig::default().with_bloat(0.75));
        assert!(p.source().contains("const bloat: f32 = 0.75;"));
        assert!(p.module_descriptor().label.is_some());
    }
}
