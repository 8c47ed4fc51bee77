//! GPU-side interface types for the generated program.
//!
//! Only layouts and states live here; buffers, pipelines and draws belong to
//! the renderer that consumes the program.

use bytemuck::{Pod, Zeroable};

use crate::coords::ControlPoints;

/// Coverage counts accumulate signed values, so the target needs a float
/// format that blends.
pub const COVERAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;

// ── blend ─────────────────────────────────────────────────────────────────

/// Additive blend: overlapping segments sum their signed coverage.
pub fn coverage_count_blend() -> wgpu::BlendState {
    let add = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: add, alpha: add }
}

pub fn coverage_target() -> wgpu::ColorTargetState {
    wgpu::ColorTargetState {
        format: COVERAGE_FORMAT,
        blend: Some(coverage_count_blend()),
        write_mask: wgpu::ColorWrites::RED,
    }
}

// ── viewport uniform ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ViewportUniform {
    pub size: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

impl ViewportUniform {
    pub fn new(width: f32, height: f32) -> Self {
        Self { size: [width.max(1.0), height.max(1.0)], _pad: [0.0; 2] }
    }

    /// Bind group layout entry matching `@group(0) @binding(0)`.
    pub fn layout_entry() -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<Self>() as u64),
            },
            count: None,
        }
    }
}

// ── curve instance ────────────────────────────────────────────────────────

/// One quadratic segment, stepped per instance.
///
/// `corner_coverage` is only read when the program was generated with corner
/// coverage; otherwise it is padding the attribute list skips.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CurveInstance {
    pub p0: [f32; 2],
    pub p1: [f32; 2],
    pub p2: [f32; 2],
    pub wind: f32,
    pub corner_coverage: [f32; 2],
}

impl CurveInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x2, // p0
        1 => Float32x2, // p1
        2 => Float32x2, // p2
        3 => Float32    // wind
    ];

    const ATTRS_CORNER: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x2, // p0
        1 => Float32x2, // p1
        2 => Float32x2, // p2
        3 => Float32,   // wind
        4 => Float32x2  // corner_coverage
    ];

    pub fn new(points: ControlPoints, wind: f32) -> Self {
        debug_assert!(!points.is_degenerate(), "collinear control points: {points:?}");
        let [p0, p1, p2] = points.to_array().map(<[f32; 2]>::from);
        Self { p0, p1, p2, wind, corner_coverage: [0.0; 2] }
    }

    /// Instance whose winding follows the point orientation (±1).
    pub fn oriented(points: ControlPoints) -> Self {
        Self::new(points, points.winding())
    }

    /// Sets the `(weight, attenuation)` corner inputs.
    pub fn with_corner_coverage(mut self, weight: f32, attenuation: f32) -> Self {
        self.corner_coverage = [weight, attenuation];
        self
    }

    pub fn points(&self) -> ControlPoints {
        ControlPoints::new(self.p0.into(), self.p1.into(), self.p2.into())
    }

    pub fn layout(corner_coverage: bool) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CurveInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: if corner_coverage { &Self::ATTRS_CORNER } else { &Self::ATTRS },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;

    fn arch() -> ControlPoints {
        ControlPoints::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 2.0), Vec2::new(2.0, 0.0))
    }

    #[test]
    fn instance_stride_and_offsets() {
        let layout = CurveInstance::layout(true);
        assert_eq!(layout.array_stride, 36);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);

        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16, 24, 28]);
        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn plain_layout_skips_corner_attribute() {
        let layout = CurveInstance::layout(false);
        assert_eq!(layout.array_stride, 36);
        assert_eq!(layout.attributes.len(), 4);
        assert_eq!(layout.attributes[3].format, wgpu::VertexFormat::Float32);
    }

    #[test]
    fn oriented_instance_takes_point_winding() {
        let inst = CurveInstance::oriented(arch());
        assert_eq!(inst.wind, -1.0);
        assert_eq!(inst.p1, [1.0, 2.0]);
        assert_eq!(inst.points(), arch());
        assert_eq!(inst.with_corner_coverage(0.25, 1.0).corner_coverage, [0.25, 1.0]);
    }

    #[test]
    fn viewport_uniform_is_16_bytes() {
        assert_eq!(std::mem::size_of::<ViewportUniform>(), 16);
        assert_eq!(ViewportUniform::new(0.0, 600.0).size, [1.0, 600.0]);
        let entry = ViewportUniform::layout_entry();
        assert_eq!(entry.binding, 0);
    }

    #[test]
    fn blend_is_additive() {
        let blend = coverage_count_blend();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(blend.alpha, blend.color);
        assert_eq!(coverage_target().format, COVERAGE_FORMAT);
    }
}
