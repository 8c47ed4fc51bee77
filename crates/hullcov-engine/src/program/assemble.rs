use std::fmt::{self, Write};

use hullcov_ir::{Builtin, ShaderType, Var};

use crate::backend::{Backend, FRAGMENT_IN, INVERSE_2X2, VERTEX_OUT, Wgsl};
use crate::config::EmitConfig;
use crate::shader::ShaderParts;

use super::{FRAGMENT_ENTRY, ProgramInputs, VERTEX_ENTRY};

/// Identifiers the module template declares itself.
pub(super) const RESERVED: &[&str] = &[
    "Viewport",
    "viewport",
    "CurveInstance",
    "instance",
    "VertexOut",
    "clip_position",
    "vertex_index",
    VERTEX_OUT,
    FRAGMENT_IN,
    VERTEX_ENTRY,
    FRAGMENT_ENTRY,
    "inverse_2x2",
    "ndc",
];

const INDENT: &str = "    ";

/// Everything the module template needs besides the emitted statements.
pub(super) struct Layout<'a> {
    pub config: &'a EmitConfig,
    pub inputs: &'a ProgramInputs,
    pub parts: &'a ShaderParts,
    pub hull: Option<&'a Var>,
    pub position: &'a Var,
    pub coverage: &'a Var,
}

/// Wraps emitted statements into a complete WGSL module.
pub(super) fn wgsl_module(layout: &Layout<'_>) -> Result<String, fmt::Error> {
    let w = Wgsl;
    let Layout { config, inputs, parts, hull, position, coverage } = *layout;
    let mut src = String::new();

    writeln!(
        src,
        "// hullcov quadratic coverage (hull: {}, corner coverage: {})\n",
        config.hull, config.corner_coverage
    )?;

    src.push_str(
        "struct Viewport {
    size: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0) var<uniform> viewport: Viewport;

",
    );
    writeln!(src, "const {}: f32 = {:?};\n", inputs.bloat.name, config.bloat)?;

    // Instance attributes.
    src.push_str("struct CurveInstance {\n");
    for (i, p) in ["p0", "p1", "p2"].iter().enumerate() {
        writeln!(src, "{INDENT}@location({i}) {p}: {},", w.type_name(ShaderType::Vec2))?;
    }
    writeln!(src, "{INDENT}@location(3) wind: {},", w.type_name(ShaderType::Float))?;
    if let Some(corner) = &inputs.corner_coverage {
        writeln!(src, "{INDENT}@location(4) corner_coverage: {},", w.type_name(corner.ty))?;
    }
    src.push_str("};\n\n");

    // Stage interface.
    src.push_str("struct VertexOut {\n");
    writeln!(src, "{INDENT}@builtin(position) clip_position: {},", w.type_name(ShaderType::Vec4))?;
    for v in &parts.varyings {
        writeln!(src, "{INDENT}@location({}) {}: {},", v.location, v.name(), w.type_name(v.ty()))?;
    }
    src.push_str("};\n\n");

    for g in &parts.globals {
        writeln!(src, "var<private> {}: {};", g.name, w.type_name(g.ty))?;
    }
    if !parts.globals.is_empty() {
        src.push('\n');
    }

    if parts.uses(Builtin::Inverse) {
        src.push_str(INVERSE_2X2);
        src.push('\n');
    }

    write_vertex_entry(&mut src, &w, inputs, parts, hull, position)?;
    src.push('\n');
    write_fragment_entry(&mut src, &w, parts, coverage)?;
    Ok(src)
}

fn write_vertex_entry(
    src: &mut String,
    w: &Wgsl,
    inputs: &ProgramInputs,
    parts: &ShaderParts,
    hull: Option<&Var>,
    position: &Var,
) -> fmt::Result {
    writeln!(src, "@vertex")?;
    writeln!(
        src,
        "fn {VERTEX_ENTRY}(@builtin(vertex_index) vertex_index: u32, instance: CurveInstance) -> VertexOut {{"
    )?;
    writeln!(src, "{INDENT}var {VERTEX_OUT}: VertexOut;")?;

    let pts = &inputs.points;
    writeln!(
        src,
        "{INDENT}var {}: {ty} = {ty}(instance.p0, instance.p1, instance.p2);",
        pts.name,
        ty = w.type_name(pts.ty),
    )?;
    writeln!(src, "{INDENT}var {}: f32 = instance.wind;", inputs.wind.name)?;
    if let Some(corner) = &inputs.corner_coverage {
        writeln!(
            src,
            "{INDENT}var {}: {} = instance.corner_coverage;",
            corner.name,
            w.type_name(corner.ty)
        )?;
    }
    w.write_block(src, &parts.setup, INDENT)?;

    // Strip order 0, 1, 3, 2 walks the convex hull as two triangles.
    let corner = &inputs.corner;
    let selected = match hull {
        Some(hull) => format!("{}[vertex_index ^ (vertex_index >> 1u)]", hull.name),
        None => format!("{}[vertex_index]", pts.name),
    };
    writeln!(src, "{INDENT}var {}: {} = {selected};", corner.name, w.type_name(corner.ty))?;
    w.write_block(src, &parts.placement, INDENT)?;
    w.write_block(src, &parts.vertex, INDENT)?;

    writeln!(
        src,
        "{INDENT}let ndc = vec2<f32>({pos}.x / viewport.size.x * 2.0 - 1.0, 1.0 - {pos}.y / viewport.size.y * 2.0);",
        pos = position.name,
    )?;
    writeln!(src, "{INDENT}{VERTEX_OUT}.clip_position = vec4<f32>(ndc, 0.0, 1.0);")?;
    writeln!(src, "{INDENT}return {VERTEX_OUT};")?;
    writeln!(src, "}}")
}

fn write_fragment_entry(
    src: &mut String,
    w: &Wgsl,
    parts: &ShaderParts,
    coverage: &Var,
) -> fmt::Result {
    writeln!(src, "@fragment")?;
    writeln!(src, "fn {FRAGMENT_ENTRY}({FRAGMENT_IN}: VertexOut) -> @location(0) vec4<f32> {{")?;
    for out in &parts.outputs {
        writeln!(src, "{INDENT}var {}: {} = {}(0.0);", out.name, w.type_name(out.ty), w.type_name(out.ty))?;
    }
    w.write_block(src, &parts.fragment, INDENT)?;
    writeln!(src, "{INDENT}return vec4<f32>({}, 0.0, 0.0, 0.0);", coverage.name)?;
    writeln!(src, "}}")
}
