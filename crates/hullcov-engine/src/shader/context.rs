use std::collections::HashSet;

use hullcov_ir::{Builtin, Expr, IrError, ShaderType, Stmt, Storage, Var, check_block};

/// Pipeline section a statement belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Vertex stage, once per primitive, before any varying is written.
    Setup,
    /// Vertex stage, per vertex: places the rasterized corner.
    Placement,
    /// Vertex stage, per vertex, once the position is known.
    Vertex,
    /// Fragment stage.
    Fragment,
}

/// A value interpolated from the vertex stage to the fragment stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Varying {
    /// Vertex-side handle (write target).
    pub out: Var,
    /// Fragment-side handle (read source).
    pub input: Var,
    pub location: u32,
}

impl Varying {
    #[inline]
    pub fn name(&self) -> &str {
        &self.out.name
    }

    #[inline]
    pub fn ty(&self) -> ShaderType {
        self.out.ty
    }
}

/// Everything emitted for one segment shader, ready for a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderParts {
    pub globals: Vec<Var>,
    pub varyings: Vec<Varying>,
    pub outputs: Vec<Var>,
    pub setup: Vec<Stmt>,
    pub placement: Vec<Stmt>,
    pub vertex: Vec<Stmt>,
    pub fragment: Vec<Stmt>,
}

impl ShaderParts {
    /// Type-checks every statement of every stage.
    pub fn check(&self) -> Result<(), IrError> {
        check_block(&self.setup)?;
        check_block(&self.placement)?;
        check_block(&self.vertex)?;
        check_block(&self.fragment)
    }

    /// `true` if any stage calls `builtin`.
    pub fn uses(&self, builtin: Builtin) -> bool {
        [&self.setup, &self.placement, &self.vertex, &self.fragment]
            .into_iter()
            .flatten()
            .any(|s| s.value().uses(builtin))
    }
}

#[derive(Debug, Default)]
struct Names {
    used: HashSet<String>,
}

impl Names {
    fn fresh(&mut self, base: &str) -> String {
        if self.used.insert(base.to_owned()) {
            return base.to_owned();
        }
        let name = (1u32..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !self.used.contains(candidate))
            .unwrap_or_default();
        self.used.insert(name.clone());
        name
    }
}

/// Declarations and statement lists for one segment's emission.
///
/// Phases receive it by `&mut` and only append. Identifiers handed out are
/// unique across all stages, so a phase can ask for `x` twice and get `x` and
/// `x_1`.
#[derive(Debug, Default)]
pub struct EmitContext {
    names: Names,
    globals: Vec<Var>,
    varyings: Vec<Varying>,
    outputs: Vec<Var>,
    setup: Vec<Stmt>,
    placement: Vec<Stmt>,
    vertex: Vec<Stmt>,
    fragment: Vec<Stmt>,
}

impl EmitContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks identifiers owned by the surrounding program (inputs, entry
    /// points, helpers) so emitted names never collide with them.
    pub fn reserve<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) {
        self.names.used.extend(names.into_iter().map(str::to_owned));
    }

    /// Declares a per-primitive global, written in setup.
    pub fn declare_global(&mut self, base: &str, ty: ShaderType) -> Var {
        let var = Var::new(self.names.fresh(base), Storage::Global, ty);
        self.globals.push(var.clone());
        var
    }

    /// Declares a varying at the next free location.
    pub fn add_varying(&mut self, base: &str, ty: ShaderType) -> Varying {
        let out = Var::new(self.names.fresh(base), Storage::VaryingOut, ty);
        let varying = Varying {
            input: out.with_storage(Storage::VaryingIn),
            out,
            location: self.varyings.len() as u32,
        };
        self.varyings.push(varying.clone());
        varying
    }

    /// Declares a fragment output, zero-initialized by the program.
    pub fn declare_output(&mut self, base: &str, ty: ShaderType) -> Var {
        let var = Var::new(self.names.fresh(base), Storage::Output, ty);
        self.outputs.push(var.clone());
        var
    }

    /// Opens a writer appending to `stage`.
    pub fn stage(&mut self, stage: Stage) -> StageWriter<'_> {
        let stmts = match stage {
            Stage::Setup => &mut self.setup,
            Stage::Placement => &mut self.placement,
            Stage::Vertex => &mut self.vertex,
            Stage::Fragment => &mut self.fragment,
        };
        StageWriter { names: &mut self.names, stmts }
    }

    pub fn finish(self) -> ShaderParts {
        ShaderParts {
            globals: self.globals,
            varyings: self.varyings,
            outputs: self.outputs,
            setup: self.setup,
            placement: self.placement,
            vertex: self.vertex,
            fragment: self.fragment,
        }
    }
}

/// Appends statements to one stage of an [`EmitContext`].
pub struct StageWriter<'a> {
    names: &'a mut Names,
    stmts: &'a mut Vec<Stmt>,
}

impl StageWriter<'_> {
    /// Declares a local initialized to `value` and returns its handle.
    pub fn local(&mut self, base: &str, ty: ShaderType, value: Expr) -> Var {
        debug_assert_eq!(value.ty(), Ok(ty), "ill-typed initializer for `{base}`");
        let var = Var::new(self.names.fresh(base), Storage::Local, ty);
        self.stmts.push(Stmt::Let { var: var.clone(), value });
        var
    }

    /// Overwrites `target` with `value`.
    pub fn assign(&mut self, target: &Var, value: Expr) {
        debug_assert_eq!(value.ty(), Ok(target.ty), "ill-typed store to `{}`", target.name);
        self.stmts.push(Stmt::Assign { target: target.clone(), value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_across_stages() {
        let mut ctx = EmitContext::new();
        let a = ctx.stage(Stage::Vertex).local("x", ShaderType::Float, Expr::lit(1.0));
        let b = ctx.stage(Stage::Fragment).local("x", ShaderType::Float, Expr::lit(2.0));
        let c = ctx.stage(Stage::Fragment).local("x", ShaderType::Float, Expr::lit(3.0));
        assert_eq!((a.name.as_str(), b.name.as_str(), c.name.as_str()), ("x", "x_1", "x_2"));
    }

    #[test]
    fn reserved_names_are_skipped() {
        let mut ctx = EmitContext::new();
        ctx.reserve(["pts", "pts_1"]);
        let g = ctx.declare_global("pts", ShaderType::Vec2);
        assert_eq!(g.name, "pts_2");
    }

    #[test]
    fn varyings_get_sequential_locations() {
        let mut ctx = EmitContext::new();
        let a = ctx.add_varying("a", ShaderType::Vec4);
        let b = ctx.add_varying("b", ShaderType::Vec2);
        assert_eq!((a.location, b.location), (0, 1));
        assert_eq!(b.input.storage, Storage::VaryingIn);
        assert_eq!(b.out.storage, Storage::VaryingOut);
        assert_eq!(b.name(), "b");
    }

    #[test]
    fn finish_keeps_stage_order() {
        let mut ctx = EmitContext::new();
        let out = ctx.declare_output("coverage", ShaderType::Float);
        let mut w = ctx.stage(Stage::Fragment);
        w.assign(&out, Expr::lit(0.5));
        w.assign(&out, out.expr() * 2.0);
        let parts = ctx.finish();
        assert_eq!(parts.fragment.len(), 2);
        assert!(parts.setup.is_empty() && parts.placement.is_empty());
        assert_eq!(parts.outputs, vec![out]);
        assert_eq!(parts.check(), Ok(()));
    }
}
