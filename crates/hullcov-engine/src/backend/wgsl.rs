use std::fmt;

use hullcov_ir::{Builtin, Expr, ShaderType, Stmt, Storage, Var};

use super::Backend;

/// Name of the vertex output struct instance inside `vs_main`.
pub const VERTEX_OUT: &str = "vs_out";
/// Name of the fragment input parameter of `fs_main`.
pub const FRAGMENT_IN: &str = "fs_in";

/// WGSL has no matrix inverse builtin.
pub const INVERSE_2X2: &str = "\
fn inverse_2x2(m: mat2x2<f32>) -> mat2x2<f32> {
    let det = m[0][0] * m[1][1] - m[1][0] * m[0][1];
    return mat2x2<f32>(m[1][1], -m[0][1], -m[1][0], m[0][0]) * (1.0 / det);
}
";

/// WGSL backend.
///
/// Every IR local is printed as a `var` so later statements may reassign it.
/// Varyings are members of the stage interface structs ([`VERTEX_OUT`],
/// [`FRAGMENT_IN`]).
#[derive(Debug, Default, Copy, Clone)]
pub struct Wgsl;

impl Wgsl {
    fn write_operand(&self, out: &mut dyn fmt::Write, e: &Expr, parens: bool) -> fmt::Result {
        if parens {
            out.write_char('(')?;
            self.write_expr(out, e)?;
            out.write_char(')')
        } else {
            self.write_expr(out, e)
        }
    }

    fn write_args(&self, out: &mut dyn fmt::Write, args: &[Expr]) -> fmt::Result {
        for (i, a) in args.iter().enumerate() {
            if i > 0 {
                out.write_str(", ")?;
            }
            self.write_expr(out, a)?;
        }
        Ok(())
    }

    fn write_infix(
        &self,
        out: &mut dyn fmt::Write,
        precedence: u8,
        symbol: &str,
        l: &Expr,
        r: &Expr,
    ) -> fmt::Result {
        self.write_operand(out, l, l.precedence() < precedence)?;
        write!(out, " {symbol} ")?;
        self.write_operand(out, r, r.precedence() <= precedence)
    }
}

/// `true` for nodes a prefix `-` or postfix accessor must parenthesize.
fn needs_group(e: &Expr) -> bool {
    e.precedence() < 3 || matches!(e, Expr::Neg(_)) || matches!(e, Expr::Lit(v) if v.is_sign_negative())
}

impl Backend for Wgsl {
    fn type_name(&self, ty: ShaderType) -> String {
        match ty {
            ShaderType::Bool => "bool".into(),
            ShaderType::Float => "f32".into(),
            ShaderType::Vec2 => "vec2<f32>".into(),
            ShaderType::Vec3 => "vec3<f32>".into(),
            ShaderType::Vec4 => "vec4<f32>".into(),
            ShaderType::Mat2 => "mat2x2<f32>".into(),
            ShaderType::Vec2Array(n) => format!("array<vec2<f32>, {n}>"),
        }
    }

    fn var_name(&self, var: &Var) -> String {
        match var.storage {
            Storage::VaryingOut => format!("{VERTEX_OUT}.{}", var.name),
            Storage::VaryingIn => format!("{FRAGMENT_IN}.{}", var.name),
            Storage::Input | Storage::Global | Storage::Local | Storage::Output => {
                var.name.clone()
            }
        }
    }

    fn write_expr(&self, out: &mut dyn fmt::Write, expr: &Expr) -> fmt::Result {
        match expr {
            Expr::Lit(v) => write!(out, "{v:?}"),
            Expr::Var(var) => out.write_str(&self.var_name(var)),
            Expr::Construct(ty, args) => {
                write!(out, "{}(", self.type_name(*ty))?;
                self.write_args(out, args)?;
                out.write_char(')')
            }
            Expr::Neg(e) => {
                out.write_char('-')?;
                self.write_operand(out, e, needs_group(e))
            }
            Expr::Binary(op, l, r) => self.write_infix(out, expr.precedence(), op.symbol(), l, r),
            Expr::Compare(op, l, r) => self.write_infix(out, expr.precedence(), op.symbol(), l, r),
            Expr::Call(builtin, args) => {
                let name = match builtin {
                    Builtin::Inverse => "inverse_2x2",
                    other => other.name(),
                };
                write!(out, "{name}(")?;
                self.write_args(out, args)?;
                out.write_char(')')
            }
            Expr::Swizzle(e, swizzle) => {
                self.write_operand(out, e, needs_group(e))?;
                write!(out, ".{swizzle}")
            }
            Expr::Index(e, i) => {
                self.write_operand(out, e, needs_group(e))?;
                write!(out, "[{i}]")
            }
            Expr::Select { cond, accept, reject } => {
                out.write_str("select(")?;
                self.write_args(out, &[(**reject).clone(), (**accept).clone(), (**cond).clone()])?;
                out.write_char(')')
            }
        }
    }

    fn write_stmt(&self, out: &mut dyn fmt::Write, stmt: &Stmt) -> fmt::Result {
        match stmt {
            Stmt::Let { var, value } => {
                write!(out, "var {}: {} = ", var.name, self.type_name(var.ty))?;
                self.write_expr(out, value)?;
            }
            Stmt::Assign { target, value } => {
                write!(out, "{} = ", self.var_name(target))?;
                self.write_expr(out, value)?;
            }
        }
        out.write_char(';')
    }
}
