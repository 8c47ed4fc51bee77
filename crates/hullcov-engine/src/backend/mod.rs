//! Serialization of shader IR to a shading language.

mod wgsl;

use std::fmt;

use hullcov_ir::{Expr, ShaderType, Stmt, Var};

pub use wgsl::{FRAGMENT_IN, INVERSE_2X2, VERTEX_OUT, Wgsl};

/// A target shading language.
///
/// Implementors print single expressions and statements. Whole-module layout
/// (entry points, bindings, interface structs) belongs to the program
/// assembler.
pub trait Backend {
    fn type_name(&self, ty: ShaderType) -> String;

    /// Spelling of a variable reference, including any interface qualifier.
    fn var_name(&self, var: &Var) -> String;

    fn write_expr(&self, out: &mut dyn fmt::Write, expr: &Expr) -> fmt::Result;

    fn write_stmt(&self, out: &mut dyn fmt::Write, stmt: &Stmt) -> fmt::Result;

    fn expr(&self, expr: &Expr) -> String {
        let mut s = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_expr(&mut s, expr);
        s
    }

    /// Writes one statement per line, each prefixed with `indent`.
    fn write_block(&self, out: &mut dyn fmt::Write, stmts: &[Stmt], indent: &str) -> fmt::Result {
        for stmt in stmts {
            out.write_str(indent)?;
            self.write_stmt(out, stmt)?;
            out.write_char('\n')?;
        }
        Ok(())
    }
}
