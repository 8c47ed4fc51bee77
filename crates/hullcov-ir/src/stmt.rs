use crate::error::IrError;
use crate::expr::{Expr, Var};

/// A shader statement.
///
/// Stores always replace the whole variable. Partial (swizzled) stores are not
/// representable, so every target language can express every statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Declares a local and initializes it.
    Let { var: Var, value: Expr },
    /// Overwrites an already declared variable.
    Assign { target: Var, value: Expr },
}

impl Stmt {
    pub fn target(&self) -> &Var {
        match self {
            Stmt::Let { var, .. } => var,
            Stmt::Assign { target, .. } => target,
        }
    }

    pub fn value(&self) -> &Expr {
        match self {
            Stmt::Let { value, .. } | Stmt::Assign { value, .. } => value,
        }
    }

    /// Checks that the stored value has the declared type of its target.
    pub fn check(&self) -> Result<(), IrError> {
        let want = self.target().ty;
        let found = self.value().ty()?;
        if want == found {
            Ok(())
        } else {
            Err(IrError::Type { op: "=", operands: vec![want, found] })
        }
    }
}

/// Type-checks a statement list, stopping at the first error.
pub fn check_block(stmts: &[Stmt]) -> Result<(), IrError> {
    stmts.iter().try_for_each(Stmt::check)
}
