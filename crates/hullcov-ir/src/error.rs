use std::fmt;

use crate::ty::ShaderType;

/// An error raised while typing or evaluating shader IR.
///
/// Well-formed emitters never produce these; they surface generator bugs in
/// tests and in the CPU probe.
#[derive(Debug, Clone, PartialEq)]
pub enum IrError {
    /// A variable was read or assigned before being bound in the environment.
    Unbound(String),
    /// Operand types do not fit the operation.
    Type {
        op: &'static str,
        operands: Vec<ShaderType>,
    },
    /// Wrong number of arguments for a builtin or constructor.
    Arity {
        op: &'static str,
        expected: usize,
        found: usize,
    },
    /// Swizzle selects a component the base vector does not have.
    Swizzle { base: ShaderType, swizzle: String },
    /// Constant index past the end of an array.
    Index { len: usize, index: usize },
}

impl IrError {
    /// Shorthand for [`IrError::Type`].
    pub fn ty(op: &'static str, operands: impl Into<Vec<ShaderType>>) -> Self {
        Self::Type { op, operands: operands.into() }
    }
}

impl fmt::Display for IrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrError::Unbound(name) => write!(f, "unbound variable `{name}`"),
            IrError::Type { op, operands } => {
                write!(f, "`{op}` cannot take operands of type (")?;
                for (i, ty) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, ")")
            }
            IrError::Arity { op, expected, found } => {
                write!(f, "`{op}` expects {expected} argument(s), found {found}")
            }
            IrError::Swizzle { base, swizzle } => {
                write!(f, "swizzle `.{swizzle}` is out of range for {base}")
            }
            IrError::Index { len, index } => {
                write!(f, "index {index} is out of range for an array of {len}")
            }
        }
    }
}

impl std::error::Error for IrError {}
