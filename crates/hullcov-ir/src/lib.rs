//! Shader IR for the **hullcov** coverage generators.
//!
//! Emitters build typed expression trees and statement lists here instead of
//! appending shader text. Backends serialize the IR to a shading language; the
//! [`eval`] module runs it on the CPU with concrete inputs.
//!
//! This crate has no dependencies so it can be consumed by backends, tools
//! and tests without pulling in GPU code.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ty`] | `ShaderType` |
//! | [`expr`] | `Expr`, `Var`, `Storage`, `Swizzle`, operators and builtins |
//! | [`stmt`] | `Stmt`, block type checking |
//! | [`eval`] | `Value`, `Env` (numeric evaluation) |
//! | [`error`] | `IrError` |
//!
//! # Quick start
//!
//! ```rust
//! use hullcov_ir::{Env, Expr, ShaderType, Value, Var};
//!
//! let x = Var::input("x", ShaderType::Float);
//! let f = x.expr() * x.expr() - 1.0;
//!
//! let mut env = Env::new();
//! env.bind(&x, 3.0f32);
//! assert_eq!(env.eval(&f), Ok(Value::Float(8.0)));
//! ```

pub mod error;
pub mod eval;
pub mod expr;
pub mod stmt;
pub mod ty;

pub use error::IrError;
pub use eval::{Env, Value};
pub use expr::{BinOp, Builtin, CmpOp, Expr, Storage, Swizzle, Var};
pub use stmt::{Stmt, check_block};
pub use ty::ShaderType;
