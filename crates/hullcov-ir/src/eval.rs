//! Numeric evaluation of shader IR.
//!
//! Substituting concrete values for inputs turns generated shader math into
//! plain `f32` arithmetic, so it can be tested and probed on the CPU. Semantics
//! follow the GPU: column-major matrices, `vec * mat` treats the vector as a
//! row, `sign(0) == 0`, and division by zero yields IEEE infinities or NaN
//! rather than an error.

use std::collections::HashMap;

use crate::error::IrError;
use crate::expr::{BinOp, Builtin, CmpOp, Expr, Var, arith_type, builtin_type, construct_type};
use crate::stmt::Stmt;
use crate::ty::ShaderType;

/// A concrete shader value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major: `m[column][row]`.
    Mat2([[f32; 2]; 2]),
    Vec2Array(Vec<[f32; 2]>),
}

impl Value {
    /// Zero-initialized value of `ty`, matching default shader initialization.
    pub fn zero(ty: ShaderType) -> Self {
        match ty {
            ShaderType::Bool => Value::Bool(false),
            ShaderType::Float => Value::Float(0.0),
            ShaderType::Vec2 => Value::Vec2([0.0; 2]),
            ShaderType::Vec3 => Value::Vec3([0.0; 3]),
            ShaderType::Vec4 => Value::Vec4([0.0; 4]),
            ShaderType::Mat2 => Value::Mat2([[0.0; 2]; 2]),
            ShaderType::Vec2Array(n) => Value::Vec2Array(vec![[0.0; 2]; n]),
        }
    }

    pub fn ty(&self) -> ShaderType {
        match self {
            Value::Bool(_) => ShaderType::Bool,
            Value::Float(_) => ShaderType::Float,
            Value::Vec2(_) => ShaderType::Vec2,
            Value::Vec3(_) => ShaderType::Vec3,
            Value::Vec4(_) => ShaderType::Vec4,
            Value::Mat2(_) => ShaderType::Mat2,
            Value::Vec2Array(a) => ShaderType::Vec2Array(a.len()),
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<[f32; 2]> {
        match self {
            Value::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            Value::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec4(&self) -> Option<[f32; 4]> {
        match self {
            Value::Vec4(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_mat2(&self) -> Option<[[f32; 2]; 2]> {
        match self {
            Value::Mat2(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_vec2_array(&self) -> Option<&[[f32; 2]]> {
        match self {
            Value::Vec2Array(a) => Some(a),
            _ => None,
        }
    }

    /// Scalar and vector components as a slice.
    pub fn lanes(&self) -> Option<&[f32]> {
        match self {
            Value::Float(v) => Some(std::slice::from_ref(v)),
            Value::Vec2(v) => Some(v),
            Value::Vec3(v) => Some(v),
            Value::Vec4(v) => Some(v),
            _ => None,
        }
    }

    /// Builds a scalar or vector from one to four components.
    pub fn from_lanes(lanes: &[f32]) -> Option<Self> {
        match *lanes {
            [x] => Some(Value::Float(x)),
            [x, y] => Some(Value::Vec2([x, y])),
            [x, y, z] => Some(Value::Vec3([x, y, z])),
            [x, y, z, w] => Some(Value::Vec4([x, y, z, w])),
            _ => None,
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<[f32; 2]> for Value {
    fn from(v: [f32; 2]) -> Self {
        Value::Vec2(v)
    }
}

/// Variable bindings for evaluation.
#[derive(Debug, Clone, Default)]
pub struct Env {
    values: HashMap<Var, Value>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds (or rebinds) `var` to `value`.
    pub fn bind(&mut self, var: &Var, value: impl Into<Value>) {
        self.values.insert(var.clone(), value.into());
    }

    /// Declares `var` with its zero value, as an uninitialized shader variable.
    pub fn declare(&mut self, var: &Var) {
        self.values.insert(var.clone(), Value::zero(var.ty));
    }

    pub fn get(&self, var: &Var) -> Option<&Value> {
        self.values.get(var)
    }

    /// Evaluates an expression against the current bindings.
    pub fn eval(&self, expr: &Expr) -> Result<Value, IrError> {
        match expr {
            Expr::Lit(v) => Ok(Value::Float(*v)),
            Expr::Var(var) => self
                .values
                .get(var)
                .cloned()
                .ok_or_else(|| IrError::Unbound(var.name.clone())),
            Expr::Construct(ty, args) => {
                let vals = args.iter().map(|a| self.eval(a)).collect::<Result<Vec<_>, _>>()?;
                construct(*ty, &vals)
            }
            Expr::Neg(e) => negate(self.eval(e)?),
            Expr::Binary(op, l, r) => arith(*op, self.eval(l)?, self.eval(r)?),
            Expr::Compare(op, l, r) => {
                let (l, r) = (self.eval(l)?, self.eval(r)?);
                match (l.as_float(), r.as_float()) {
                    (Some(a), Some(b)) => Ok(Value::Bool(compare(*op, a, b))),
                    _ => Err(IrError::ty(op.symbol(), [l.ty(), r.ty()])),
                }
            }
            Expr::Call(builtin, args) => {
                let vals = args.iter().map(|a| self.eval(a)).collect::<Result<Vec<_>, _>>()?;
                call(*builtin, &vals)
            }
            Expr::Swizzle(base, s) => {
                let base = self.eval(base)?;
                let lanes = base.lanes().filter(|_| base.ty().is_vector()).ok_or_else(|| {
                    IrError::Swizzle { base: base.ty(), swizzle: s.to_string() }
                })?;
                let mut picked = [0.0f32; 4];
                for (slot, &c) in picked.iter_mut().zip(s.components()) {
                    *slot = *lanes.get(c as usize).ok_or_else(|| IrError::Swizzle {
                        base: base.ty(),
                        swizzle: s.to_string(),
                    })?;
                }
                Value::from_lanes(&picked[..s.len()])
                    .ok_or_else(|| IrError::Swizzle { base: base.ty(), swizzle: s.to_string() })
            }
            Expr::Index(base, index) => {
                let base = self.eval(base)?;
                let arr = base.as_vec2_array().ok_or_else(|| IrError::ty("[]", [base.ty()]))?;
                arr.get(*index)
                    .map(|p| Value::Vec2(*p))
                    .ok_or(IrError::Index { len: arr.len(), index: *index })
            }
            Expr::Select { cond, accept, reject } => match self.eval(cond)? {
                Value::Bool(true) => self.eval(accept),
                Value::Bool(false) => self.eval(reject),
                other => Err(IrError::ty("select", [other.ty()])),
            },
        }
    }

    /// Executes statements in order, updating bindings.
    pub fn exec(&mut self, stmts: &[Stmt]) -> Result<(), IrError> {
        for stmt in stmts {
            match stmt {
                Stmt::Let { var, value } => {
                    let v = self.eval(value)?;
                    self.store(var, v)?;
                }
                Stmt::Assign { target, value } => {
                    if !self.values.contains_key(target) {
                        return Err(IrError::Unbound(target.name.clone()));
                    }
                    let v = self.eval(value)?;
                    self.store(target, v)?;
                }
            }
        }
        Ok(())
    }

    fn store(&mut self, var: &Var, value: Value) -> Result<(), IrError> {
        if value.ty() != var.ty {
            return Err(IrError::Type { op: "=", operands: vec![var.ty, value.ty()] });
        }
        self.values.insert(var.clone(), value);
        Ok(())
    }
}

// ── operations ────────────────────────────────────────────────────────────

fn construct(ty: ShaderType, args: &[Value]) -> Result<Value, IrError> {
    let tys: Vec<ShaderType> = args.iter().map(Value::ty).collect();
    construct_type(ty, &tys)?;

    match ty {
        ShaderType::Vec2Array(_) => Ok(Value::Vec2Array(
            args.iter().filter_map(Value::as_vec2).collect(),
        )),
        _ => {
            let flat: Vec<f32> =
                args.iter().filter_map(Value::lanes).flatten().copied().collect();
            match ty {
                ShaderType::Mat2 => Ok(Value::Mat2([[flat[0], flat[1]], [flat[2], flat[3]]])),
                _ => {
                    let want = ty.components().unwrap_or(0);
                    let lanes = if flat.len() == 1 { vec![flat[0]; want] } else { flat };
                    Value::from_lanes(&lanes).ok_or_else(|| IrError::ty("construct", tys))
                }
            }
        }
    }
}

fn negate(v: Value) -> Result<Value, IrError> {
    match v {
        Value::Mat2(m) => Ok(Value::Mat2(m.map(|c| c.map(|x| -x)))),
        other => {
            let lanes: Vec<f32> = other
                .lanes()
                .ok_or_else(|| IrError::ty("-", [other.ty()]))?
                .iter()
                .map(|x| -x)
                .collect();
            Value::from_lanes(&lanes).ok_or_else(|| IrError::ty("-", [other.ty()]))
        }
    }
}

fn arith(op: BinOp, l: Value, r: Value) -> Result<Value, IrError> {
    arith_type(op, l.ty(), r.ty())?;

    let out = match (op, &l, &r) {
        (BinOp::Mul, Value::Mat2(m), Value::Vec2(v)) => Value::Vec2(mat_vec(m, v)),
        (BinOp::Mul, Value::Vec2(v), Value::Mat2(m)) => {
            Value::Vec2([dot2(v, &m[0]), dot2(v, &m[1])])
        }
        (BinOp::Mul, Value::Mat2(a), Value::Mat2(b)) => {
            Value::Mat2([mat_vec(a, &b[0]), mat_vec(a, &b[1])])
        }
        (BinOp::Mul, Value::Float(s), Value::Mat2(m))
        | (BinOp::Mul, Value::Mat2(m), Value::Float(s)) => {
            Value::Mat2(m.map(|c| c.map(|x| x * s)))
        }
        (BinOp::Add | BinOp::Sub, Value::Mat2(a), Value::Mat2(b)) => {
            let f = lane_fn(op);
            Value::Mat2([
                [f(a[0][0], b[0][0]), f(a[0][1], b[0][1])],
                [f(a[1][0], b[1][0]), f(a[1][1], b[1][1])],
            ])
        }
        _ => {
            let (a, b) = match (l.lanes(), r.lanes()) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(IrError::ty(op.symbol(), [l.ty(), r.ty()])),
            };
            let n = a.len().max(b.len());
            let f = lane_fn(op);
            let lanes: Vec<f32> = (0..n)
                .map(|i| f(a[i.min(a.len() - 1)], b[i.min(b.len() - 1)]))
                .collect();
            return Value::from_lanes(&lanes)
                .ok_or_else(|| IrError::ty(op.symbol(), [l.ty(), r.ty()]));
        }
    };
    Ok(out)
}

fn lane_fn(op: BinOp) -> fn(f32, f32) -> f32 {
    match op {
        BinOp::Add => |a, b| a + b,
        BinOp::Sub => |a, b| a - b,
        BinOp::Mul => |a, b| a * b,
        BinOp::Div => |a, b| a / b,
    }
}

fn compare(op: CmpOp, a: f32, b: f32) -> bool {
    match op {
        CmpOp::Lt => a < b,
        CmpOp::Le => a <= b,
        CmpOp::Gt => a > b,
        CmpOp::Ge => a >= b,
        CmpOp::Eq => a == b,
        CmpOp::Ne => a != b,
    }
}

fn call(builtin: Builtin, args: &[Value]) -> Result<Value, IrError> {
    let tys: Vec<ShaderType> = args.iter().map(Value::ty).collect();
    builtin_type(builtin, &tys)?;

    let lanewise1 = |f: fn(f32) -> f32| -> Result<Value, IrError> {
        let lanes: Vec<f32> = args[0].lanes().unwrap_or_default().iter().map(|&x| f(x)).collect();
        Value::from_lanes(&lanes).ok_or_else(|| IrError::ty(builtin.name(), tys.clone()))
    };
    let lanewise2 = |f: fn(f32, f32) -> f32| -> Result<Value, IrError> {
        let a = args[0].lanes().unwrap_or_default();
        let b = args[1].lanes().unwrap_or_default();
        let lanes: Vec<f32> = a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect();
        Value::from_lanes(&lanes).ok_or_else(|| IrError::ty(builtin.name(), tys.clone()))
    };

    match builtin {
        Builtin::Abs => lanewise1(f32::abs),
        Builtin::Sign => lanewise1(|x| {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        }),
        Builtin::Min => lanewise2(f32::min),
        Builtin::Max => lanewise2(f32::max),
        Builtin::Dot => {
            let a = args[0].lanes().unwrap_or_default();
            let b = args[1].lanes().unwrap_or_default();
            Ok(Value::Float(a.iter().zip(b).map(|(x, y)| x * y).sum()))
        }
        Builtin::Inverse => {
            let m = args[0].as_mat2().ok_or_else(|| IrError::ty("inverse", tys.clone()))?;
            let det = m[0][0] * m[1][1] - m[1][0] * m[0][1];
            let s = 1.0 / det;
            Ok(Value::Mat2([[m[1][1] * s, -m[0][1] * s], [-m[1][0] * s, m[0][0] * s]]))
        }
    }
}

fn mat_vec(m: &[[f32; 2]; 2], v: &[f32; 2]) -> [f32; 2] {
    [m[0][0] * v[0] + m[1][0] * v[1], m[0][1] * v[0] + m[1][1] * v[1]]
}

fn dot2(a: &[f32; 2], b: &[f32; 2]) -> f32 {
    a[0] * b[0] + a[1] * b[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Storage;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-6
    }

    #[test]
    fn matrix_vector_orders_differ() {
        // Columns (1, 2) and (3, 4): rows are [1 3; 2 4].
        let m = Var::input("m", ShaderType::Mat2);
        let v = Var::input("v", ShaderType::Vec2);
        let mut env = Env::new();
        env.bind(&m, Value::Mat2([[1.0, 2.0], [3.0, 4.0]]));
        env.bind(&v, Value::Vec2([1.0, 1.0]));

        assert_eq!(env.eval(&(m.expr() * v.expr())), Ok(Value::Vec2([4.0, 6.0])));
        assert_eq!(env.eval(&(v.expr() * m.expr())), Ok(Value::Vec2([3.0, 7.0])));
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let m = Var::input("m", ShaderType::Mat2);
        let mut env = Env::new();
        env.bind(&m, Value::Mat2([[2.0, 0.0], [1.0, 2.0]]));
        let prod = env.eval(&(Expr::inverse(m.expr()) * m.expr())).unwrap();
        let p = prod.as_mat2().unwrap();
        assert!(close(p[0][0], 1.0) && close(p[1][1], 1.0));
        assert!(close(p[0][1], 0.0) && close(p[1][0], 0.0));
    }

    #[test]
    fn constructors_flatten_and_splat() {
        let env = Env::new();
        let v = Expr::construct(ShaderType::Vec4, [Expr::vec2(1.0, 2.0), Expr::lit(3.0), Expr::lit(4.0)]);
        assert_eq!(env.eval(&v), Ok(Value::Vec4([1.0, 2.0, 3.0, 4.0])));
        let s = Expr::construct(ShaderType::Vec3, [Expr::lit(0.5)]);
        assert_eq!(env.eval(&s), Ok(Value::Vec3([0.5; 3])));
        assert_eq!(
            env.eval(&Expr::mat2(1.0, 1.0, 0.5, 0.0)),
            Ok(Value::Mat2([[1.0, 1.0], [0.5, 0.0]]))
        );
    }

    #[test]
    fn scalar_broadcasts_over_vector() {
        let env = Env::new();
        let e = Expr::lit(0.5) - Expr::vec2(1.0, 2.0) / 2.0;
        assert_eq!(env.eval(&e), Ok(Value::Vec2([0.0, -0.5])));
    }

    #[test]
    fn sign_of_zero_is_zero() {
        let env = Env::new();
        let e = Expr::sign(Expr::vec2(0.0, -3.0));
        assert_eq!(env.eval(&e), Ok(Value::Vec2([0.0, -1.0])));
    }

    #[test]
    fn select_and_index() {
        let pts = Var::input("pts", ShaderType::Vec2Array(3));
        let wind = Var::input("wind", ShaderType::Float);
        let mut env = Env::new();
        env.bind(&pts, Value::Vec2Array(vec![[0.0, 0.0], [1.0, 2.0], [2.0, 0.0]]));
        env.bind(&wind, -1.0f32);

        let e = Expr::select(wind.expr().greater_than(0.0), pts.expr().at(2), pts.expr().at(0));
        assert_eq!(env.eval(&e), Ok(Value::Vec2([0.0, 0.0])));
        env.bind(&wind, 1.0f32);
        assert_eq!(env.eval(&e), Ok(Value::Vec2([2.0, 0.0])));
        assert_eq!(
            env.eval(&pts.expr().at(5)),
            Err(IrError::Index { len: 3, index: 5 })
        );
    }

    #[test]
    fn swizzles_pick_components() {
        let env = Env::new();
        let v = Expr::construct(ShaderType::Vec4, [Expr::vec2(1.0, 2.0), Expr::vec2(3.0, 4.0)]);
        assert_eq!(env.eval(&v.clone().zw()), Ok(Value::Vec2([3.0, 4.0])));
        assert_eq!(env.eval(&v.swizzle("wx")), Ok(Value::Vec2([4.0, 1.0])));
    }

    #[test]
    fn exec_runs_lets_and_assigns() {
        let out = Var::new("out", Storage::Output, ShaderType::Float);
        let t = Var::new("t", Storage::Local, ShaderType::Float);
        let mut env = Env::new();
        env.declare(&out);
        env.exec(&[
            Stmt::Let { var: t.clone(), value: Expr::lit(3.0) },
            Stmt::Assign { target: out.clone(), value: t.expr() * 2.0 },
        ])
        .unwrap();
        assert_eq!(env.get(&out), Some(&Value::Float(6.0)));
    }

    #[test]
    fn assign_to_undeclared_is_an_error() {
        let out = Var::new("out", Storage::Output, ShaderType::Float);
        let mut env = Env::new();
        let err = env.exec(&[Stmt::Assign { target: out, value: Expr::lit(1.0) }]);
        assert_eq!(err, Err(IrError::Unbound("out".into())));
    }

    #[test]
    fn unbound_read_is_reported_by_name() {
        let env = Env::new();
        let e = Var::input("missing", ShaderType::Float).expr() + 1.0;
        assert_eq!(env.eval(&e), Err(IrError::Unbound("missing".into())));
    }
}
