use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::error::IrError;
use crate::ty::ShaderType;

/// Where a variable lives. Backends use this to decide how a name is spelled
/// (struct member access for varyings, plain identifiers otherwise).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Storage {
    /// Supplied by the caller (control points, winding, position, bloat).
    Input,
    /// Declared once per primitive, written by setup, read by later phases.
    Global,
    /// Function-local temporary.
    Local,
    /// Varying as written by the vertex stage.
    VaryingOut,
    /// Varying as read by the fragment stage.
    VaryingIn,
    /// Stage output (the fragment coverage).
    Output,
}

/// A typed, named variable reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    pub name: String,
    pub storage: Storage,
    pub ty: ShaderType,
}

impl Var {
    pub fn new(name: impl Into<String>, storage: Storage, ty: ShaderType) -> Self {
        Self { name: name.into(), storage, ty }
    }

    #[inline]
    pub fn input(name: impl Into<String>, ty: ShaderType) -> Self {
        Self::new(name, Storage::Input, ty)
    }

    /// The same variable seen through a different storage class.
    ///
    /// Used to pair a varying's vertex-side name with its fragment-side name.
    pub fn with_storage(&self, storage: Storage) -> Self {
        Self { storage, ..self.clone() }
    }

    #[inline]
    pub fn expr(&self) -> Expr {
        Expr::Var(self.clone())
    }
}

/// Component selection such as `.x`, `.zw` or `.xyz`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Swizzle {
    comps: [u8; 4],
    len: u8,
}

impl Swizzle {
    /// Parses `xyzw` letters, one to four of them.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 {
            return None;
        }
        let mut comps = [0u8; 4];
        for (slot, b) in comps.iter_mut().zip(bytes) {
            *slot = match b {
                b'x' => 0,
                b'y' => 1,
                b'z' => 2,
                b'w' => 3,
                _ => return None,
            };
        }
        Some(Self { comps, len: bytes.len() as u8 })
    }

    #[inline]
    pub fn components(&self) -> &[u8] {
        &self.comps[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &c in self.components() {
            f.write_str(["x", "y", "z", "w"][c as usize])?;
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }
}

/// Builtin functions the coverage math relies on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Builtin {
    Abs,
    Sign,
    Min,
    Max,
    Dot,
    /// 2×2 matrix inverse. Not every target has it natively.
    Inverse,
}

impl Builtin {
    pub fn arity(self) -> usize {
        match self {
            Builtin::Abs | Builtin::Sign | Builtin::Inverse => 1,
            Builtin::Min | Builtin::Max | Builtin::Dot => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Abs => "abs",
            Builtin::Sign => "sign",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Dot => "dot",
            Builtin::Inverse => "inverse",
        }
    }
}

/// Shader expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(f32),
    Var(Var),
    Construct(ShaderType, Vec<Expr>),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    Call(Builtin, Vec<Expr>),
    Swizzle(Box<Expr>, Swizzle),
    /// Constant index into an array.
    Index(Box<Expr>, usize),
    /// `cond ? accept : reject`
    Select {
        cond: Box<Expr>,
        accept: Box<Expr>,
        reject: Box<Expr>,
    },
}

// ── construction helpers ──────────────────────────────────────────────────

impl Expr {
    #[inline]
    pub fn lit(v: f32) -> Self {
        Expr::Lit(v)
    }

    pub fn vec2(x: impl Into<Expr>, y: impl Into<Expr>) -> Self {
        Expr::Construct(ShaderType::Vec2, vec![x.into(), y.into()])
    }

    /// Builds a vector of type `ty` from any mix of scalars and vectors.
    pub fn construct(ty: ShaderType, parts: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Construct(ty, parts.into_iter().collect())
    }

    /// Column-major 2×2 matrix from four scalars.
    pub fn mat2(c0x: f32, c0y: f32, c1x: f32, c1y: f32) -> Self {
        Expr::Construct(
            ShaderType::Mat2,
            vec![Expr::Lit(c0x), Expr::Lit(c0y), Expr::Lit(c1x), Expr::Lit(c1y)],
        )
    }

    /// 2×2 matrix from two column vectors.
    pub fn mat2_cols(c0: Expr, c1: Expr) -> Self {
        Expr::Construct(ShaderType::Mat2, vec![c0, c1])
    }

    pub fn abs(e: Expr) -> Self {
        Expr::Call(Builtin::Abs, vec![e])
    }

    pub fn sign(e: Expr) -> Self {
        Expr::Call(Builtin::Sign, vec![e])
    }

    pub fn min(a: Expr, b: impl Into<Expr>) -> Self {
        Expr::Call(Builtin::Min, vec![a, b.into()])
    }

    pub fn max(a: Expr, b: impl Into<Expr>) -> Self {
        Expr::Call(Builtin::Max, vec![a, b.into()])
    }

    pub fn dot(a: Expr, b: Expr) -> Self {
        Expr::Call(Builtin::Dot, vec![a, b])
    }

    pub fn inverse(m: Expr) -> Self {
        Expr::Call(Builtin::Inverse, vec![m])
    }

    pub fn select(cond: Expr, accept: Expr, reject: Expr) -> Self {
        Expr::Select {
            cond: Box::new(cond),
            accept: Box::new(accept),
            reject: Box::new(reject),
        }
    }

    pub fn compare(self, op: CmpOp, rhs: impl Into<Expr>) -> Self {
        Expr::Compare(op, Box::new(self), Box::new(rhs.into()))
    }

    #[inline]
    pub fn greater_than(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CmpOp::Gt, rhs)
    }

    #[inline]
    pub fn not_equal(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CmpOp::Ne, rhs)
    }

    pub fn at(self, index: usize) -> Self {
        Expr::Index(Box::new(self), index)
    }

    /// Applies a swizzle written as `xyzw` letters.
    ///
    /// # Panics
    /// If `letters` is not a valid swizzle. Callers pass string literals.
    pub fn swizzle(self, letters: &str) -> Self {
        let s = Swizzle::parse(letters)
            .unwrap_or_else(|| panic!("invalid swizzle literal `{letters}`"));
        Expr::Swizzle(Box::new(self), s)
    }

    #[inline]
    pub fn x(self) -> Self {
        self.swizzle("x")
    }

    #[inline]
    pub fn y(self) -> Self {
        self.swizzle("y")
    }

    #[inline]
    pub fn z(self) -> Self {
        self.swizzle("z")
    }

    #[inline]
    pub fn w(self) -> Self {
        self.swizzle("w")
    }

    #[inline]
    pub fn xy(self) -> Self {
        self.swizzle("xy")
    }

    #[inline]
    pub fn zw(self) -> Self {
        self.swizzle("zw")
    }
}

impl From<f32> for Expr {
    fn from(v: f32) -> Self {
        Expr::Lit(v)
    }
}

impl From<Var> for Expr {
    fn from(v: Var) -> Self {
        Expr::Var(v)
    }
}

impl From<&Var> for Expr {
    fn from(v: &Var) -> Self {
        Expr::Var(v.clone())
    }
}

macro_rules! impl_binop {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<Expr>> $trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::Binary($op, Box::new(self), Box::new(rhs.into()))
            }
        }
    };
}

impl_binop!(Add, add, BinOp::Add);
impl_binop!(Sub, sub, BinOp::Sub);
impl_binop!(Mul, mul, BinOp::Mul);
impl_binop!(Div, div, BinOp::Div);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

// ── inspection ────────────────────────────────────────────────────────────

impl Expr {
    /// Binding strength for C-like infix printing.
    ///
    /// Comparisons bind weakest, then additive, then multiplicative; every
    /// other node is atomic.
    pub fn precedence(&self) -> u8 {
        match self {
            Expr::Compare(..) => 0,
            Expr::Binary(BinOp::Add | BinOp::Sub, ..) => 1,
            Expr::Binary(BinOp::Mul | BinOp::Div, ..) => 2,
            _ => 3,
        }
    }

    /// Pre-order traversal over this node and all sub-expressions.
    pub fn walk(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Lit(_) | Expr::Var(_) => {}
            Expr::Construct(_, args) | Expr::Call(_, args) => {
                for a in args {
                    a.walk(f);
                }
            }
            Expr::Neg(e) | Expr::Swizzle(e, _) | Expr::Index(e, _) => e.walk(f),
            Expr::Binary(_, l, r) | Expr::Compare(_, l, r) => {
                l.walk(f);
                r.walk(f);
            }
            Expr::Select { cond, accept, reject } => {
                cond.walk(f);
                accept.walk(f);
                reject.walk(f);
            }
        }
    }

    /// Returns `true` if any node calls `builtin`.
    pub fn uses(&self, builtin: Builtin) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if let Expr::Call(b, _) = e {
                found |= *b == builtin;
            }
        });
        found
    }

    /// Infers the type of the expression.
    pub fn ty(&self) -> Result<ShaderType, IrError> {
        use ShaderType as T;

        match self {
            Expr::Lit(_) => Ok(T::Float),
            Expr::Var(v) => Ok(v.ty),
            Expr::Construct(ty, args) => {
                let tys = args.iter().map(Expr::ty).collect::<Result<Vec<_>, _>>()?;
                construct_type(*ty, &tys)
            }
            Expr::Neg(e) => match e.ty()? {
                t @ (T::Float | T::Vec2 | T::Vec3 | T::Vec4 | T::Mat2) => Ok(t),
                t => Err(IrError::ty("-", [t])),
            },
            Expr::Binary(op, l, r) => arith_type(*op, l.ty()?, r.ty()?),
            Expr::Compare(op, l, r) => match (l.ty()?, r.ty()?) {
                (T::Float, T::Float) => Ok(T::Bool),
                (a, b) => Err(IrError::ty(op.symbol(), [a, b])),
            },
            Expr::Call(builtin, args) => {
                if args.len() != builtin.arity() {
                    return Err(IrError::Arity {
                        op: builtin.name(),
                        expected: builtin.arity(),
                        found: args.len(),
                    });
                }
                let tys = args.iter().map(Expr::ty).collect::<Result<Vec<_>, _>>()?;
                builtin_type(*builtin, &tys)
            }
            Expr::Swizzle(base, s) => {
                let bt = base.ty()?;
                let n = match bt.components() {
                    Some(n) if bt.is_vector() => n,
                    _ => {
                        return Err(IrError::Swizzle { base: bt, swizzle: s.to_string() });
                    }
                };
                if s.components().iter().any(|&c| c as usize >= n) {
                    return Err(IrError::Swizzle { base: bt, swizzle: s.to_string() });
                }
                T::vector(s.len()).ok_or(IrError::Swizzle { base: bt, swizzle: s.to_string() })
            }
            Expr::Index(base, index) => match base.ty()? {
                T::Vec2Array(len) if *index < len => Ok(T::Vec2),
                T::Vec2Array(len) => Err(IrError::Index { len, index: *index }),
                t => Err(IrError::ty("[]", [t])),
            },
            Expr::Select { cond, accept, reject } => {
                let (c, a, r) = (cond.ty()?, accept.ty()?, reject.ty()?);
                if c == T::Bool && a == r {
                    Ok(a)
                } else {
                    Err(IrError::ty("select", [c, a, r]))
                }
            }
        }
    }
}

pub(crate) fn construct_type(ty: ShaderType, args: &[ShaderType]) -> Result<ShaderType, IrError> {
    use ShaderType as T;

    let ok = match ty {
        T::Float => args == [T::Float],
        T::Vec2 | T::Vec3 | T::Vec4 => {
            let want = ty.components().unwrap_or(0);
            let total: Option<usize> = args.iter().map(|t| t.components()).sum();
            args == [T::Float] || total == Some(want)
        }
        T::Mat2 => args == [T::Float; 4] || args == [T::Vec2; 2],
        T::Vec2Array(n) => args.len() == n && args.iter().all(|t| *t == T::Vec2),
        T::Bool => false,
    };
    if ok { Ok(ty) } else { Err(IrError::ty("construct", args)) }
}

pub(crate) fn arith_type(op: BinOp, l: ShaderType, r: ShaderType) -> Result<ShaderType, IrError> {
    use ShaderType as T;

    let out = match (op, l, r) {
        (BinOp::Add | BinOp::Sub, a, b) if a == b && a != T::Bool && !matches!(a, T::Vec2Array(_)) => {
            Some(a)
        }
        (BinOp::Add | BinOp::Sub, T::Float, v) | (BinOp::Add | BinOp::Sub, v, T::Float)
            if v.is_vector() =>
        {
            Some(v)
        }
        (BinOp::Mul, T::Float, t) if t.is_vector() || t == T::Float || t == T::Mat2 => Some(t),
        (BinOp::Mul, t, T::Float) if t.is_vector() || t == T::Mat2 => Some(t),
        (BinOp::Mul, a, b) if a == b && a.is_vector() => Some(a),
        (BinOp::Mul, T::Mat2, T::Vec2) | (BinOp::Mul, T::Vec2, T::Mat2) => Some(T::Vec2),
        (BinOp::Mul, T::Mat2, T::Mat2) => Some(T::Mat2),
        (BinOp::Div, t, T::Float) if t.is_vector() || t == T::Float => Some(t),
        (BinOp::Div, T::Float, v) if v.is_vector() => Some(v),
        (BinOp::Div, a, b) if a == b && a.is_vector() => Some(a),
        _ => None,
    };
    out.ok_or_else(|| IrError::ty(op.symbol(), [l, r]))
}

pub(crate) fn builtin_type(builtin: Builtin, args: &[ShaderType]) -> Result<ShaderType, IrError> {
    use ShaderType as T;

    let out = match (builtin, args) {
        (Builtin::Abs | Builtin::Sign, [t]) if t.components().is_some() => Some(*t),
        (Builtin::Min | Builtin::Max, [a, b]) if a == b && a.components().is_some() => Some(*a),
        (Builtin::Dot, [a, b]) if a == b && a.is_vector() => Some(T::Float),
        (Builtin::Inverse, [T::Mat2]) => Some(T::Mat2),
        _ => None,
    };
    out.ok_or_else(|| IrError::ty(builtin.name(), args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::ShaderType as T;

    fn v(name: &str, ty: T) -> Expr {
        Var::input(name, ty).expr()
    }

    #[test]
    fn swizzle_parse_and_display() {
        let s = Swizzle::parse("zw").unwrap();
        assert_eq!(s.components(), &[2, 3]);
        assert_eq!(s.to_string(), "zw");
        assert!(Swizzle::parse("").is_none());
        assert!(Swizzle::parse("xyzwx").is_none());
        assert!(Swizzle::parse("xq").is_none());
    }

    #[test]
    fn scalar_vector_broadcast_types() {
        let e = Expr::lit(2.0) * v("p", T::Vec2);
        assert_eq!(e.ty(), Ok(T::Vec2));
        let e = v("p", T::Vec3) - Expr::lit(1.0);
        assert_eq!(e.ty(), Ok(T::Vec3));
    }

    #[test]
    fn matrix_products() {
        let m = v("m", T::Mat2);
        assert_eq!((m.clone() * v("p", T::Vec2)).ty(), Ok(T::Vec2));
        assert_eq!((v("p", T::Vec2) * m.clone()).ty(), Ok(T::Vec2));
        assert_eq!((m.clone() * Expr::inverse(m.clone())).ty(), Ok(T::Mat2));
        assert!((m * v("q", T::Vec3)).ty().is_err());
    }

    #[test]
    fn vectors_of_different_width_do_not_add() {
        let e = v("a", T::Vec2) + v("b", T::Vec3);
        assert!(matches!(e.ty(), Err(IrError::Type { op: "+", .. })));
    }

    #[test]
    fn constructors_count_components() {
        let ok = Expr::construct(T::Vec4, [v("a", T::Vec2), Expr::lit(1.0), Expr::lit(0.0)]);
        assert_eq!(ok.ty(), Ok(T::Vec4));
        let splat = Expr::construct(T::Vec3, [Expr::lit(0.0)]);
        assert_eq!(splat.ty(), Ok(T::Vec3));
        let bad = Expr::construct(T::Vec3, [v("a", T::Vec2), v("b", T::Vec2)]);
        assert!(bad.ty().is_err());
        assert_eq!(Expr::mat2(1.0, 1.0, 0.5, 0.0).ty(), Ok(T::Mat2));
    }

    #[test]
    fn swizzle_out_of_range() {
        let e = v("a", T::Vec2).z();
        assert!(matches!(e.ty(), Err(IrError::Swizzle { .. })));
        assert_eq!(v("a", T::Vec4).zw().ty(), Ok(T::Vec2));
    }

    #[test]
    fn index_checks_bounds() {
        assert_eq!(v("pts", T::Vec2Array(3)).at(2).ty(), Ok(T::Vec2));
        assert_eq!(
            v("pts", T::Vec2Array(3)).at(3).ty(),
            Err(IrError::Index { len: 3, index: 3 })
        );
    }

    #[test]
    fn select_needs_bool_and_matching_arms() {
        let cond = v("w", T::Float).greater_than(0.0);
        let ok = Expr::select(cond.clone(), v("a", T::Vec2), v("b", T::Vec2));
        assert_eq!(ok.ty(), Ok(T::Vec2));
        let bad = Expr::select(cond, v("a", T::Vec2), Expr::lit(0.0));
        assert!(bad.ty().is_err());
    }

    #[test]
    fn builtin_arity_is_checked() {
        let e = Expr::Call(Builtin::Min, vec![Expr::lit(1.0)]);
        assert_eq!(e.ty(), Err(IrError::Arity { op: "min", expected: 2, found: 1 }));
    }

    #[test]
    fn uses_finds_nested_builtin() {
        let e = Expr::mat2(1.0, 1.0, 0.5, 0.0) * Expr::inverse(v("m", T::Mat2));
        assert!(e.uses(Builtin::Inverse));
        assert!(!e.uses(Builtin::Dot));
    }
}
