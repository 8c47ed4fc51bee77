use std::fmt;

/// Value types the coverage shaders are built from.
///
/// All floating-point types are 32-bit. Matrices are column-major.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderType {
    Bool,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    /// Fixed-size array of `Vec2` (control points, hull corners).
    Vec2Array(usize),
}

impl ShaderType {
    /// Number of scalar components for scalars and vectors.
    ///
    /// Returns `None` for booleans, matrices and arrays.
    pub fn components(self) -> Option<usize> {
        match self {
            Self::Float => Some(1),
            Self::Vec2 => Some(2),
            Self::Vec3 => Some(3),
            Self::Vec4 => Some(4),
            Self::Bool | Self::Mat2 | Self::Vec2Array(_) => None,
        }
    }

    /// Scalar or vector type with `n` components.
    ///
    /// Returns `None` unless `n` is 1 to 4.
    pub fn vector(n: usize) -> Option<Self> {
        match n {
            1 => Some(Self::Float),
            2 => Some(Self::Vec2),
            3 => Some(Self::Vec3),
            4 => Some(Self::Vec4),
            _ => None,
        }
    }

    #[inline]
    pub fn is_vector(self) -> bool {
        matches!(self, Self::Vec2 | Self::Vec3 | Self::Vec4)
    }
}

impl fmt::Display for ShaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Float => f.write_str("float"),
            Self::Vec2 => f.write_str("vec2"),
            Self::Vec3 => f.write_str("vec3"),
            Self::Vec4 => f.write_str("vec4"),
            Self::Mat2 => f.write_str("mat2"),
            Self::Vec2Array(n) => write!(f, "vec2[{n}]"),
        }
    }
}
