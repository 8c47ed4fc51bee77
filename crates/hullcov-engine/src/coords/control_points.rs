use super::{Rect, Vec2};

/// The three control points of a quadratic Bézier segment.
///
/// Invariant (caller-enforced):
/// - Points are not collinear. Collinear points make the canonical transform
///   singular; see [`ControlPoints::is_degenerate`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ControlPoints {
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
}

impl ControlPoints {
    #[inline]
    pub const fn new(p0: Vec2, p1: Vec2, p2: Vec2) -> Self {
        Self { p0, p1, p2 }
    }

    #[inline]
    pub fn to_array(self) -> [Vec2; 3] {
        [self.p0, self.p1, self.p2]
    }

    /// Point on the curve: `(1-t)²·P0 + 2t(1-t)·P1 + t²·P2`.
    pub fn eval(self, t: f32) -> Vec2 {
        let u = 1.0 - t;
        self.p0 * (u * u) + self.p1 * (2.0 * t * u) + self.p2 * (t * t)
    }

    /// Twice the signed area of the control triangle.
    ///
    /// Positive when P0→P1→P2 turns counter-clockwise in a y-up frame.
    #[inline]
    pub fn orientation(self) -> f32 {
        (self.p1 - self.p0).cross(self.p2 - self.p0)
    }

    /// Winding that selects the flat edge facing away from P1: the sign of
    /// [`orientation`](Self::orientation), or `0.0` for collinear points.
    pub fn winding(self) -> f32 {
        let o = self.orientation();
        if o > 0.0 {
            1.0
        } else if o < 0.0 {
            -1.0
        } else {
            0.0
        }
    }

    /// `true` when the points are collinear (or not finite) and the segment
    /// has no canonical transform.
    pub fn is_degenerate(self) -> bool {
        let finite = self.p0.is_finite() && self.p1.is_finite() && self.p2.is_finite();
        !finite || self.orientation() == 0.0
    }

    /// Quadrilateral bounding the curve: the control triangle clipped by the
    /// tangent at t = 0.5, where a quadratic reaches its maximum height.
    pub fn hull(self) -> [Vec2; 4] {
        [self.p0, self.p0.midpoint(self.p1), self.p1.midpoint(self.p2), self.p2]
    }

    /// Axis-aligned bounds of [`hull`](Self::hull).
    pub fn bounds(self) -> Rect {
        Rect::bounding(self.hull()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch() -> ControlPoints {
        ControlPoints::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 2.0), Vec2::new(2.0, 0.0))
    }

    #[test]
    fn hull_is_de_casteljau_midpoints() {
        assert_eq!(
            arch().hull(),
            [Vec2::new(0.0, 0.0), Vec2::new(0.5, 1.0), Vec2::new(1.5, 1.0), Vec2::new(2.0, 0.0)]
        );
    }

    #[test]
    fn hull_touches_curve_apex() {
        // The middle hull edge is the tangent at t = 0.5.
        let apex = arch().eval(0.5);
        let [_, b, c, _] = arch().hull();
        assert_eq!(apex, b.midpoint(c));
    }

    #[test]
    fn eval_hits_endpoints() {
        assert_eq!(arch().eval(0.0), arch().p0);
        assert_eq!(arch().eval(1.0), arch().p2);
    }

    #[test]
    fn winding_follows_orientation() {
        assert_eq!(arch().winding(), -1.0);
        let flipped = ControlPoints::new(arch().p0, Vec2::new(1.0, -2.0), arch().p2);
        assert_eq!(flipped.winding(), 1.0);
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let line = ControlPoints::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(3.0, 3.0));
        assert!(line.is_degenerate());
        assert_eq!(line.winding(), 0.0);
        assert!(!arch().is_degenerate());
    }

    #[test]
    fn bounds_cover_hull() {
        assert_eq!(arch().bounds(), Rect::new(0.0, 0.0, 2.0, 1.0));
    }

    #[test]
    fn curve_stays_inside_bounds() {
        let pts = ControlPoints::new(Vec2::new(3.0, 1.0), Vec2::new(7.0, 9.0), Vec2::new(12.0, 2.0));
        let bounds = pts.bounds();
        assert!((0..=32).all(|i| bounds.contains(pts.eval(i as f32 / 32.0))));
        assert!(!bounds.contains(pts.p1));
    }
}
