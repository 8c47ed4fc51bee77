use super::Vec2;

/// Axis-aligned rectangle in device pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Smallest rectangle containing every point. `None` for an empty input.
    pub fn bounding(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (lo, hi) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Rect { origin: lo, size: hi - lo })
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    /// Grows the rectangle by `amount` on every side.
    #[inline]
    pub fn outset(self, amount: f32) -> Self {
        Rect {
            origin: self.origin - Vec2::new(amount, amount),
            size: self.size + Vec2::new(2.0 * amount, 2.0 * amount),
        }
    }

    /// Closed containment: [min, max].
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let (lo, hi) = (self.min(), self.max());
        p.x >= lo.x && p.y >= lo.y && p.x <= hi.x && p.y <= hi.y
    }
}
