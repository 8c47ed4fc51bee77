/// Emission options for a curve coverage program.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EmitConfig {
    /// Half-width of the antialiasing ramp in device pixels.
    ///
    /// Scales the analytic gradient (`2 * bloat`) and the flat-edge equation,
    /// and is the distance hull corners are pushed out by. Tuned against
    /// rendered output rather than derived.
    pub bloat: f32,
    /// Rasterize the 4-point De Casteljau hull instead of the control triangle.
    pub hull: bool,
    /// Carry a per-instance corner coverage input and add the attenuated
    /// corner term to the fragment coverage.
    pub corner_coverage: bool,
}

impl EmitConfig {
    pub const DEFAULT_BLOAT: f32 = 0.5;

    pub fn with_bloat(mut self, bloat: f32) -> Self {
        self.bloat = bloat;
        self
    }

    pub fn with_hull(mut self, hull: bool) -> Self {
        self.hull = hull;
        self
    }

    pub fn with_corner_coverage(mut self, corner_coverage: bool) -> Self {
        self.corner_coverage = corner_coverage;
        self
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.bloat > 0.0 && self.bloat.is_finite()
    }
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            bloat: Self::DEFAULT_BLOAT,
            hull: true,
            corner_coverage: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_draws_hull_without_corners() {
        let c = EmitConfig::default();
        assert!(c.hull);
        assert!(!c.corner_coverage);
        assert_eq!(c.bloat, EmitConfig::DEFAULT_BLOAT);
        assert!(c.is_valid());
    }

    #[test]
    fn builders_override_fields() {
        let c = EmitConfig::default().with_bloat(0.25).with_hull(false).with_corner_coverage(true);
        assert_eq!(c, EmitConfig { bloat: 0.25, hull: false, corner_coverage: true });
    }

    #[test]
    fn non_positive_bloat_is_invalid() {
        assert!(!EmitConfig::default().with_bloat(0.0).is_valid());
        assert!(!EmitConfig::default().with_bloat(f32::NAN).is_valid());
    }
}
