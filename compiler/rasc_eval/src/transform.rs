//! World-to-pixel coordinate transforms.
//!
//! Both transforms round to the nearest pixel with `floor(v + 0.5)`, so a
//! world coordinate exactly half-way between two pixels goes to the
//! higher one. Null and infinite coordinates fall in no pixel.

/// Round a world coordinate to a pixel index.
#[inline]
fn to_pixel(v: f64) -> Option<i64> {
    let rounded = (v + 0.5).floor();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    (rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64)
        .then_some(rounded as i64)
}

/// `x' = m00 * x + m01 * y + m02`, `y' = m10 * x + m11 * y + m12`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AffineTransform {
    pub m00: f64,
    pub m01: f64,
    pub m02: f64,
    pub m10: f64,
    pub m11: f64,
    pub m12: f64,
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        m00: 1.0,
        m01: 0.0,
        m02: 0.0,
        m10: 0.0,
        m11: 1.0,
        m12: 0.0,
    };

    pub fn translation(dx: f64, dy: f64) -> Self {
        AffineTransform {
            m02: dx,
            m12: dy,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        AffineTransform {
            m00: sx,
            m11: sy,
            ..Self::IDENTITY
        }
    }

    /// `next` applied after `self`.
    #[must_use]
    pub fn then(&self, next: &AffineTransform) -> Self {
        AffineTransform {
            m00: next.m00 * self.m00 + next.m01 * self.m10,
            m01: next.m00 * self.m01 + next.m01 * self.m11,
            m02: next.m00 * self.m02 + next.m01 * self.m12 + next.m02,
            m10: next.m10 * self.m00 + next.m11 * self.m10,
            m11: next.m10 * self.m01 + next.m11 * self.m11,
            m12: next.m10 * self.m02 + next.m11 * self.m12 + next.m12,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.m00 * x + self.m01 * y + self.m02,
            self.m10 * x + self.m11 * y + self.m12,
        )
    }

    /// `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.m00 * self.m11 - self.m01 * self.m10;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let m00 = self.m11 / det;
        let m01 = -self.m01 / det;
        let m10 = -self.m10 / det;
        let m11 = self.m00 / det;
        Some(AffineTransform {
            m00,
            m01,
            m02: -(m00 * self.m02 + m01 * self.m12),
            m10,
            m11,
            m12: -(m10 * self.m02 + m11 * self.m12),
        })
    }
}

/// Maps a world position to the pixel it falls in.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum CoordinateTransform {
    /// World units are pixels.
    #[default]
    Identity,
    Affine(AffineTransform),
}

impl CoordinateTransform {
    /// `None` when the position is null, infinite or beyond pixel range.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        let (px, py) = match self {
            CoordinateTransform::Identity => (x, y),
            CoordinateTransform::Affine(m) => m.apply(x, y),
        };
        Some((to_pixel(px)?, to_pixel(py)?))
    }

    /// World position of pixel `(x, y)`, if the transform can be inverted.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self {
            CoordinateTransform::Identity => Some((x, y)),
            CoordinateTransform::Affine(m) => m.inverse().map(|inv| inv.apply(x, y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rounds_to_nearest() {
        let t = CoordinateTransform::Identity;
        assert_eq!(t.world_to_pixel(0.0, 0.0), Some((0, 0)));
        assert_eq!(t.world_to_pixel(0.49, 1.51), Some((0, 2)));
        assert_eq!(t.world_to_pixel(0.5, -0.5), Some((1, 0)));
        assert_eq!(t.world_to_pixel(-0.51, 2.5), Some((-1, 3)));
    }

    #[test]
    fn test_non_finite_positions_have_no_pixel() {
        let t = CoordinateTransform::Identity;
        assert_eq!(t.world_to_pixel(f64::NAN, 0.0), None);
        assert_eq!(t.world_to_pixel(0.0, f64::INFINITY), None);
        assert_eq!(t.world_to_pixel(1e300, 0.0), None);
        let shifted = CoordinateTransform::Affine(AffineTransform::translation(1.0, 0.0));
        assert_eq!(shifted.world_to_pixel(f64::NAN, 0.0), None);
    }

    #[test]
    fn test_affine_scale_and_translate() {
        let m = AffineTransform::scale(0.5, 0.5).then(&AffineTransform::translation(10.0, 0.0));
        let t = CoordinateTransform::Affine(m);
        assert_eq!(t.world_to_pixel(4.0, 6.0), Some((12, 3)));
        assert_eq!(t.pixel_to_world(12.0, 3.0), Some((4.0, 6.0)));
    }

    #[test]
    fn test_inverse_round_trip() {
        let m = AffineTransform {
            m00: 2.0,
            m01: 1.0,
            m02: -3.0,
            m10: 0.5,
            m11: 4.0,
            m12: 7.0,
        };
        let inv = m.inverse();
        assert!(inv.is_some());
        let (x, y) = m.apply(1.25, -2.0);
        let (bx, by) = inv.map_or((f64::NAN, f64::NAN), |inv| inv.apply(x, y));
        assert!((bx - 1.25).abs() < 1e-12);
        assert!((by + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert_eq!(AffineTransform::scale(0.0, 1.0).inverse(), None);
        let t = CoordinateTransform::Affine(AffineTransform::scale(1.0, 0.0));
        assert_eq!(t.pixel_to_world(1.0, 1.0), None);
    }
}
