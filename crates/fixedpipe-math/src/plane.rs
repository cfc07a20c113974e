use crate::Mat4;

/// Plane in `ax + by + cz + d = 0` form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Plane {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl Plane {
    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self { a, b, c, d }
    }

    /// Transforms the plane as the row vector `(a, b, c, d) * M`.
    ///
    /// To transform a plane alongside points transformed by `M`, pass the
    /// inverse-transpose of `M` here.
    pub fn transform(self, m: &Mat4) -> Plane {
        Plane {
            a: self.a * m.m[0][0] + self.b * m.m[1][0] + self.c * m.m[2][0] + self.d * m.m[3][0],
            b: self.a * m.m[0][1] + self.b * m.m[1][1] + self.c * m.m[2][1] + self.d * m.m[3][1],
            c: self.a * m.m[0][2] + self.b * m.m[1][2] + self.c * m.m[2][2] + self.d * m.m[3][2],
            d: self.a * m.m[0][3] + self.b * m.m[1][3] + self.c * m.m[2][3] + self.d * m.m[3][3],
        }
    }

    /// Scales all four coefficients so the normal `(a, b, c)` has unit
    /// length. A plane with a zero normal is returned unchanged.
    pub fn normalized(self) -> Plane {
        let len = (self.a * self.a + self.b * self.b + self.c * self.c).sqrt();
        if len > 0.0 {
            Plane {
                a: self.a / len,
                b: self.b / len,
                c: self.c / len,
                d: self.d / len,
            }
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_divides_by_normal_length() {
        let p = Plane::new(0.0, 3.0, 4.0, 10.0).normalized();
        assert!((p.b - 0.6).abs() < 1e-6);
        assert!((p.c - 0.8).abs() < 1e-6);
        assert!((p.d - 2.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_zero_normal_is_unchanged() {
        let p = Plane::new(0.0, 0.0, 0.0, 7.0);
        assert_eq!(p.normalized(), p);
    }

    #[test]
    fn identity_transform_is_noop() {
        let p = Plane::new(0.0, 1.0, 0.0, -5.0);
        assert_eq!(p.transform(&Mat4::IDENTITY), p);
    }

    #[test]
    fn transform_by_inverse_transpose_follows_translation() {
        // Plane y = 0, translated up by 2, becomes y = 2 (i.e. y - 2 = 0).
        let m = Mat4::translation(0.0, 2.0, 0.0);
        let inv_t = m.inverse().unwrap().transpose();
        let p = Plane::new(0.0, 1.0, 0.0, 0.0).transform(&inv_t);
        assert!((p.b - 1.0).abs() < 1e-6);
        assert!((p.d + 2.0).abs() < 1e-6);
    }
}
