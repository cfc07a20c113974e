use std::ops::Mul;

/// 4x4 row-major matrix.
///
/// Uses the row-vector convention: transforming is `v * M`, so `a * b`
/// applies `a` first and `b` second. Translation therefore lives in the
/// bottom row (`m[3][0..3]`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const ZERO: Mat4 = Mat4 { m: [[0.0; 4]; 4] };

    pub const fn from_rows(m: [[f32; 4]; 4]) -> Self {
        Self { m }
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                out[i][j] = self.m[j][i];
            }
        }
        Mat4 { m: out }
    }

    /// Inverts via Gauss-Jordan elimination without row exchange.
    ///
    /// Returns `None` when a pivot falls below `1e-6` in magnitude, which
    /// covers singular matrices and the near-singular inputs the renderer
    /// treats as degenerate.
    pub fn inverse(&self) -> Option<Mat4> {
        let mut m = self.m;
        let mut inv = Mat4::IDENTITY.m;

        for i in 0..4 {
            let pivot = m[i][i];
            if pivot.abs() < 1e-6 {
                return None;
            }

            for j in 0..4 {
                m[i][j] /= pivot;
                inv[i][j] /= pivot;
            }

            for k in 0..4 {
                if k == i {
                    continue;
                }
                let factor = m[k][i];
                for j in 0..4 {
                    m[k][j] -= factor * m[i][j];
                    inv[k][j] -= factor * inv[i][j];
                }
            }
        }

        Some(Mat4 { m: inv })
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        let mut out = Mat4::IDENTITY;
        out.m[3][0] = x;
        out.m[3][1] = y;
        out.m[3][2] = z;
        out
    }

    /// Right-handed perspective projection from near-plane extents.
    ///
    /// `width` and `height` are the view volume dimensions at the near plane;
    /// depth maps to `[0, 1]`.
    pub fn perspective_rh(width: f32, height: f32, z_near: f32, z_far: f32) -> Mat4 {
        let mut out = Mat4::ZERO;
        out.m[0][0] = 2.0 * z_near / width;
        out.m[1][1] = 2.0 * z_near / height;
        out.m[2][2] = z_far / (z_near - z_far);
        out.m[2][3] = -1.0;
        out.m[3][2] = z_near * z_far / (z_near - z_far);
        out
    }

    /// Right-handed off-center perspective projection (view frustum given by
    /// near-plane edges).
    pub fn perspective_off_center_rh(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
    ) -> Mat4 {
        let mut out = Mat4::ZERO;
        out.m[0][0] = 2.0 * z_near / (right - left);
        out.m[1][1] = 2.0 * z_near / (top - bottom);
        out.m[2][0] = (left + right) / (left - right);
        out.m[2][1] = (top + bottom) / (bottom - top);
        out.m[2][2] = z_far / (z_near - z_far);
        out.m[2][3] = -1.0;
        out.m[3][2] = z_near * z_far / (z_near - z_far);
        out
    }

    /// Right-handed off-center orthographic projection; depth maps to
    /// `[0, 1]`.
    pub fn ortho_off_center_rh(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
    ) -> Mat4 {
        let mut out = Mat4::ZERO;
        out.m[0][0] = 2.0 / (right - left);
        out.m[1][1] = 2.0 / (top - bottom);
        out.m[2][2] = 1.0 / (z_near - z_far);
        out.m[3][0] = (left + right) / (left - right);
        out.m[3][1] = (top + bottom) / (bottom - top);
        out.m[3][2] = z_near / (z_near - z_far);
        out.m[3][3] = 1.0;
        out
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.m[i][k] * rhs.m[k][j];
                }
                out[i][j] = sum;
            }
        }
        Mat4 { m: out }
    }
}
