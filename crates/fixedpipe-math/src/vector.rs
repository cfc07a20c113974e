use std::ops::{Add, Sub};

use crate::Mat4;

/// 3-component float vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit-length copy. The zero vector normalizes to itself.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 {
            Vec3 {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            }
        } else {
            self
        }
    }

    /// Full 4x4 transform of the point `(x, y, z, 1)`, keeping all four
    /// components.
    pub fn transform(self, m: &Mat4) -> Vec4 {
        Vec4 {
            x: self.x * m.m[0][0] + self.y * m.m[1][0] + self.z * m.m[2][0] + m.m[3][0],
            y: self.x * m.m[0][1] + self.y * m.m[1][1] + self.z * m.m[2][1] + m.m[3][1],
            z: self.x * m.m[0][2] + self.y * m.m[1][2] + self.z * m.m[2][2] + m.m[3][2],
            w: self.x * m.m[0][3] + self.y * m.m[1][3] + self.z * m.m[2][3] + m.m[3][3],
        }
    }

    /// Transforms the point `(x, y, z, 1)` and projects back by `w`.
    ///
    /// A resulting `w` of zero yields the zero vector rather than infinities.
    pub fn transform_coord(self, m: &Mat4) -> Vec3 {
        let v = self.transform(m);
        if v.w == 0.0 {
            return Vec3::ZERO;
        }
        Vec3 {
            x: v.x / v.w,
            y: v.y / v.w,
            z: v.z / v.w,
        }
    }

    /// Transforms a direction by the upper-left 3x3 only (no translation).
    pub fn transform_normal(self, m: &Mat4) -> Vec3 {
        Vec3 {
            x: self.x * m.m[0][0] + self.y * m.m[1][0] + self.z * m.m[2][0],
            y: self.x * m.m[0][1] + self.y * m.m[1][1] + self.z * m.m[2][1],
            z: self.x * m.m[0][2] + self.y * m.m[1][2] + self.z * m.m[2][2],
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

/// 4-component float vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn transform(self, m: &Mat4) -> Vec4 {
        Vec4 {
            x: self.x * m.m[0][0] + self.y * m.m[1][0] + self.z * m.m[2][0] + self.w * m.m[3][0],
            y: self.x * m.m[0][1] + self.y * m.m[1][1] + self.z * m.m[2][1] + self.w * m.m[3][1],
            z: self.x * m.m[0][2] + self.y * m.m[1][2] + self.z * m.m[2][2] + self.w * m.m[3][2],
            w: self.x * m.m[0][3] + self.y * m.m[1][3] + self.z * m.m[2][3] + self.w * m.m[3][3],
        }
    }

    /// Unit-length copy over all four components; zero normalizes to itself.
    pub fn normalized(self) -> Vec4 {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len > 0.0 {
            Vec4 {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
                w: self.w / len,
            }
        } else {
            self
        }
    }
}
