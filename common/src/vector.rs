use nalgebra::Vector3;
use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Three component vector used for steering math. Planar code leaves `z` at zero.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    #[inline(always)]
    fn to_na(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    #[inline(always)]
    fn from_na(v: Vector3<f64>) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn length(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        self.to_na().norm()
    }

    pub fn length_squared(&self) -> f64 {
        self.to_na().norm_squared()
    }

    /// Scales to unit length in place. The null vector stays null.
    pub fn normalize(&mut self) {
        *self = self.normalized();
    }

    pub fn normalized(&self) -> Vector {
        let len = self.length();
        if len == 0.0 {
            return Vector::ZERO;
        }
        Self::from_na(self.to_na() / len)
    }

    pub fn scale(&mut self, factor: f64) {
        *self = self.scaled(factor);
    }

    pub fn scaled(&self, factor: f64) -> Vector {
        Self::from_na(self.to_na() * factor)
    }

    pub fn left_normal(&self) -> Vector {
        Vector::planar(-self.y, self.x)
    }

    pub fn right_normal(&self) -> Vector {
        Vector::planar(self.y, -self.x)
    }

    pub fn polar_radius(&self) -> f64 {
        self.length()
    }

    pub fn polar_angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Signed planar angle from `self` to `other`, in `(-PI, PI]`.
    pub fn angle_to(&self, other: &Vector) -> f64 {
        let mut diff = other.polar_angle() - self.polar_angle();
        if diff > PI {
            diff -= 2.0 * PI;
        } else if diff <= -PI {
            diff += 2.0 * PI;
        }
        diff
    }

    /// Unsigned angle between `a` and `b`.
    pub fn scalar(a: &Vector, b: &Vector) -> f64 {
        (Self::dot(a, b) / (a.length() * b.length())).acos()
    }

    pub fn dot(a: &Vector, b: &Vector) -> f64 {
        a.to_na().dot(&b.to_na())
    }

    pub fn cross(a: &Vector, b: &Vector) -> Vector {
        Self::from_na(a.to_na().cross(&b.to_na()))
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.x, self.y, self.z)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, other: Vector) -> Vector {
        Vector::from_na(self.to_na() + other.to_na())
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, other: Vector) -> Vector {
        Vector::from_na(self.to_na() - other.to_na())
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, factor: f64) -> Vector {
        self.scaled(factor)
    }
}

impl Mul<Vector> for f64 {
    type Output = Vector;

    fn mul(self, vector: Vector) -> Vector {
        vector.scaled(self)
    }
}

impl Div<f64> for Vector {
    type Output = Vector;

    fn div(self, divisor: f64) -> Vector {
        self.scaled(1.0 / divisor)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::from_na(-self.to_na())
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, other: Vector) {
        *self = *self + other;
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, other: Vector) {
        *self = *self - other;
    }
}

impl MulAssign<f64> for Vector {
    fn mul_assign(&mut self, factor: f64) {
        self.scale(factor);
    }
}

/// Component-wise product.
impl MulAssign<Vector> for Vector {
    fn mul_assign(&mut self, other: Vector) {
        *self = Vector::from_na(self.to_na().component_mul(&other.to_na()));
    }
}

impl DivAssign<f64> for Vector {
    fn div_assign(&mut self, divisor: f64) {
        self.scale(1.0 / divisor);
    }
}
