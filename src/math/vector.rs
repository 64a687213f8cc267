//! Fixed-point three-component vector.
//!
//! Coordinate convention: forward = +X, right = +Y, up = +Z.

use serde::{Deserialize, Serialize};

use super::fixed::Fx;

/// A deterministic 3D vector of [`Fx`] components.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FxVec3 {
    /// Forward axis component.
    pub x: Fx,
    /// Right axis component.
    pub y: Fx,
    /// Up axis component.
    pub z: Fx,
}

impl FxVec3 {
    /// The zero vector.
    pub const ZERO: FxVec3 = FxVec3 {
        x: Fx::ZERO,
        y: Fx::ZERO,
        z: Fx::ZERO,
    };

    /// Creates a vector from components.
    #[inline]
    #[must_use]
    pub const fn new(x: Fx, y: Fx, z: Fx) -> Self {
        FxVec3 { x, y, z }
    }

    /// Unit vector along +X.
    #[must_use]
    pub const fn forward() -> Self {
        FxVec3::new(Fx::ONE, Fx::ZERO, Fx::ZERO)
    }

    /// Unit vector along -X.
    #[must_use]
    pub const fn backward() -> Self {
        FxVec3::new(Fx::NEG_ONE, Fx::ZERO, Fx::ZERO)
    }

    /// Unit vector along +Y.
    #[must_use]
    pub const fn right() -> Self {
        FxVec3::new(Fx::ZERO, Fx::ONE, Fx::ZERO)
    }

    /// Unit vector along -Y.
    #[must_use]
    pub const fn left() -> Self {
        FxVec3::new(Fx::ZERO, Fx::NEG_ONE, Fx::ZERO)
    }

    /// Unit vector along +Z.
    #[must_use]
    pub const fn up() -> Self {
        FxVec3::new(Fx::ZERO, Fx::ZERO, Fx::ONE)
    }

    /// Unit vector along -Z.
    #[must_use]
    pub const fn down() -> Self {
        FxVec3::new(Fx::ZERO, Fx::ZERO, Fx::NEG_ONE)
    }

    /// Squared Euclidean length.
    #[must_use]
    pub fn length_squared(self) -> Fx {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> Fx {
        self.length_squared().sqrt()
    }

    /// Squared distance between two points.
    #[must_use]
    pub fn distance_squared(from: FxVec3, to: FxVec3) -> Fx {
        (to - from).length_squared()
    }

    /// Distance between two points.
    #[must_use]
    pub fn distance(from: FxVec3, to: FxVec3) -> Fx {
        (to - from).length()
    }

    /// Unit direction from `from` toward `to`, zero if coincident.
    #[must_use]
    pub fn direction(from: FxVec3, to: FxVec3) -> FxVec3 {
        (to - from).normalized()
    }

    /// Midpoint of two points.
    #[must_use]
    pub fn midpoint(a: FxVec3, b: FxVec3) -> FxVec3 {
        (a + b) * Fx::HALF
    }

    /// Returns this vector scaled to unit length. The zero vector normalizes
    /// to zero.
    #[must_use]
    pub fn normalized(self) -> FxVec3 {
        let len = self.length();
        if len == Fx::ZERO {
            return FxVec3::ZERO;
        }
        self / len
    }

    /// Normalizes in place. See [`normalized`](Self::normalized).
    pub fn normalize(&mut self) {
        *self = self.normalized();
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: FxVec3) -> Fx {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Right-hand-rule cross product.
    #[must_use]
    pub fn cross(self, other: FxVec3) -> FxVec3 {
        FxVec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// True when all components are exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self == FxVec3::ZERO
    }

    /// True when every component is within `tolerance` of `other`'s.
    #[must_use]
    pub fn is_near(self, other: FxVec3, tolerance: Fx) -> bool {
        self.x.is_near(other.x, tolerance)
            && self.y.is_near(other.y, tolerance)
            && self.z.is_near(other.z, tolerance)
    }

    /// True when this vector has a component opposite to `other` (negative
    /// dot product).
    #[must_use]
    pub fn is_opposite_direction_to(self, other: FxVec3) -> bool {
        self.dot(other) < Fx::ZERO
    }
}

impl std::ops::Add for FxVec3 {
    type Output = FxVec3;

    #[inline]
    fn add(self, rhs: FxVec3) -> FxVec3 {
        FxVec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::AddAssign for FxVec3 {
    #[inline]
    fn add_assign(&mut self, rhs: FxVec3) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for FxVec3 {
    type Output = FxVec3;

    #[inline]
    fn sub(self, rhs: FxVec3) -> FxVec3 {
        FxVec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::SubAssign for FxVec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: FxVec3) {
        *self = *self - rhs;
    }
}

impl std::ops::Neg for FxVec3 {
    type Output = FxVec3;

    #[inline]
    fn neg(self) -> FxVec3 {
        FxVec3::new(-self.x, -self.y, -self.z)
    }
}

impl std::ops::Mul<Fx> for FxVec3 {
    type Output = FxVec3;

    #[inline]
    fn mul(self, scale: Fx) -> FxVec3 {
        FxVec3::new(self.x * scale, self.y * scale, self.z * scale)
    }
}

impl std::ops::Mul<FxVec3> for Fx {
    type Output = FxVec3;

    #[inline]
    fn mul(self, vector: FxVec3) -> FxVec3 {
        vector * self
    }
}

impl std::ops::Div<Fx> for FxVec3 {
    type Output = FxVec3;

    #[inline]
    fn div(self, scale: Fx) -> FxVec3 {
        FxVec3::new(self.x / scale, self.y / scale, self.z / scale)
    }
}

impl std::fmt::Display for FxVec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// #########
// # TESTS #
// #########
