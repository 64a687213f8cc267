//! Fixed-point rotation quaternion.
//!
//! Rotations compose yaw (Z) → pitch (Y) → roll (X) when built from Euler
//! sequences; composition itself is plain Hamilton multiplication.

use serde::{Deserialize, Serialize};

use super::angles;
use super::fixed::Fx;
use super::vector::FxVec3;

/// A deterministic rotation quaternion: scalar part `w` plus vector part `v`.
///
/// Every operation assumes unit quaternions; constructors produce them from
/// normalized axes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FxQuat {
    /// Scalar part.
    pub w: Fx,
    /// Vector part.
    pub v: FxVec3,
}

impl Default for FxQuat {
    fn default() -> Self {
        FxQuat::IDENTITY
    }
}

impl FxQuat {
    /// The identity rotation.
    pub const IDENTITY: FxQuat = FxQuat {
        w: Fx::ONE,
        v: FxVec3::ZERO,
    };

    /// Creates a quaternion from raw parts. Callers are responsible for the
    /// unit-length invariant.
    #[inline]
    #[must_use]
    pub const fn new(w: Fx, v: FxVec3) -> Self {
        FxQuat { w, v }
    }

    /// Builds a rotation of `angle` radians around the (unit) `axis`.
    #[must_use]
    pub fn from_axis_angle_radians(axis: FxVec3, angle: Fx) -> Self {
        let half = angle * Fx::HALF;
        FxQuat {
            w: angles::cos(half),
            v: axis * angles::sin(half),
        }
    }

    /// Builds a rotation of `angle` degrees around the (unit) `axis`.
    #[must_use]
    pub fn from_axis_angle_degrees(axis: FxVec3, angle: Fx) -> Self {
        Self::from_axis_angle_radians(axis, angles::degrees_to_radians(angle))
    }

    /// The inverse rotation. Assumes a unit quaternion, for which the inverse
    /// is the conjugate.
    #[must_use]
    pub fn inverted(self) -> Self {
        FxQuat {
            w: self.w,
            v: -self.v,
        }
    }

    /// Rotates a vector by this quaternion using the expanded sandwich
    /// product (q · p · q⁻¹ simplified for unit q).
    #[must_use]
    pub fn rotate(self, input: FxVec3) -> FxVec3 {
        let v_cross_input = self.v.cross(input);
        input + v_cross_input * (Fx::TWO * self.w) + self.v.cross(v_cross_input) * Fx::TWO
    }

    /// True when every element is within `tolerance` of `other`'s.
    #[must_use]
    pub fn is_near(self, other: FxQuat, tolerance: Fx) -> bool {
        self.w.is_near(other.w, tolerance) && self.v.is_near(other.v, tolerance)
    }
}

impl std::ops::Mul for FxQuat {
    type Output = FxQuat;

    /// Hamilton product: `a * b` applies `b` first, then `a`.
    fn mul(self, rhs: FxQuat) -> FxQuat {
        FxQuat {
            w: self.w * rhs.w - self.v.dot(rhs.v),
            v: rhs.v * self.w + self.v * rhs.w + self.v.cross(rhs.v),
        }
    }
}

impl std::ops::Mul<FxVec3> for FxQuat {
    type Output = FxVec3;

    /// Rotates the vector by this quaternion.
    fn mul(self, rhs: FxVec3) -> FxVec3 {
        self.rotate(rhs)
    }
}

impl std::fmt::Display for FxQuat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.w, self.v)
    }
}

// #########
// # TESTS #
// #########
