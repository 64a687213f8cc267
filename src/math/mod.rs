//! Deterministic fixed-point math: the numeric substrate bit-exact
//! cross-machine simulation depends on.
//!
//! Everything simulation-visible is built from [`Fx`]; [`FxVec3`] and
//! [`FxQuat`] compose it into poses, and [`angles`] supplies deterministic
//! trigonometry and the angle-wrap primitives.

pub mod angles;
pub mod fixed;
pub mod quat;
pub mod vector;

pub use fixed::{Fx, FRACTIONAL_BITS};
pub use quat::FxQuat;
pub use vector::FxVec3;
