//! Deterministic trigonometry and angle wrapping.
//!
//! All functions here are pure integer computations over [`Fx`] with fixed
//! Q16 polynomial coefficients, so every platform produces identical bits.
//! Accuracy is a few fixed-point ulps (plenty for gameplay) and is traded
//! away deliberately: a bit-stable answer matters more than the last decimal.
//!
//! Angle-wrap convention: [`clamp_axis`] maps into `[0, 360)` degrees,
//! [`normalize_axis`] into `(-180, 180]`. Together with [`Fx::fmod`] these are
//! the only primitives the rest of the system uses for angle wrap.

use super::fixed::Fx;

// Q16 Taylor coefficients for sin on [-π/2, π/2]: 1/6, 1/120, 1/5040.
const SIN_C3: Fx = Fx::from_raw(10_923);
const SIN_C5: Fx = Fx::from_raw(546);
const SIN_C7: Fx = Fx::from_raw(13);

// Q16 Hastings coefficients for atan on [-1, 1].
const ATAN_C1: Fx = Fx::from_raw(65_527); // 0.9998660
const ATAN_C3: Fx = Fx::from_raw(-21_648); // -0.3302995
const ATAN_C5: Fx = Fx::from_raw(11_806); // 0.1801410
const ATAN_C7: Fx = Fx::from_raw(-5_580); // -0.0851330
const ATAN_C9: Fx = Fx::from_raw(1_366); // 0.0208351

const DEG_180: Fx = Fx::from_int(180);
const DEG_360: Fx = Fx::from_int(360);

/// Converts degrees to radians.
#[must_use]
pub fn degrees_to_radians(degrees: Fx) -> Fx {
    degrees * Fx::PI / DEG_180
}

/// Converts radians to degrees.
#[must_use]
pub fn radians_to_degrees(radians: Fx) -> Fx {
    radians * DEG_180 / Fx::PI
}

/// Reduces an angle in radians into roughly `(-π, π]`.
fn reduce_to_pi(angle: Fx) -> Fx {
    let mut reduced = angle.fmod(Fx::TWO_PI);
    if reduced > Fx::PI {
        reduced -= Fx::TWO_PI;
    } else if reduced < -Fx::PI {
        reduced += Fx::TWO_PI;
    }
    reduced
}

/// Odd polynomial for sin on `[-π/2, π/2]`.
fn sin_poly(x: Fx) -> Fx {
    let x2 = x * x;
    let x3 = x2 * x;
    let x5 = x3 * x2;
    let x7 = x5 * x2;
    x - x3 * SIN_C3 + x5 * SIN_C5 - x7 * SIN_C7
}

/// Sine of an angle in radians.
#[must_use]
pub fn sin(angle: Fx) -> Fx {
    let reduced = reduce_to_pi(angle);
    // fold the outer quadrants onto [-π/2, π/2]
    let folded = if reduced > Fx::HALF_PI {
        Fx::PI - reduced
    } else if reduced < -Fx::HALF_PI {
        -Fx::PI - reduced
    } else {
        reduced
    };
    sin_poly(folded)
}

/// Cosine of an angle in radians.
#[must_use]
pub fn cos(angle: Fx) -> Fx {
    sin(angle + Fx::HALF_PI)
}

/// Tangent of an angle in radians. Unguarded near odd multiples of π/2 where
/// the cosine reaches zero.
#[must_use]
pub fn tan(angle: Fx) -> Fx {
    sin(angle) / cos(angle)
}

/// Sine of an angle in degrees.
#[must_use]
pub fn sin_deg(angle: Fx) -> Fx {
    sin(degrees_to_radians(angle))
}

/// Cosine of an angle in degrees.
#[must_use]
pub fn cos_deg(angle: Fx) -> Fx {
    cos(degrees_to_radians(angle))
}

/// Tangent of an angle in degrees.
#[must_use]
pub fn tan_deg(angle: Fx) -> Fx {
    tan(degrees_to_radians(angle))
}

/// Polynomial atan on `[-1, 1]`.
fn atan_poly(z: Fx) -> Fx {
    let z2 = z * z;
    let mut acc = ATAN_C9;
    acc = acc * z2 + ATAN_C7;
    acc = acc * z2 + ATAN_C5;
    acc = acc * z2 + ATAN_C3;
    acc = acc * z2 + ATAN_C1;
    acc * z
}

/// Four-quadrant arctangent of `y / x`, in radians.
///
/// `atan2(0, 0)` is defined as zero.
#[must_use]
pub fn atan2(y: Fx, x: Fx) -> Fx {
    if x == Fx::ZERO && y == Fx::ZERO {
        return Fx::ZERO;
    }
    if y.abs() > x.abs() {
        // |y/x| would exceed 1; use the complementary identity instead
        let base = atan_poly(x / y);
        if y > Fx::ZERO {
            Fx::HALF_PI - base
        } else {
            -Fx::HALF_PI - base
        }
    } else {
        let base = atan_poly(y / x);
        if x < Fx::ZERO {
            if y >= Fx::ZERO {
                base + Fx::PI
            } else {
                base - Fx::PI
            }
        } else {
            base
        }
    }
}

/// Four-quadrant arctangent of `y / x`, in degrees.
#[must_use]
pub fn atan2_deg(y: Fx, x: Fx) -> Fx {
    radians_to_degrees(atan2(y, x))
}

/// Arcsine in radians. Input is clamped into `[-1, 1]`.
#[must_use]
pub fn asin(value: Fx) -> Fx {
    let v = value.clamp(Fx::NEG_ONE, Fx::ONE);
    atan2(v, (Fx::ONE - v * v).sqrt())
}

/// Arcsine in degrees. Input is clamped into `[-1, 1]`.
#[must_use]
pub fn asin_deg(value: Fx) -> Fx {
    radians_to_degrees(asin(value))
}

/// Arccosine in radians. Input is clamped into `[-1, 1]`.
#[must_use]
pub fn acos(value: Fx) -> Fx {
    let v = value.clamp(Fx::NEG_ONE, Fx::ONE);
    atan2((Fx::ONE - v * v).sqrt(), v)
}

/// Arccosine in degrees. Input is clamped into `[-1, 1]`.
#[must_use]
pub fn acos_deg(value: Fx) -> Fx {
    radians_to_degrees(acos(value))
}

/// Maps an angle in degrees into `[0, 360)`.
#[must_use]
pub fn clamp_axis(angle: Fx) -> Fx {
    let mut wrapped = angle.fmod(DEG_360); // (-360, 360)
    if wrapped < Fx::ZERO {
        wrapped += DEG_360;
    }
    wrapped
}

/// Maps an angle in degrees into `(-180, 180]`.
#[must_use]
pub fn normalize_axis(angle: Fx) -> Fx {
    let mut wrapped = clamp_axis(angle);
    if wrapped > DEG_180 {
        wrapped -= DEG_360;
    }
    wrapped
}

/// Clamps an angle in degrees to the shortest arc between `min_angle` and
/// `max_angle`, all expressed in degrees.
#[must_use]
pub fn clamp_angle(angle: Fx, min_angle: Fx, max_angle: Fx) -> Fx {
    let max_delta = clamp_axis(max_angle - min_angle) * Fx::HALF; // 0..180
    let range_center = clamp_axis(min_angle + max_delta); // 0..360
    let delta_from_center = normalize_axis(angle - range_center); // -180..180

    if delta_from_center > max_delta {
        return normalize_axis(range_center + max_delta);
    }
    if delta_from_center < -max_delta {
        return normalize_axis(range_center - max_delta);
    }
    normalize_axis(angle)
}

// #########
// # TESTS #
// #########
