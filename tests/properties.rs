//! Property tests for the storage and numeric substrates.

use proptest::prelude::*;

use rampart::containers::{FlexArray, RingBuffer};
use rampart::math::{angles, Fx};
use rampart::Frame;

// Keep magnitudes small enough that degree arithmetic stays far from the
// wrapping edge of the Q47.16 representation.
const AXIS_RAW_LIMIT: i64 = 1 << 40;

proptest! {
    // ==========================================
    // Angle wrapping
    // ==========================================

    #[test]
    fn clamp_axis_lands_in_0_360(raw in -AXIS_RAW_LIMIT..AXIS_RAW_LIMIT) {
        let wrapped = angles::clamp_axis(Fx::from_raw(raw));
        prop_assert!(wrapped >= Fx::ZERO);
        prop_assert!(wrapped < Fx::from_int(360));
    }

    #[test]
    fn clamp_axis_is_idempotent(raw in -AXIS_RAW_LIMIT..AXIS_RAW_LIMIT) {
        let once = angles::clamp_axis(Fx::from_raw(raw));
        prop_assert_eq!(angles::clamp_axis(once), once);
    }

    #[test]
    fn normalize_axis_lands_in_half_open_range(raw in -AXIS_RAW_LIMIT..AXIS_RAW_LIMIT) {
        let wrapped = angles::normalize_axis(Fx::from_raw(raw));
        prop_assert!(wrapped > Fx::from_int(-180));
        prop_assert!(wrapped <= Fx::from_int(180));
    }

    #[test]
    fn normalize_axis_is_idempotent(raw in -AXIS_RAW_LIMIT..AXIS_RAW_LIMIT) {
        let once = angles::normalize_axis(Fx::from_raw(raw));
        prop_assert_eq!(angles::normalize_axis(once), once);
    }

    // ==========================================
    // Fixed-point algebra
    // ==========================================

    #[test]
    fn addition_is_commutative(a in -AXIS_RAW_LIMIT..AXIS_RAW_LIMIT,
                               b in -AXIS_RAW_LIMIT..AXIS_RAW_LIMIT) {
        let x = Fx::from_raw(a);
        let y = Fx::from_raw(b);
        prop_assert_eq!(x + y, y + x);
    }

    #[test]
    fn multiplication_by_one_is_identity(raw in -AXIS_RAW_LIMIT..AXIS_RAW_LIMIT) {
        let x = Fx::from_raw(raw);
        prop_assert_eq!(x * Fx::ONE, x);
        prop_assert_eq!(x / Fx::ONE, x);
    }

    #[test]
    fn sqrt_square_is_close(raw in 0_i64..(1 << 30)) {
        // sqrt truncates, so squaring it never overshoots and undershoots by
        // at most ~2·root ulps of the widened representation
        let x = Fx::from_raw(raw);
        let root = x.sqrt();
        let squared = root * root;
        prop_assert!(squared <= x);
        let undershoot = x.raw() - squared.raw();
        prop_assert!(undershoot <= (root.raw() >> 15) + 2);
    }

    #[test]
    fn fmod_result_is_smaller_than_divisor(
        a in -AXIS_RAW_LIMIT..AXIS_RAW_LIMIT,
        b in 1_i64..AXIS_RAW_LIMIT,
    ) {
        let remainder = Fx::from_raw(a).fmod(Fx::from_raw(b));
        prop_assert!(remainder.abs() < Fx::from_raw(b));
    }

    // ==========================================
    // Frame recency
    // ==========================================

    #[test]
    fn frame_delta_matches_offset(start in any::<u32>(), shift in -100_000_i32..100_000) {
        let base = Frame::new(start);
        let moved = base.offset(shift);
        prop_assert_eq!(moved.delta(base), shift);
        prop_assert_eq!(base.delta(moved), -shift);
    }

    #[test]
    fn frame_next_previous_round_trip(start in any::<u32>()) {
        let frame = Frame::new(start);
        prop_assert_eq!(frame.next().previous(), frame);
        prop_assert_eq!(frame.previous().next(), frame);
    }

    // ==========================================
    // Containers
    // ==========================================

    #[test]
    fn ring_push_then_get_zero(values in proptest::collection::vec(any::<u32>(), 1..64)) {
        let mut ring: RingBuffer<u32, 8> = RingBuffer::new();
        for &value in &values {
            ring.push(value);
            prop_assert_eq!(*ring.get(0), value);
        }
        // the most recent writes are retrievable in order
        let kept = values.len().min(8);
        for (back, &value) in values.iter().rev().take(kept).enumerate() {
            prop_assert_eq!(*ring.get(-(back as i32)), value);
        }
    }

    #[test]
    fn flex_array_tracks_multiset_under_swap_remove(
        values in proptest::collection::vec(0_u32..1000, 0..16),
        removals in proptest::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let mut array: FlexArray<u32, 16> = FlexArray::new();
        let mut model: Vec<u32> = Vec::new();
        for &value in &values {
            prop_assert!(array.push(value));
            model.push(value);
        }
        for removal in removals {
            if model.is_empty() {
                break;
            }
            let index = removal.index(model.len());
            prop_assert!(array.swap_remove(index));
            model.swap_remove(index);
        }
        prop_assert_eq!(array.len(), model.len());
        let mut from_array: Vec<u32> = array.iter().copied().collect();
        let mut from_model = model;
        from_array.sort_unstable();
        from_model.sort_unstable();
        prop_assert_eq!(from_array, from_model);
    }
}
