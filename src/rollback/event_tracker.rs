//! Event-driven effect tracking across the rollback window.
//!
//! When a rollback cancels a timeline, the renderer has a problem: effects
//! it already played may still exist in the corrected timeline (don't play
//! them again), and effects it never saw may have spawned there (reconstruct
//! them mid-life). This tracker remembers, per frame, which effects are
//! *new* and which are *continuing* from an earlier spawn, over a window
//! wide enough that no rollback can reach past it.
//!
//! Layout is a ring of `2·MAX_ROLLBACK + 1` per-frame slots addressed by
//! offset from the present: 0 = now, negative = past, positive = reserved
//! future. Registering an effect writes its continuation into the future
//! slots up front, so "is this effect still alive at the present frame?" is
//! a constant-time lookup even right after a rollback.

use crate::containers::{FlexArray, RingBuffer};
use crate::report_violation;
use crate::telemetry::{ViolationKind, ViolationSeverity};
use crate::MAX_ROLLBACK;

/// Slots tracked: the present frame plus a full rollback window of past and
/// of reserved future.
pub(crate) const EVENT_WINDOW_LEN: usize = 2 * MAX_ROLLBACK as usize + 1;

/// Expected maximum event-driven effects spawned in any single frame.
pub const MAX_NEW_EFFECTS_PER_FRAME: usize = 25;

/// Expected maximum effects alive across a frame from earlier spawns.
pub const MAX_CONTINUING_EFFECTS_PER_FRAME: usize = 50;

/// The effect lists for one frame.
#[derive(Debug, Clone)]
pub struct EffectsForFrame<E> {
    /// Effects spawning in this frame: the renderer should trigger these
    /// when the frame first renders.
    pub new_events: FlexArray<E, MAX_NEW_EFFECTS_PER_FRAME>,
    /// Effects spawned in an earlier frame and still alive here: after a
    /// rollback these tell the renderer what should already be playing.
    pub past_continuing_events: FlexArray<E, MAX_CONTINUING_EFFECTS_PER_FRAME>,
}

impl<E: Default> Default for EffectsForFrame<E> {
    fn default() -> Self {
        Self {
            new_events: FlexArray::new(),
            past_continuing_events: FlexArray::new(),
        }
    }
}

impl<E> EffectsForFrame<E> {
    /// Empties both lists (slot reuse when the window slides).
    pub fn clear(&mut self) {
        self.new_events.clear();
        self.past_continuing_events.clear();
    }

    /// True when no effects touch this frame.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_events.is_empty() && self.past_continuing_events.is_empty()
    }
}

/// Sliding-window tracker of event-driven effects, generic over the host's
/// effect record (an identifier, typically with a pose attached).
#[derive(Debug, Clone)]
pub struct EventTracker<E> {
    window: RingBuffer<EffectsForFrame<E>, EVENT_WINDOW_LEN>,
}

impl<E: Copy + Default + PartialEq> Default for EventTracker<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Copy + Default + PartialEq> EventTracker<E> {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            window: RingBuffer::new(),
        }
    }

    /// Wipes every slot for a new session.
    pub fn reset(&mut self) {
        for offset in 0..EVENT_WINDOW_LEN as i32 {
            self.window.get_mut(offset).clear();
        }
    }

    /// Slides the present forward one frame. The slot rotating in from the
    /// far past becomes the farthest reserved-future slot and is cleared.
    pub fn increment_frame(&mut self) {
        self.window.increment_head();
        self.window.get_mut(MAX_ROLLBACK as i32).clear();
    }

    /// Registers an effect spawning at the present frame, alive for
    /// `lifetime` frames.
    ///
    /// The continuation is only written as far as the reserved-future window
    /// reaches: beyond that, no rollback can revisit the frames, so nothing
    /// needs remembering.
    pub fn add_new_effect(&mut self, event: E, lifetime: u32) {
        self.add_effect_at(0, event, lifetime);
    }

    /// Registers an effect spawning at `offset` frames relative to the
    /// present (0 = now, negative = past). Re-simulation uses negative
    /// offsets to re-register effects at the frame they belong to;
    /// registration is idempotent, so re-registering an effect the canceled
    /// timeline already recorded changes nothing.
    pub fn add_effect_at(&mut self, offset: i32, event: E, lifetime: u32) {
        if offset > 0 || offset < -(MAX_ROLLBACK as i32) {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::FrameSync,
                "effect registered at offset {} outside [-{}, 0]",
                offset,
                MAX_ROLLBACK
            );
            return;
        }

        let spawn_slot = self.window.get_mut(offset);
        if !spawn_slot.new_events.contains(&event) && !spawn_slot.new_events.push(event) {
            report_violation!(
                ViolationSeverity::Warning,
                ViolationKind::FrameSync,
                "new-effect list full at offset {}",
                offset
            );
        }

        // continuations: frames offset+1 .. offset+lifetime-1, clamped to
        // the reserved-future edge
        let mut ahead = 1_i64;
        while ahead < i64::from(lifetime) && offset as i64 + ahead <= i64::from(MAX_ROLLBACK) {
            let slot = self.window.get_mut((offset as i64 + ahead) as i32);
            if !slot.past_continuing_events.contains(&event)
                && !slot.past_continuing_events.push(event)
            {
                report_violation!(
                    ViolationSeverity::Warning,
                    ViolationKind::FrameSync,
                    "continuing-effect list full at offset {}",
                    offset as i64 + ahead
                );
            }
            ahead += 1;
        }
    }

    /// The effect lists for the present frame.
    #[must_use]
    pub fn current_frame_events(&self) -> &EffectsForFrame<E> {
        self.window.get(0)
    }

    /// The effect lists at `offset` frames relative to the present.
    #[must_use]
    pub fn events_at(&self, offset: i32) -> &EffectsForFrame<E> {
        self.window.get(offset)
    }
}

// #########
// # TESTS #
// #########
