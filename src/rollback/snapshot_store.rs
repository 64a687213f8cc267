//! Ring of gameplay snapshots keyed by frame.
//!
//! Snapshots move by swap, never by clone: the host fills a scratch value,
//! the store swaps it into the ring, and the host's variable receives the
//! displaced old snapshot for reuse. Restore hands out a reference valid
//! until the next store.

use crate::containers::RingBuffer;
use crate::error::{NetcodeError, NetcodeResult};
use crate::report_violation;
use crate::telemetry::{ViolationKind, ViolationSeverity};
use crate::{Frame, MAX_ROLLBACK};

/// Ring capacity: the current frame plus the full rollback window, so the
/// boundary frame `last_processed − MAX_ROLLBACK` stays addressable while
/// the current frame's snapshot is also stored.
pub(crate) const SNAPSHOT_STORE_LEN: usize = MAX_ROLLBACK as usize + 1;

/// Bounded storage for the rollback window's snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotStore<S> {
    ring: RingBuffer<S, SNAPSHOT_STORE_LEN>,
    latest_stored_frame: Frame,
    stored_count: u64,
}

impl<S: Clone + Default> Default for SnapshotStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Default> SnapshotStore<S> {
    /// Creates an empty store expecting frame 0 first.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ring: RingBuffer::new(),
            latest_stored_frame: Frame::PRE_SESSION,
            stored_count: 0,
        }
    }

    /// Wipes for a new session. Old slot contents remain as noise and are
    /// never addressable again.
    pub fn reset(&mut self) {
        self.latest_stored_frame = Frame::PRE_SESSION;
        self.stored_count = 0;
    }

    /// The most recently stored frame; [`Frame::PRE_SESSION`] when empty.
    #[must_use]
    pub fn latest_stored_frame(&self) -> Frame {
        self.latest_stored_frame
    }

    /// Stores `snapshot` for `frame`, swapping the caller's value into the
    /// ring (the displaced old snapshot lands in `snapshot`, ready for
    /// reuse as scratch).
    ///
    /// `frame` must be either `latest + 1` (append) or an in-window earlier
    /// frame (replace, used during rollback re-simulation). Anything else is
    /// a design error: reported, and the store is left untouched.
    pub fn store(&mut self, frame: Frame, snapshot: &mut S) {
        let ahead = frame.delta(self.latest_stored_frame);
        if ahead == 1 {
            self.ring.swap_insert(snapshot);
            self.latest_stored_frame = frame;
            self.stored_count += 1;
            return;
        }
        if ahead <= 0 && self.in_window(frame) {
            self.ring.swap_replace(ahead, snapshot);
            return;
        }
        report_violation!(
            ViolationSeverity::Error,
            ViolationKind::SnapshotStore,
            "snapshot for unexpected frame {} (latest stored frame: {})",
            frame,
            self.latest_stored_frame
        );
    }

    /// The snapshot stored for `frame`.
    ///
    /// # Errors
    ///
    /// [`NetcodeError::SnapshotUnavailable`] when `frame` is ahead of the
    /// newest stored frame or has fallen out of the window.
    pub fn get(&self, frame: Frame) -> NetcodeResult<&S> {
        if !self.in_window(frame) {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::SnapshotStore,
                "snapshot for frame {} not stored (latest stored frame: {})",
                frame,
                self.latest_stored_frame
            );
            return Err(NetcodeError::SnapshotUnavailable {
                frame,
                latest_stored_frame: self.latest_stored_frame,
            });
        }
        Ok(self.ring.get(frame.delta(self.latest_stored_frame)))
    }

    /// True when `frame` is currently addressable.
    fn in_window(&self, frame: Frame) -> bool {
        if self.stored_count == 0 {
            return false;
        }
        let behind = self.latest_stored_frame.delta(frame);
        behind >= 0
            && (behind as u64) < self.stored_count
            && (behind as usize) < SNAPSHOT_STORE_LEN
    }
}

// #########
// # TESTS #
// #########
