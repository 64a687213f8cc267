//! Peer checksum comparison for desync detection.
//!
//! Checksums are only computed for *verified* frames (frames leaving the
//! rollback window, whose state can no longer change), and checks are
//! infrequent enough that one in-flight comparison at a time suffices. All
//! peers broadcast their checksums (so moving to all-pairs comparison later
//! needs no wire change), but only non-hosts compare, each against the
//! session host.

use crate::report_violation;
use crate::telemetry::{ViolationKind, ViolationSeverity};
use crate::Frame;

/// One in-flight checksum comparison.
#[derive(Debug, Clone, Default)]
pub struct DesyncChecker {
    target_frame: Option<Frame>,
    local_checksum: Option<u32>,
    remote_host_checksum: Option<u32>,
    checked: bool,
}

impl DesyncChecker {
    /// Creates a checker with no comparison in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wipes for a new session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The frame currently being compared, if any.
    #[must_use]
    pub fn target_frame(&self) -> Option<Frame> {
        self.target_frame
    }

    /// Records our own checksum for `frame`.
    pub fn provide_local_checksum(&mut self, frame: Frame, checksum: u32) {
        self.rotate_to(frame);
        if self.local_checksum.is_some() {
            report_violation!(
                ViolationSeverity::Warning,
                ViolationKind::DesyncCheck,
                "duplicate local checksum for frame {}",
                frame
            );
            return;
        }
        self.local_checksum = Some(checksum);
    }

    /// Records the host's checksum for `frame`. Either side may arrive
    /// first.
    pub fn provide_remote_host_checksum(&mut self, frame: Frame, checksum: u32) {
        self.rotate_to(frame);
        if self.remote_host_checksum.is_some() {
            report_violation!(
                ViolationSeverity::Warning,
                ViolationKind::DesyncCheck,
                "duplicate remote host checksum for frame {}",
                frame
            );
            return;
        }
        self.remote_host_checksum = Some(checksum);
    }

    /// True when both checksums for the target frame are present.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.local_checksum.is_some() && self.remote_host_checksum.is_some()
    }

    /// Compares the two checksums and marks the check consumed. True when
    /// the peers have diverged.
    ///
    /// Calling before [`is_ready`](Self::is_ready) is a design error:
    /// reported, and `false` (no desync claim) is returned.
    pub fn did_desync_occur(&mut self) -> bool {
        let (Some(local), Some(remote)) = (self.local_checksum, self.remote_host_checksum) else {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::DesyncCheck,
                "desync check consumed before both checksums arrived"
            );
            return false;
        };
        self.checked = true;
        local != remote
    }

    /// The two checksums of the in-flight comparison, when both present.
    #[must_use]
    pub fn checksums(&self) -> Option<(u32, u32)> {
        Some((self.local_checksum?, self.remote_host_checksum?))
    }

    /// Starts a fresh comparison when `frame` differs from the current
    /// target, diagnosing abandoned or regressing checks.
    fn rotate_to(&mut self, frame: Frame) {
        match self.target_frame {
            Some(current) if current == frame => return,
            Some(current) => {
                if frame.delta(current) < 0 {
                    report_violation!(
                        ViolationSeverity::Warning,
                        ViolationKind::DesyncCheck,
                        "checksum target regressed from frame {} to {}",
                        current,
                        frame
                    );
                }
                if !self.checked && self.is_ready() {
                    report_violation!(
                        ViolationSeverity::Warning,
                        ViolationKind::DesyncCheck,
                        "abandoning unconsumed desync check for frame {}",
                        current
                    );
                }
            },
            None => {},
        }
        *self = Self {
            target_frame: Some(frame),
            ..Self::default()
        };
    }
}

// #########
// # TESTS #
// #########
