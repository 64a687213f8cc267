//! Structured reporting for invariant violations.
//!
//! Programming errors inside the core (out-of-order input writes, snapshot
//! stores for non-adjacent frames, retrievals beyond the stored window) are
//! never panics: the offending operation degrades to a safe no-op and the
//! violation is reported here as structured data. Protocol-level anomalies
//! (stale checksums, duplicate messages) flow through the same pipeline at
//! lower severities.
//!
//! By default violations are logged via `tracing`. Tests and embedding hosts
//! can install a [`CollectingObserver`] to assert on (or export) the exact
//! violations produced.

use parking_lot::Mutex;
use std::sync::Arc;

/// Severity of a reported violation, ordered least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViolationSeverity {
    /// Unexpected but recoverable; the operation continued with a fallback.
    Warning,
    /// Serious issue; the operation was skipped or degraded.
    Error,
    /// An invariant is broken badly enough that session state may be suspect.
    Critical,
}

impl ViolationSeverity {
    /// String form for logging and metrics labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which subsystem reported the violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum ViolationKind {
    /// Per-player input storage invariant (gaps, out-of-order writes,
    /// retrievals beyond the window).
    InputStore,
    /// Snapshot ring invariant (non-adjacent store, retrieval outside the
    /// rollback window).
    SnapshotStore,
    /// Frame bookkeeping in the controller (non-sequential ticks, rollback
    /// targets out of range).
    FrameSync,
    /// Desync checking (stale target frames, duplicate checksums, checksum
    /// mismatch).
    DesyncCheck,
    /// Session configuration problems detected at runtime.
    Configuration,
    /// Wire message that violates the protocol's expectations.
    Protocol,
    /// A bug in the core itself.
    InternalError,
}

impl ViolationKind {
    /// String form for logging and metrics labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InputStore => "input_store",
            Self::SnapshotStore => "snapshot_store",
            Self::FrameSync => "frame_sync",
            Self::DesyncCheck => "desync_check",
            Self::Configuration => "configuration",
            Self::Protocol => "protocol",
            Self::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// How severe the violation is.
    pub severity: ViolationSeverity,
    /// Which subsystem reported it.
    pub kind: ViolationKind,
    /// Human-readable description with the offending values.
    pub message: String,
    /// `file:line` of the report site.
    pub location: &'static str,
}

impl Violation {
    /// Creates a new violation record.
    #[must_use]
    pub fn new(
        severity: ViolationSeverity,
        kind: ViolationKind,
        message: impl Into<String>,
        location: &'static str,
    ) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            location,
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}/{}] {} ({})",
            self.severity, self.kind, self.message, self.location
        )
    }
}

/// Receives violations as they are reported.
pub trait ViolationObserver: Send + Sync {
    /// Called once per reported violation.
    fn on_violation(&self, violation: &Violation);
}

/// Default observer: routes violations to `tracing` at a level matching the
/// severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ViolationObserver for TracingObserver {
    fn on_violation(&self, violation: &Violation) {
        match violation.severity {
            ViolationSeverity::Warning => tracing::warn!(
                kind = violation.kind.as_str(),
                location = violation.location,
                "{}",
                violation.message
            ),
            ViolationSeverity::Error | ViolationSeverity::Critical => tracing::error!(
                kind = violation.kind.as_str(),
                severity = violation.severity.as_str(),
                location = violation.location,
                "{}",
                violation.message
            ),
        }
    }
}

/// Observer that collects violations in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    violations: Mutex<Vec<Violation>>,
}

impl CollectingObserver {
    /// Creates an empty collecting observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all violations collected so far.
    #[must_use]
    pub fn violations(&self) -> Vec<Violation> {
        self.violations.lock().clone()
    }

    /// Number of violations collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.lock().len()
    }

    /// True when nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.lock().is_empty()
    }

    /// Discards all collected violations.
    pub fn clear(&self) {
        self.violations.lock().clear();
    }
}

impl ViolationObserver for CollectingObserver {
    fn on_violation(&self, violation: &Violation) {
        self.violations.lock().push(violation.clone());
    }
}

/// Reports a violation to an optional additional observer (always logging via
/// [`TracingObserver`] first).
pub fn report(violation: &Violation, extra: Option<&Arc<dyn ViolationObserver>>) {
    TracingObserver.on_violation(violation);
    if let Some(observer) = extra {
        observer.on_violation(violation);
    }
}

/// Reports an invariant violation through the default tracing observer.
///
/// Usage mirrors `format!`:
///
/// ```ignore
/// report_violation!(
///     ViolationSeverity::Error,
///     ViolationKind::InputStore,
///     "input for frame {} arrived out of order (expected {})",
///     frame,
///     expected
/// );
/// ```
#[macro_export]
macro_rules! report_violation {
    ($severity:expr, $kind:expr, $msg:literal) => {{
        use $crate::telemetry::ViolationObserver as _;
        let violation = $crate::telemetry::Violation::new(
            $severity,
            $kind,
            $msg,
            concat!(file!(), ":", line!()),
        );
        $crate::telemetry::TracingObserver.on_violation(&violation);
    }};
    ($severity:expr, $kind:expr, $fmt:literal, $($arg:tt)+) => {{
        use $crate::telemetry::ViolationObserver as _;
        let violation = $crate::telemetry::Violation::new(
            $severity,
            $kind,
            format!($fmt, $($arg)+),
            concat!(file!(), ":", line!()),
        );
        $crate::telemetry::TracingObserver.on_violation(&violation);
    }};
}

// #########
// # TESTS #
// #########
