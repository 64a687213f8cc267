//! Error types for the rollback core.
//!
//! Errors are structured: variants carry the offending numeric values so
//! construction never allocates on hot paths and callers can match on the
//! specific failure. Messages are formatted lazily in `Display`.
//!
//! Severity tiers (see the module docs on [`crate::telemetry`]):
//!
//! - programming errors are reported as violations and degrade to no-ops, not
//!   errors;
//! - protocol errors surface as `Err` values from the message-ingestion
//!   entry points; session termination is the host's decision;
//! - transient network conditions are not errors at all; they drive the
//!   stall outcome of `advance`.

use std::error::Error;
use std::fmt;
use std::fmt::Display;

use crate::{Frame, PlayerSpot};

/// Why a session configuration was rejected at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SessionConfigError {
    /// `total_players` must be in `1..=MAX_PLAYERS`.
    TotalPlayersOutOfRange {
        /// The rejected player count.
        total_players: u8,
    },
    /// The local spot must identify one of the session's players.
    LocalSpotOutsideTotalPlayers {
        /// The rejected local spot.
        local_spot: PlayerSpot,
        /// Total players in the session.
        total_players: u8,
    },
    /// A spectator cannot be the local simulating participant.
    LocalSpotIsSpectator,
    /// The online input delay exceeds the compile-time maximum.
    OnlineInputDelayTooLarge {
        /// The rejected delay.
        delay: u32,
    },
    /// The local input delay magnitude exceeds the compile-time maximum.
    LocalInputDelayTooLarge {
        /// The rejected delay.
        delay: i32,
    },
    /// Negative local input delay is a local-feel feature; it is not
    /// supported in networked sessions.
    NegativeDelayInNetworkedSession,
    /// Sync-test mode re-simulates every frame locally; it is not supported
    /// in networked sessions.
    SyncTestInNetworkedSession,
}

impl Display for SessionConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TotalPlayersOutOfRange { total_players } => {
                write!(
                    f,
                    "total player count {} out of range 1..={}",
                    total_players,
                    crate::MAX_PLAYERS
                )
            },
            Self::LocalSpotOutsideTotalPlayers {
                local_spot,
                total_players,
            } => {
                write!(
                    f,
                    "local spot {} outside session of {} players",
                    local_spot, total_players
                )
            },
            Self::LocalSpotIsSpectator => {
                write!(f, "local spot may not be the spectator spot")
            },
            Self::OnlineInputDelayTooLarge { delay } => {
                write!(
                    f,
                    "online input delay {} exceeds maximum {}",
                    delay,
                    crate::MAX_INPUT_DELAY
                )
            },
            Self::LocalInputDelayTooLarge { delay } => {
                write!(f, "local input delay {} outside the supported range", delay)
            },
            Self::NegativeDelayInNetworkedSession => {
                write!(f, "negative local input delay is not supported online")
            },
            Self::SyncTestInNetworkedSession => {
                write!(f, "sync-test mode is not supported online")
            },
        }
    }
}

/// Errors reported by the rollback core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum NetcodeError {
    /// The session configuration failed validation; the controller remains
    /// uninitialized.
    InvalidSessionConfig {
        /// What was wrong.
        reason: SessionConfigError,
    },
    /// `start_session` was called while a session is already active.
    SessionAlreadyStarted,
    /// An operation that requires an active session was called without one.
    SessionNotStarted,
    /// A peer sent input for a frame at or below our confirmation horizon;
    /// it has fallen farther behind than the rollback window can absorb.
    PeerTooFarBehind {
        /// The spot the input claimed to be for.
        spot: PlayerSpot,
        /// The frame carried by the message.
        update_frame: Frame,
        /// Our confirmation horizon (inputs at or below are immutable).
        confirmed_frame: Frame,
    },
    /// A peer's input update is so far ahead of what we have stored that its
    /// redundant history cannot seam with our confirmed suffix.
    PeerTooFarAhead {
        /// The spot the input claimed to be for.
        spot: PlayerSpot,
        /// The frame carried by the message.
        update_frame: Frame,
        /// The newest frame we have stored for that spot.
        last_stored_frame: Frame,
    },
    /// A frame reached the confirmation boundary without a confirmed input
    /// from every player. The session has lost an input and must end.
    ConfirmedInputMissing {
        /// The frame that should have been fully confirmed.
        frame: Frame,
    },
    /// A snapshot needed for rollback is not stored (outside the window or
    /// ahead of the newest stored frame).
    SnapshotUnavailable {
        /// The requested frame.
        frame: Frame,
        /// The newest stored frame.
        latest_stored_frame: Frame,
    },
    /// A rollback target outside the permitted window was requested.
    RollbackOutOfRange {
        /// The requested rollback target.
        target_frame: Frame,
        /// The last processed frame.
        last_processed_frame: Frame,
    },
}

impl Display for NetcodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSessionConfig { reason } => {
                write!(f, "invalid session configuration: {}", reason)
            },
            Self::SessionAlreadyStarted => {
                write!(f, "session already started; call end_session first")
            },
            Self::SessionNotStarted => write!(f, "no active session"),
            Self::PeerTooFarBehind {
                spot,
                update_frame,
                confirmed_frame,
            } => {
                write!(
                    f,
                    "peer too far behind: spot {} sent input for frame {} at or below confirmation horizon {}",
                    spot, update_frame, confirmed_frame
                )
            },
            Self::PeerTooFarAhead {
                spot,
                update_frame,
                last_stored_frame,
            } => {
                write!(
                    f,
                    "peer too far ahead: spot {} sent update frame {} whose history cannot seam with last stored frame {}",
                    spot, update_frame, last_stored_frame
                )
            },
            Self::ConfirmedInputMissing { frame } => {
                write!(
                    f,
                    "frame {} left the rollback window without confirmed input from every player",
                    frame
                )
            },
            Self::SnapshotUnavailable {
                frame,
                latest_stored_frame,
            } => {
                write!(
                    f,
                    "no snapshot stored for frame {} (latest stored frame: {})",
                    frame, latest_stored_frame
                )
            },
            Self::RollbackOutOfRange {
                target_frame,
                last_processed_frame,
            } => {
                write!(
                    f,
                    "rollback target {} outside window ending at {}",
                    target_frame, last_processed_frame
                )
            },
        }
    }
}

impl Error for NetcodeError {}

impl From<SessionConfigError> for NetcodeError {
    fn from(reason: SessionConfigError) -> Self {
        NetcodeError::InvalidSessionConfig { reason }
    }
}

/// Result alias for fallible core operations.
pub type NetcodeResult<T> = Result<T, NetcodeError>;

// #########
// # TESTS #
// #########
