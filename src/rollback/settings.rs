//! Session configuration and the stall report.

use crate::containers::FlexArray;
use crate::error::SessionConfigError;
use crate::{Frame, PlayerSpot, MAX_INPUT_DELAY, MAX_PLAYERS, MAX_ROLLBACK};

/// Immutable facts about a session, fixed at start.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Number of simulating players, `1..=MAX_PLAYERS`.
    pub total_players: u8,
    /// The spot controlled on this machine.
    pub local_spot: PlayerSpot,
    /// Whether remote peers participate. A session may have multiple players
    /// without being networked (e.g. replay playback).
    pub is_networked: bool,
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self {
            total_players: 1,
            local_spot: PlayerSpot::Player1,
            is_networked: false,
        }
    }
}

impl SessionInfo {
    /// True when this peer is the session host (spot 1 by convention).
    #[must_use]
    pub fn is_host(&self) -> bool {
        self.local_spot == PlayerSpot::Player1
    }
}

/// Tunable per-session behavior.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RollbackSettings {
    /// Input delay for non-networked play, in frames. Negative values enable
    /// local "negative delay": the simulation runs ahead of the local
    /// player's confirmed inputs and corrects by rollback, trading visual
    /// stability for responsiveness. Local-only; rejected online.
    pub local_input_delay: i32,
    /// Input delay for networked play, in frames. Both peers are assumed to
    /// use the same value.
    pub online_input_delay: u32,
    /// Wait for every remote input each frame instead of predicting
    /// (rollback window effectively zero).
    pub use_lockstep: bool,
    /// Roll back and re-simulate every frame locally to flush out
    /// nondeterminism bugs. Local-only; rejected online.
    pub use_sync_test: bool,
}

impl Default for RollbackSettings {
    fn default() -> Self {
        Self {
            local_input_delay: 3,
            online_input_delay: 3,
            use_lockstep: false,
            use_sync_test: false,
        }
    }
}

impl RollbackSettings {
    /// Validates this configuration against the session facts.
    ///
    /// # Errors
    ///
    /// Returns the first [`SessionConfigError`] found; the controller
    /// refuses to start on any of them.
    pub fn validate(&self, session: &SessionInfo) -> Result<(), SessionConfigError> {
        if !PlayerSpot::is_valid_total(session.total_players) {
            return Err(SessionConfigError::TotalPlayersOutOfRange {
                total_players: session.total_players,
            });
        }
        if !session.local_spot.is_player() {
            return Err(SessionConfigError::LocalSpotIsSpectator);
        }
        if !session.local_spot.is_within_total(session.total_players) {
            return Err(SessionConfigError::LocalSpotOutsideTotalPlayers {
                local_spot: session.local_spot,
                total_players: session.total_players,
            });
        }
        if self.online_input_delay > MAX_INPUT_DELAY {
            return Err(SessionConfigError::OnlineInputDelayTooLarge {
                delay: self.online_input_delay,
            });
        }
        if self.local_input_delay > MAX_INPUT_DELAY as i32 {
            return Err(SessionConfigError::LocalInputDelayTooLarge {
                delay: self.local_input_delay,
            });
        }
        // negative delay corrects through rollback, so its magnitude must
        // leave room inside the rollback window
        if self.local_input_delay < 0 && self.local_input_delay.unsigned_abs() >= MAX_ROLLBACK {
            return Err(SessionConfigError::LocalInputDelayTooLarge {
                delay: self.local_input_delay,
            });
        }
        if session.is_networked && self.local_input_delay < 0 {
            return Err(SessionConfigError::NegativeDelayInNetworkedSession);
        }
        if session.is_networked && self.use_sync_test {
            return Err(SessionConfigError::SyncTestInNetworkedSession);
        }
        Ok(())
    }

    /// The input delay actually applied to the local input stream.
    #[must_use]
    pub fn effective_local_delay(&self, session: &SessionInfo) -> i32 {
        if session.is_networked {
            self.online_input_delay as i32
        } else {
            self.local_input_delay
        }
    }
}

/// Why the current tick did not advance: which players we are waiting on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct StallPlayerInfo {
    /// The player we lack input from.
    pub spot: PlayerSpot,
    /// The newest frame we hold a confirmed input for, if any.
    pub last_frame_received: Option<Frame>,
}

/// Per-stall-tick report handed to the host for UX feedback.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StallInfo {
    /// Every player whose missing inputs block the tick.
    pub waiting_on: FlexArray<StallPlayerInfo, MAX_PLAYERS>,
}

impl StallInfo {
    /// True when at least one player blocks the tick.
    #[must_use]
    pub fn should_stall(&self) -> bool {
        !self.waiting_on.is_empty()
    }
}

// #########
// # TESTS #
// #########
