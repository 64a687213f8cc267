//! Aggregates per-player input stores for all spots in a session.

use crate::input::{CharacterInput, InputHistoryArray, PlayerInputsForFrame};
use crate::report_violation;
use crate::telemetry::{ViolationKind, ViolationSeverity};
use crate::{Frame, PlayerSpot, MAX_PLAYERS};

use super::per_player_inputs::{InputKind, PerPlayerInputs};
use super::settings::{StallInfo, StallPlayerInfo};

/// Input storage and retrieval for every player in the session.
///
/// One [`PerPlayerInputs`] per active spot keeps the per-player logic simple;
/// this type only routes by spot and answers the aggregate window queries the
/// controller needs.
#[derive(Debug, Clone)]
pub struct InputManager {
    stores: [PerPlayerInputs; MAX_PLAYERS],
    total_players: u8,
    initialized: bool,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    /// Creates an uninitialized manager; call
    /// [`setup_for_session`](Self::setup_for_session) before use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stores: std::array::from_fn(|_| PerPlayerInputs::new()),
            total_players: 0,
            initialized: false,
        }
    }

    /// Wipes all stores and fixes the player count for a session.
    ///
    /// Returns `false` (leaving the manager uninitialized) when
    /// `total_players` is out of range; the controller validates earlier, so
    /// a failure here is a bug upstream.
    pub fn setup_for_session(&mut self, total_players: u8) -> bool {
        self.initialized = false;
        if !PlayerSpot::is_valid_total(total_players) {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::Configuration,
                "input manager setup with invalid player count {}",
                total_players
            );
            return false;
        }
        for store in &mut self.stores {
            store.reset();
        }
        self.total_players = total_players;
        self.initialized = true;
        true
    }

    /// Number of players configured for the session.
    #[must_use]
    pub fn total_players(&self) -> u8 {
        self.total_players
    }

    fn store_index(&self, spot: PlayerSpot) -> Option<usize> {
        if !self.initialized {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::InputStore,
                "input manager used before session setup"
            );
            return None;
        }
        match spot.index() {
            Some(index) if index < usize::from(self.total_players) => Some(index),
            _ => {
                report_violation!(
                    ViolationSeverity::Error,
                    ViolationKind::InputStore,
                    "spot {} outside session of {} players",
                    spot,
                    self.total_players
                );
                None
            },
        }
    }

    /// Stores a confirmed input for one spot. See
    /// [`PerPlayerInputs::add_input`] for the sequencing contract.
    pub fn add_input(&mut self, frame: Frame, spot: PlayerSpot, input: CharacterInput) {
        if let Some(index) = self.store_index(spot) {
            self.stores[index].add_input(frame, input);
        }
    }

    /// Prefills a spot's store with neutral inputs (input-delay setup).
    pub fn prefill(&mut self, spot: PlayerSpot, count: u32) {
        if let Some(index) = self.store_index(spot) {
            self.stores[index].prefill(count);
        }
    }

    /// Retrieves one spot's input for a frame (confirmed or predicted).
    pub fn input_for_frame(&mut self, frame: Frame, spot: PlayerSpot) -> (CharacterInput, InputKind) {
        match self.store_index(spot) {
            Some(index) => self.stores[index].input_for_frame(frame),
            None => (CharacterInput::default(), InputKind::Predicted),
        }
    }

    /// The spot-ordered input set to simulate `frame` with; missing inputs
    /// are filled with predictions.
    pub fn inputs_for_frame(&mut self, frame: Frame) -> PlayerInputsForFrame {
        let mut inputs = PlayerInputsForFrame::new();
        for index in 0..usize::from(self.total_players) {
            let (input, _kind) = self.stores[index].input_for_frame(frame);
            inputs.push(input);
        }
        inputs
    }

    /// The newest confirmed frame for a spot, `None` before any input.
    #[must_use]
    pub fn last_stored_frame(&self, spot: PlayerSpot) -> Option<Frame> {
        spot.index()
            .filter(|&index| index < usize::from(self.total_players))
            .and_then(|index| self.stores[index].last_stored_frame())
    }

    /// True when `frame` is stored for `spot`.
    #[must_use]
    pub fn has_confirmed(&self, frame: Frame, spot: PlayerSpot) -> bool {
        spot.index()
            .filter(|&index| index < usize::from(self.total_players))
            .is_some_and(|index| self.stores[index].has_confirmed(frame))
    }

    /// The redundant broadcast window for a spot.
    #[must_use]
    pub fn history(&self, spot: PlayerSpot) -> Option<(Frame, InputHistoryArray)> {
        spot.index()
            .filter(|&index| index < usize::from(self.total_players))
            .and_then(|index| self.stores[index].history())
    }

    /// True when any player's inputs are so far behind that `frame` is
    /// beyond even their prediction window. Populates `stall` with every
    /// blocking player for host UX.
    pub fn is_any_player_outside_get_range(&self, frame: Frame, stall: &mut StallInfo) -> bool {
        let mut any = false;
        for index in 0..usize::from(self.total_players) {
            let store = &self.stores[index];
            if store.is_frame_outside_get_range(frame) {
                any = true;
                stall.waiting_on.push(StallPlayerInfo {
                    // index came from the 0..total range, always a player
                    spot: PlayerSpot::from_index(index).unwrap_or_default(),
                    last_frame_received: store.last_stored_frame(),
                });
            }
        }
        any
    }

    /// True when any player has never stored a confirmed input for `frame`.
    /// Used as the invariant check when a frame is about to leave the
    /// rollback window: at that point every input must be known.
    #[must_use]
    pub fn does_any_player_lack_input_for_frame(&self, frame: Frame) -> bool {
        (0..usize::from(self.total_players)).any(|index| {
            // stored frames form a contiguous suffix, so "ever stored" is
            // exactly "not newer than the newest stored frame"
            match self.stores[index].last_stored_frame() {
                Some(last) => frame.delta(last) > 0,
                None => true,
            }
        })
    }

    /// Earliest frame across all players whose confirmed input contradicted
    /// the prediction it was simulated with.
    #[must_use]
    pub fn first_incorrect_frame(&self) -> Option<Frame> {
        let mut earliest: Option<Frame> = None;
        for index in 0..usize::from(self.total_players) {
            if let Some(incorrect) = self.stores[index].first_incorrect_frame() {
                earliest = Some(match earliest {
                    Some(current) if incorrect.delta(current) >= 0 => current,
                    _ => incorrect,
                });
            }
        }
        earliest
    }

    /// Clears prediction bookkeeping on every store (rollback start).
    pub fn reset_predictions(&mut self) {
        for store in &mut self.stores {
            store.reset_prediction();
        }
    }
}

// #########
// # TESTS #
// #########

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod input_manager_tests {
    use super::*;
    use crate::math::Fx;

    fn input_with_axis(axis: i32) -> CharacterInput {
        let mut input = CharacterInput::default();
        input.move_forward = Fx::from_int(axis);
        input
    }

    fn two_player_manager() -> InputManager {
        let mut manager = InputManager::new();
        assert!(manager.setup_for_session(2));
        manager
    }

    #[test]
    fn setup_rejects_bad_player_counts() {
        let mut manager = InputManager::new();
        assert!(!manager.setup_for_session(0));
        assert!(!manager.setup_for_session(5));
        assert!(manager.setup_for_session(4));
    }

    #[test]
    fn inputs_for_frame_is_spot_ordered() {
        let mut manager = two_player_manager();
        manager.add_input(Frame::new(0), PlayerSpot::Player1, input_with_axis(1));
        manager.add_input(Frame::new(0), PlayerSpot::Player2, input_with_axis(2));
        let inputs = manager.inputs_for_frame(Frame::new(0));
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs.get(0), Some(&input_with_axis(1)));
        assert_eq!(inputs.get(1), Some(&input_with_axis(2)));
    }

    #[test]
    fn missing_inputs_fill_with_predictions() {
        let mut manager = two_player_manager();
        manager.add_input(Frame::new(0), PlayerSpot::Player1, input_with_axis(1));
        // player 2 never sent anything; frame 0 predicts neutral
        let inputs = manager.inputs_for_frame(Frame::new(0));
        assert_eq!(inputs.get(1), Some(&CharacterInput::default()));
    }

    #[test]
    fn out_of_session_spot_is_rejected() {
        let mut manager = two_player_manager();
        manager.add_input(Frame::new(0), PlayerSpot::Player3, input_with_axis(9));
        assert_eq!(manager.last_stored_frame(PlayerSpot::Player3), None);
        let (input, kind) = manager.input_for_frame(Frame::new(0), PlayerSpot::Player3);
        assert_eq!(input, CharacterInput::default());
        assert_eq!(kind, InputKind::Predicted);
    }

    #[test]
    fn stall_query_lists_every_blocking_player() {
        let mut manager = two_player_manager();
        // player 1 is caught up; player 2 has nothing stored
        for frame in 0..=20 {
            manager.add_input(Frame::new(frame), PlayerSpot::Player1, input_with_axis(0));
        }
        let mut stall = StallInfo::default();
        // frame 10 = MAX_ROLLBACK: outside player 2's prediction window
        assert!(manager.is_any_player_outside_get_range(Frame::new(10), &mut stall));
        assert_eq!(stall.waiting_on.len(), 1);
        let waiting = stall.waiting_on.get(0).expect("one waiting player");
        assert_eq!(waiting.spot, PlayerSpot::Player2);
        assert_eq!(waiting.last_frame_received, None);
    }

    #[test]
    fn stall_query_clear_when_within_windows() {
        let mut manager = two_player_manager();
        manager.add_input(Frame::new(0), PlayerSpot::Player1, input_with_axis(0));
        manager.add_input(Frame::new(0), PlayerSpot::Player2, input_with_axis(0));
        let mut stall = StallInfo::default();
        assert!(!manager.is_any_player_outside_get_range(Frame::new(5), &mut stall));
        assert!(stall.waiting_on.is_empty());
    }

    #[test]
    fn lack_query_checks_ever_stored() {
        let mut manager = two_player_manager();
        for frame in 0..5 {
            manager.add_input(Frame::new(frame), PlayerSpot::Player1, input_with_axis(0));
        }
        for frame in 0..3 {
            manager.add_input(Frame::new(frame), PlayerSpot::Player2, input_with_axis(0));
        }
        assert!(!manager.does_any_player_lack_input_for_frame(Frame::new(2)));
        assert!(manager.does_any_player_lack_input_for_frame(Frame::new(3)));
    }

    #[test]
    fn earliest_misprediction_across_players() {
        let mut manager = two_player_manager();
        manager.add_input(Frame::new(0), PlayerSpot::Player1, input_with_axis(1));
        manager.add_input(Frame::new(0), PlayerSpot::Player2, input_with_axis(2));
        // both players consumed through frame 3 on predictions
        for frame in 1..=3 {
            manager.inputs_for_frame(Frame::new(frame));
        }
        // player 1 mispredicted at 3, player 2 at 2; earliest wins
        manager.add_input(Frame::new(1), PlayerSpot::Player1, input_with_axis(1));
        manager.add_input(Frame::new(2), PlayerSpot::Player1, input_with_axis(1));
        manager.add_input(Frame::new(3), PlayerSpot::Player1, input_with_axis(9));
        manager.add_input(Frame::new(1), PlayerSpot::Player2, input_with_axis(2));
        manager.add_input(Frame::new(2), PlayerSpot::Player2, input_with_axis(8));
        assert_eq!(manager.first_incorrect_frame(), Some(Frame::new(2)));

        manager.reset_predictions();
        assert_eq!(manager.first_incorrect_frame(), None);
    }
}
