//! The host callback contract.
//!
//! The controller consumes the game and its transport through this trait: a
//! capability surface wide enough to drive simulation, snapshotting, and
//! outbound messaging, and nothing else. The controller promises a strict
//! call ordering (documented per method) and never calls back re-entrantly.

use crate::input::{CharacterInput, InputHistoryArray, PlayerInputsForFrame};
use crate::{Config, Frame};

use super::settings::StallInfo;

/// What a game plus its transport must implement to be driven by the
/// [`RollbackController`](super::RollbackController).
///
/// # Ordering guarantees
///
/// - [`generate_snapshot`](Self::generate_snapshot) for a frame is always
///   called before [`process_frame`](Self::process_frame) for that frame.
/// - [`restore_snapshot`](Self::restore_snapshot) is always followed by a
///   contiguous run of
///   [`process_frame_without_rendering`](Self::process_frame_without_rendering)
///   and then exactly one [`on_post_rollback`](Self::on_post_rollback).
/// - [`on_inputs_exit_rollback_window`](Self::on_inputs_exit_rollback_window)
///   is called with strictly increasing, gap-free frames, each only after no
///   rollback can ever revisit it.
pub trait RollbackUser<C: Config> {
    /// Fill `snapshot` with a complete, self-contained record of the
    /// simulation state entering `frame`. Called at the start of each new
    /// tick and after each re-simulation step; `snapshot` arrives holding
    /// stale data from an earlier frame and must be fully overwritten.
    fn generate_snapshot(&mut self, frame: Frame, snapshot: &mut C::Snapshot);

    /// Replace live simulation state with `snapshot` (the state entering
    /// `frame`). The start of every rollback.
    fn restore_snapshot(&mut self, frame: Frame, snapshot: &C::Snapshot);

    /// Produce the local player's input for `frame`, from the controller or
    /// from a replay source. Return `false` when the source is exhausted
    /// (replay ended): the session stops producing new ticks.
    ///
    /// May be called again with the same `frame` if the tick stalls.
    fn input_for_next_frame(&mut self, frame: Frame, input: &mut CharacterInput) -> bool;

    /// Advance the simulation by exactly one tick using `inputs`
    /// (spot-ordered, predictions filling any gaps).
    fn process_frame(&mut self, frame: Frame, inputs: &PlayerInputsForFrame);

    /// Same as [`process_frame`](Self::process_frame), but during rollback
    /// re-simulation: the renderer and audio must not emit events.
    fn process_frame_without_rendering(&mut self, frame: Frame, inputs: &PlayerInputsForFrame);

    /// Called exactly once per rollback, after re-simulation reaches the
    /// present. The renderer may reconcile visible state here.
    fn on_post_rollback(&mut self);

    /// Send the local player's recent inputs to all peers. `history[0]` is
    /// the input for `update_frame`, `history[i]` for `update_frame − i`;
    /// the redundancy covers packet loss. Called every proceeding tick.
    fn send_local_inputs(&mut self, update_frame: Frame, history: &InputHistoryArray);

    /// Send a timing probe to all peers (see
    /// [`TimeQuality`](crate::time_quality::TimeQuality)). Called every
    /// proceeding tick.
    fn send_time_quality_report(&mut self, frame: Frame);

    /// Broadcast the checksum of a fully confirmed frame for desync
    /// detection. Called when `frame` leaves the rollback window; requires
    /// reliable, ordered delivery.
    fn send_validation_checksum(&mut self, frame: Frame, checksum: u32);

    /// The tick cannot advance for lack of remote inputs. Called once per
    /// stalled tick with the players being waited on, for UX feedback.
    fn on_stalling_for_remote_inputs(&mut self, stall: &StallInfo);

    /// Inputs through `confirmed_frame` can no longer change; safe to
    /// persist for replays.
    fn on_inputs_exit_rollback_window(&mut self, confirmed_frame: Frame);

    /// A divergence was detected: our checksum for `frame` differs from the
    /// reference (the session host online, our own first simulation pass in
    /// sync-test mode). Diagnostic only: the core does not terminate the
    /// session; that decision belongs to the host.
    fn on_desync_detected(&mut self, frame: Frame, local_checksum: u32, remote_checksum: u32) {
        let _ = (frame, local_checksum, remote_checksum);
    }
}
