//! The orchestration state machine: tick, stall, roll back, replay.
//!
//! One [`advance`](RollbackController::advance) call is one simulation tick.
//! The host drains its transport into
//! [`handle_input_update`](RollbackController::handle_input_update) /
//! [`handle_validation_checksum`](RollbackController::handle_validation_checksum)
//! first, then calls `advance`; corrections detected during the drain are
//! applied (restore + replay) at the top of the next tick, so the earliest
//! mis-predicted frame across a whole drain wins automatically.
//!
//! Everything runs on the caller's thread; there is no internal locking, no
//! allocation during normal ticks, and no wall-clock read anywhere near the
//! simulation.

use crate::checksum::checksum_of;
use crate::error::{NetcodeError, NetcodeResult};
use crate::input::CharacterInput;
use crate::net::messages::{InputUpdate, ValidationChecksum};
use crate::report_violation;
use crate::telemetry::{ViolationKind, ViolationSeverity};
use crate::{Config, Frame, PlayerSpot, MAX_ROLLBACK};

use super::desync::DesyncChecker;
use super::event_tracker::{EffectsForFrame, EventTracker};
use super::input_manager::InputManager;
use super::settings::{RollbackSettings, SessionInfo, StallInfo, StallPlayerInfo};
use super::snapshot_store::SnapshotStore;
use super::user::RollbackUser;

/// Lifecycle of the controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session configured. Only `start_session` is meaningful.
    Uninitialized,
    /// Session configured, first tick not yet produced.
    Idle,
    /// Ticks are being produced.
    Running,
}

/// Sub-mode of a running controller, for observability.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControllerMode {
    /// Ticks proceed normally.
    Normal,
    /// The last tick could not advance for lack of remote inputs.
    Stalling,
    /// A rollback replay is in progress.
    RollingBack,
}

/// What one `advance` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The tick simulated `frame`.
    Proceeded {
        /// The frame just processed.
        frame: Frame,
    },
    /// The tick could not advance; the host should call again next tick.
    Stalled {
        /// The players being waited on.
        stall: StallInfo,
    },
    /// The local input source is exhausted (replay ended). No further ticks
    /// will be produced.
    Ended,
}

/// The deterministic rollback core for one match.
///
/// Created once, then cycled through sessions via
/// [`start_session`](Self::start_session) / [`end_session`](Self::end_session).
/// All host interaction flows through the [`RollbackUser`] passed to each
/// entry point; the controller holds no reference to the host between calls.
pub struct RollbackController<C: Config> {
    phase: SessionPhase,
    mode: ControllerMode,
    session: SessionInfo,
    settings: RollbackSettings,
    /// The newest simulated frame; `Frame::PRE_SESSION` before the first tick.
    last_processed_frame: Frame,
    /// Ticks completed this session. Drives the early-session confirmation
    /// boundary without frame-number comparisons that wrap.
    ticks_processed: u64,
    /// Newest frame reported through `on_inputs_exit_rollback_window`.
    confirmed_horizon: Option<Frame>,
    /// Earliest mis-predicted frame awaiting correction.
    pending_rollback_to: Option<Frame>,
    input_manager: InputManager,
    snapshots: SnapshotStore<C::Snapshot>,
    effects: EventTracker<C::Effect>,
    desync_checker: DesyncChecker,
    /// Reusable snapshot buffer; swaps through the store each tick.
    scratch: C::Snapshot,
}

impl<C: Config> Default for RollbackController<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Config> RollbackController<C> {
    /// Creates an uninitialized controller.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            mode: ControllerMode::Normal,
            session: SessionInfo::default(),
            settings: RollbackSettings::default(),
            last_processed_frame: Frame::PRE_SESSION,
            ticks_processed: 0,
            confirmed_horizon: None,
            pending_rollback_to: None,
            input_manager: InputManager::new(),
            snapshots: SnapshotStore::new(),
            effects: EventTracker::new(),
            desync_checker: DesyncChecker::new(),
            scratch: C::Snapshot::default(),
        }
    }

    /// Configures and arms a session.
    ///
    /// # Errors
    ///
    /// [`NetcodeError::SessionAlreadyStarted`] when a session is active, or
    /// [`NetcodeError::InvalidSessionConfig`] when validation fails. On any
    /// error the controller stays uninitialized.
    pub fn start_session(
        &mut self,
        session: SessionInfo,
        settings: RollbackSettings,
    ) -> NetcodeResult<()> {
        if self.phase != SessionPhase::Uninitialized {
            return Err(NetcodeError::SessionAlreadyStarted);
        }
        settings.validate(&session)?;

        if !self.input_manager.setup_for_session(session.total_players) {
            // validate() bounds the count, so this is unreachable in practice
            return Err(NetcodeError::InvalidSessionConfig {
                reason: crate::error::SessionConfigError::TotalPlayersOutOfRange {
                    total_players: session.total_players,
                },
            });
        }
        self.snapshots.reset();
        self.effects.reset();
        self.desync_checker.reset();
        self.last_processed_frame = Frame::PRE_SESSION;
        self.ticks_processed = 0;
        self.confirmed_horizon = None;
        self.pending_rollback_to = None;
        self.mode = ControllerMode::Normal;
        self.session = session;
        self.settings = settings;

        // positive input delay: the first `delay` frames read neutral local
        // inputs so the input fetched at tick N lands on frame N + delay
        let delay = settings.effective_local_delay(&session);
        if delay > 0 {
            self.input_manager.prefill(session.local_spot, delay as u32);
        }

        self.phase = SessionPhase::Idle;
        tracing::debug!(
            total_players = session.total_players,
            local_spot = %session.local_spot,
            networked = session.is_networked,
            "session started"
        );
        Ok(())
    }

    /// Tears the session down. Valid from any sub-mode; all per-session
    /// state is wiped and the controller returns to `Uninitialized`.
    pub fn end_session(&mut self) {
        self.phase = SessionPhase::Uninitialized;
        self.mode = ControllerMode::Normal;
        self.pending_rollback_to = None;
        self.confirmed_horizon = None;
        self.snapshots.reset();
        self.desync_checker.reset();
        tracing::debug!("session ended");
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current sub-mode of a running session.
    #[must_use]
    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    /// The session facts given to [`start_session`](Self::start_session).
    #[must_use]
    pub fn session_info(&self) -> &SessionInfo {
        &self.session
    }

    /// The newest simulated frame ([`Frame::PRE_SESSION`] before the first
    /// tick).
    #[must_use]
    pub fn last_processed_frame(&self) -> Frame {
        self.last_processed_frame
    }

    /// Newest frame whose inputs can no longer change.
    #[must_use]
    pub fn confirmed_frame(&self) -> Option<Frame> {
        self.confirmed_horizon
    }

    /// The effect tracker, for renderer queries.
    #[must_use]
    pub fn effects(&self) -> &EventTracker<C::Effect> {
        &self.effects
    }

    /// The effect lists for the newest simulated frame.
    #[must_use]
    pub fn current_frame_events(&self) -> &EffectsForFrame<C::Effect> {
        self.effects.current_frame_events()
    }

    /// Registers an event-driven effect spawned while simulating `frame`,
    /// alive for `lifetime` frames.
    ///
    /// Call after `advance` for effects from the tick just processed, or
    /// with an earlier in-window frame for effects re-spawned during a
    /// rollback replay. Registration is idempotent, so re-registering an
    /// effect the canceled timeline already recorded is harmless.
    pub fn register_effect(&mut self, frame: Frame, event: C::Effect, lifetime: u32) {
        let offset = frame.delta(self.last_processed_frame);
        if offset > 0 || offset < -(MAX_ROLLBACK as i32) {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::FrameSync,
                "effect registered for frame {} outside the tracked window (newest {})",
                frame,
                self.last_processed_frame
            );
            return;
        }
        self.effects.add_effect_at(offset, event, lifetime);
    }

    /// Runs one simulation tick: applies any pending rollback, then either
    /// proceeds, stalls, or reports the input source exhausted.
    ///
    /// # Errors
    ///
    /// [`NetcodeError::SessionNotStarted`] outside a session;
    /// [`NetcodeError::ConfirmedInputMissing`] when a frame reaches the
    /// confirmation boundary with an input still missing (the session is no
    /// longer coherent and should be ended); snapshot/rollback errors when
    /// internal invariants break.
    pub fn advance<U: RollbackUser<C>>(&mut self, user: &mut U) -> NetcodeResult<AdvanceOutcome> {
        match self.phase {
            SessionPhase::Uninitialized => return Err(NetcodeError::SessionNotStarted),
            SessionPhase::Idle => self.phase = SessionPhase::Running,
            SessionPhase::Running => {},
        }

        let next = self.last_processed_frame.next();

        // corrections first: the timeline beneath the new tick must be right
        if let Some(target) = self.pending_rollback_to.take() {
            self.perform_rollback(user, target)?;
        }

        let mut local_input = CharacterInput::default();
        if !user.input_for_next_frame(next, &mut local_input) {
            tracing::debug!(frame = next.number(), "local input source exhausted");
            return Ok(AdvanceOutcome::Ended);
        }

        // under lockstep the local input must be stored and broadcast even
        // when this tick stalls, or two peers deadlock waiting on each other
        if self.settings.use_lockstep {
            self.store_local_input(next, local_input);
            self.broadcast_local_inputs(user);
        }

        if let Some(stall) = self.stall_check(next) {
            self.mode = ControllerMode::Stalling;
            tracing::trace!(frame = next.number(), "stalling for remote inputs");
            user.on_stalling_for_remote_inputs(&stall);
            return Ok(AdvanceOutcome::Stalled { stall });
        }
        self.mode = ControllerMode::Normal;

        if !self.settings.use_lockstep {
            self.store_local_input(next, local_input);
        }

        // negative local delay may have just revealed a local misprediction
        if let Some(target) = self.input_manager.first_incorrect_frame() {
            self.perform_rollback(user, target)?;
        }

        // the frame leaving the rollback window: checksum it while its
        // snapshot is still the oldest ring entry
        let confirming = self.confirmation_due(next)?;

        // snapshot of the state entering this frame
        user.generate_snapshot(next, &mut self.scratch);
        let mut snapshot = std::mem::take(&mut self.scratch);
        self.snapshots.store(next, &mut snapshot);
        self.scratch = snapshot;

        if self.settings.use_sync_test && self.ticks_processed > 0 {
            self.run_sync_test(user, next)?;
        }

        let inputs = self.input_manager.inputs_for_frame(next);
        user.process_frame(next, &inputs);

        self.effects.increment_frame();

        if !self.settings.use_lockstep {
            self.broadcast_local_inputs(user);
        }
        user.send_time_quality_report(next);

        if let Some((confirmed, checksum)) = confirming {
            user.on_inputs_exit_rollback_window(confirmed);
            user.send_validation_checksum(confirmed, checksum);
            self.confirmed_horizon = Some(confirmed);
            if self.session.is_networked && !self.session.is_host() {
                self.desync_checker.provide_local_checksum(confirmed, checksum);
                self.conclude_desync_check(user);
            }
        }

        self.last_processed_frame = next;
        self.ticks_processed += 1;
        Ok(AdvanceOutcome::Proceeded { frame: next })
    }

    /// Ingests a peer's input broadcast.
    ///
    /// Safe against duplicates and reordering. A detected misprediction is
    /// queued; the next `advance` rolls back to the earliest one seen.
    ///
    /// # Errors
    ///
    /// [`NetcodeError::PeerTooFarBehind`] when the update's newest frame is
    /// at or below our confirmation horizon, and
    /// [`NetcodeError::PeerTooFarAhead`] when its history cannot seam with
    /// what we have stored. Both leave session state untouched; whether to
    /// terminate is the host's call.
    pub fn handle_input_update(
        &mut self,
        source_spot: PlayerSpot,
        message: &InputUpdate,
    ) -> NetcodeResult<()> {
        if self.phase == SessionPhase::Uninitialized {
            return Err(NetcodeError::SessionNotStarted);
        }
        if !source_spot.is_within_total(self.session.total_players)
            || source_spot == self.session.local_spot
        {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::Protocol,
                "input update from invalid source spot {}",
                source_spot
            );
            return Ok(());
        }

        if let Some(horizon) = self.confirmed_horizon {
            if message.update_frame.delta(horizon) <= 0 {
                report_violation!(
                    ViolationSeverity::Error,
                    ViolationKind::Protocol,
                    "peer {} sent inputs for frame {} at or below confirmation horizon {}",
                    source_spot,
                    message.update_frame,
                    horizon
                );
                return Err(NetcodeError::PeerTooFarBehind {
                    spot: source_spot,
                    update_frame: message.update_frame,
                    confirmed_frame: horizon,
                });
            }
        }

        let next_wanted = match self.input_manager.last_stored_frame(source_spot) {
            Some(last) => last.next(),
            None => Frame::new(0),
        };
        let fresh = message.update_frame.delta(next_wanted);
        if fresh < 0 {
            tracing::trace!(
                spot = %source_spot,
                update_frame = message.update_frame.number(),
                "redundant input update"
            );
            return Ok(());
        }
        if message.oldest_frame().delta(next_wanted) > 0 {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::Protocol,
                "input update from {} (frame {}) cannot seam with stored inputs (next wanted {})",
                source_spot,
                message.update_frame,
                next_wanted
            );
            return Err(NetcodeError::PeerTooFarAhead {
                spot: source_spot,
                update_frame: message.update_frame,
                last_stored_frame: next_wanted.previous(),
            });
        }

        let mut frame = next_wanted;
        while frame.delta(message.update_frame) <= 0 {
            if let Some(input) = message.input_for(frame) {
                self.input_manager.add_input(frame, source_spot, *input);
            }
            frame = frame.next();
        }

        if let Some(incorrect) = self.input_manager.first_incorrect_frame() {
            self.pending_rollback_to = Some(match self.pending_rollback_to {
                Some(current) if current.delta(incorrect) <= 0 => current,
                _ => incorrect,
            });
            tracing::debug!(
                frame = incorrect.number(),
                "misprediction detected; rollback queued"
            );
        }
        Ok(())
    }

    /// Ingests a peer's validation checksum. Only the host's checksums are
    /// compared, and only by non-hosts; everything else is ignored.
    ///
    /// # Errors
    ///
    /// [`NetcodeError::SessionNotStarted`] outside a session.
    pub fn handle_validation_checksum<U: RollbackUser<C>>(
        &mut self,
        user: &mut U,
        source_spot: PlayerSpot,
        message: &ValidationChecksum,
    ) -> NetcodeResult<()> {
        if self.phase == SessionPhase::Uninitialized {
            return Err(NetcodeError::SessionNotStarted);
        }
        if !self.session.is_networked {
            report_violation!(
                ViolationSeverity::Warning,
                ViolationKind::Protocol,
                "validation checksum received in a non-networked session"
            );
            return Ok(());
        }
        if source_spot != PlayerSpot::Player1 || self.session.is_host() {
            // every peer broadcasts, but only non-hosts compare against the
            // host; the rest is informational
            tracing::trace!(
                spot = %source_spot,
                frame = message.frame.number(),
                "ignoring non-compared validation checksum"
            );
            return Ok(());
        }
        self.desync_checker
            .provide_remote_host_checksum(message.frame, message.checksum);
        self.conclude_desync_check(user);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Stores the local input fetched for tick `next`, honoring the
    /// configured input delay.
    fn store_local_input(&mut self, next: Frame, input: CharacterInput) {
        let delay = self.settings.effective_local_delay(&self.session);
        if delay < 0 {
            // the store lags the simulation; nothing to store until the
            // simulation is `|delay|` ticks in
            if self.ticks_processed < u64::from(delay.unsigned_abs()) {
                return;
            }
        }
        let target = next.offset(delay);
        // a stalled lockstep tick retries; only the first attempt stores
        if self
            .input_manager
            .last_stored_frame(self.session.local_spot)
            .is_some_and(|last| target.delta(last) <= 0)
        {
            return;
        }
        self.input_manager
            .add_input(target, self.session.local_spot, input);
    }

    /// Sends the local redundant input window, if anything is stored yet.
    fn broadcast_local_inputs<U: RollbackUser<C>>(&mut self, user: &mut U) {
        if !self.session.is_networked {
            return;
        }
        if let Some((update_frame, history)) = self.input_manager.history(self.session.local_spot)
        {
            user.send_local_inputs(update_frame, &history);
        }
    }

    /// The stall decision for tick `next`: prediction-window exhaustion, or
    /// under lockstep any missing confirmed remote input.
    fn stall_check(&mut self, next: Frame) -> Option<StallInfo> {
        let mut stall = StallInfo::default();
        self.input_manager
            .is_any_player_outside_get_range(next, &mut stall);

        if self.settings.use_lockstep && self.session.is_networked {
            for spot in PlayerSpot::players(self.session.total_players) {
                if spot == self.session.local_spot {
                    continue;
                }
                if !self.input_manager.has_confirmed(next, spot)
                    && !stall.waiting_on.iter().any(|waiting| waiting.spot == spot)
                {
                    stall.waiting_on.push(StallPlayerInfo {
                        spot,
                        last_frame_received: self.input_manager.last_stored_frame(spot),
                    });
                }
            }
        }

        stall.should_stall().then_some(stall)
    }

    /// When tick `next` pushes a frame out of the rollback window, verifies
    /// its inputs are complete and computes its validation checksum.
    fn confirmation_due(&mut self, next: Frame) -> NetcodeResult<Option<(Frame, u32)>> {
        if self.ticks_processed < u64::from(MAX_ROLLBACK) + 1 {
            return Ok(None);
        }
        let confirmed = next.offset(-(MAX_ROLLBACK as i32) - 1);
        if self
            .input_manager
            .does_any_player_lack_input_for_frame(confirmed)
        {
            report_violation!(
                ViolationSeverity::Critical,
                ViolationKind::InputStore,
                "frame {} is leaving the rollback window without every input confirmed",
                confirmed
            );
            return Err(NetcodeError::ConfirmedInputMissing { frame: confirmed });
        }
        let snapshot = self.snapshots.get(confirmed)?;
        Ok(Some((confirmed, checksum_of(snapshot))))
    }

    /// Restores the snapshot at `target` and re-simulates forward to the
    /// present without rendering. Exactly one `on_post_rollback` per call.
    fn perform_rollback<U: RollbackUser<C>>(
        &mut self,
        user: &mut U,
        target: Frame,
    ) -> NetcodeResult<()> {
        let behind = self.last_processed_frame.delta(target);
        if behind < 0 || behind > MAX_ROLLBACK as i32 {
            report_violation!(
                ViolationSeverity::Critical,
                ViolationKind::FrameSync,
                "rollback to frame {} outside window ending at {}",
                target,
                self.last_processed_frame
            );
            return Err(NetcodeError::RollbackOutOfRange {
                target_frame: target,
                last_processed_frame: self.last_processed_frame,
            });
        }

        self.mode = ControllerMode::RollingBack;
        tracing::debug!(
            target = target.number(),
            present = self.last_processed_frame.number(),
            "rolling back"
        );

        // the replay re-derives predictions from the corrected inputs
        self.input_manager.reset_predictions();

        {
            let snapshot = self.snapshots.get(target)?;
            user.restore_snapshot(target, snapshot);
        }

        let mut frame = target;
        loop {
            if frame != target {
                // corrected snapshot of the state entering this frame
                user.generate_snapshot(frame, &mut self.scratch);
                let mut snapshot = std::mem::take(&mut self.scratch);
                self.snapshots.store(frame, &mut snapshot);
                self.scratch = snapshot;
            }
            let inputs = self.input_manager.inputs_for_frame(frame);
            user.process_frame_without_rendering(frame, &inputs);
            if frame == self.last_processed_frame {
                break;
            }
            frame = frame.next();
        }

        user.on_post_rollback();
        self.mode = ControllerMode::Normal;
        Ok(())
    }

    /// Sync-test: re-simulate the previous frame and verify it reproduces
    /// the snapshot just stored for `next`, bit for bit.
    fn run_sync_test<U: RollbackUser<C>>(&mut self, user: &mut U, next: Frame) -> NetcodeResult<()> {
        let previous = next.previous();
        let stored_checksum = checksum_of(self.snapshots.get(next)?);

        {
            let snapshot = self.snapshots.get(previous)?;
            user.restore_snapshot(previous, snapshot);
        }
        self.input_manager.reset_predictions();
        let inputs = self.input_manager.inputs_for_frame(previous);
        user.process_frame_without_rendering(previous, &inputs);
        user.on_post_rollback();

        user.generate_snapshot(next, &mut self.scratch);
        let resimulated_checksum = checksum_of(&self.scratch);
        if resimulated_checksum != stored_checksum {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::DesyncCheck,
                "sync test divergence at frame {}: {:#010x} vs {:#010x}",
                next,
                stored_checksum,
                resimulated_checksum
            );
            user.on_desync_detected(next, stored_checksum, resimulated_checksum);
        }
        Ok(())
    }

    /// If both checksums of the in-flight desync check are present, consume
    /// the comparison and report a divergence to the host.
    fn conclude_desync_check<U: RollbackUser<C>>(&mut self, user: &mut U) {
        if !self.desync_checker.is_ready() {
            return;
        }
        let (Some(frame), Some((local, remote))) = (
            self.desync_checker.target_frame(),
            self.desync_checker.checksums(),
        ) else {
            return;
        };
        if self.desync_checker.did_desync_occur() {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::DesyncCheck,
                "desync at frame {}: local {:#010x}, host {:#010x}",
                frame,
                local,
                remote
            );
            user.on_desync_detected(frame, local, remote);
        }
    }
}

// #########
// # TESTS #
// #########

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod controller_tests {
    use super::*;
    use crate::input::PlayerInputsForFrame;
    use crate::input::{CharacterInput, InputHistoryArray};
    use crate::math::Fx;

    #[derive(Clone, Default, Hash, PartialEq, Debug)]
    struct Snap {
        frame: u32,
        accumulator: i64,
    }

    struct TestConfig;

    impl Config for TestConfig {
        type Snapshot = Snap;
        type Effect = u32;
    }

    /// Minimal host: state is one accumulator folding in each frame's
    /// inputs; every callback is recorded.
    struct StubUser {
        state: Snap,
        restores: Vec<Frame>,
        resimulated: Vec<Frame>,
        processed: Vec<Frame>,
        post_rollbacks: u32,
        confirmed: Vec<Frame>,
        checksums: Vec<(Frame, u32)>,
        stalls: u32,
        inputs_exhausted_after: Option<u32>,
        local_axis_by_frame: fn(u32) -> i32,
    }

    impl StubUser {
        fn new() -> Self {
            Self {
                state: Snap::default(),
                restores: Vec::new(),
                resimulated: Vec::new(),
                processed: Vec::new(),
                post_rollbacks: 0,
                confirmed: Vec::new(),
                checksums: Vec::new(),
                stalls: 0,
                inputs_exhausted_after: None,
                local_axis_by_frame: |_| 0,
            }
        }
    }

    impl RollbackUser<TestConfig> for StubUser {
        fn generate_snapshot(&mut self, frame: Frame, snapshot: &mut Snap) {
            *snapshot = self.state.clone();
            snapshot.frame = frame.number();
        }

        fn restore_snapshot(&mut self, frame: Frame, snapshot: &Snap) {
            self.restores.push(frame);
            self.state = snapshot.clone();
        }

        fn input_for_next_frame(&mut self, frame: Frame, input: &mut CharacterInput) -> bool {
            if self
                .inputs_exhausted_after
                .is_some_and(|after| frame.number() > after)
            {
                return false;
            }
            input.move_forward = Fx::from_int((self.local_axis_by_frame)(frame.number()));
            true
        }

        fn process_frame(&mut self, frame: Frame, inputs: &PlayerInputsForFrame) {
            self.processed.push(frame);
            self.fold(inputs);
        }

        fn process_frame_without_rendering(&mut self, frame: Frame, inputs: &PlayerInputsForFrame) {
            self.resimulated.push(frame);
            self.fold(inputs);
        }

        fn on_post_rollback(&mut self) {
            self.post_rollbacks += 1;
        }

        fn send_local_inputs(&mut self, _frame: Frame, _history: &InputHistoryArray) {}

        fn send_time_quality_report(&mut self, _frame: Frame) {}

        fn send_validation_checksum(&mut self, frame: Frame, checksum: u32) {
            self.checksums.push((frame, checksum));
        }

        fn on_stalling_for_remote_inputs(&mut self, _stall: &StallInfo) {
            self.stalls += 1;
        }

        fn on_inputs_exit_rollback_window(&mut self, confirmed_frame: Frame) {
            self.confirmed.push(confirmed_frame);
        }
    }

    impl StubUser {
        fn fold(&mut self, inputs: &PlayerInputsForFrame) {
            for input in inputs.iter() {
                self.state.accumulator = self
                    .state
                    .accumulator
                    .wrapping_mul(31)
                    .wrapping_add(i64::from(input.move_forward.raw() as i32));
            }
        }
    }

    fn local_session() -> SessionInfo {
        SessionInfo::default()
    }

    fn no_delay() -> RollbackSettings {
        RollbackSettings {
            local_input_delay: 0,
            ..RollbackSettings::default()
        }
    }

    // ==========================================
    // Lifecycle
    // ==========================================

    #[test]
    fn advance_requires_a_session() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let mut user = StubUser::new();
        assert_eq!(
            controller.advance(&mut user),
            Err(NetcodeError::SessionNotStarted)
        );
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        controller.start_session(local_session(), no_delay()).unwrap();
        assert_eq!(
            controller.start_session(local_session(), no_delay()),
            Err(NetcodeError::SessionAlreadyStarted)
        );
    }

    #[test]
    fn invalid_config_leaves_controller_uninitialized() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let bad = SessionInfo {
            total_players: 0,
            ..local_session()
        };
        assert!(controller.start_session(bad, no_delay()).is_err());
        assert_eq!(controller.phase(), SessionPhase::Uninitialized);
        // a valid config is accepted afterwards
        controller.start_session(local_session(), no_delay()).unwrap();
        assert_eq!(controller.phase(), SessionPhase::Idle);
    }

    #[test]
    fn end_session_allows_restart() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let mut user = StubUser::new();
        controller.start_session(local_session(), no_delay()).unwrap();
        controller.advance(&mut user).unwrap();
        controller.end_session();
        assert_eq!(controller.phase(), SessionPhase::Uninitialized);
        controller.start_session(local_session(), no_delay()).unwrap();
        let outcome = controller.advance(&mut user).unwrap();
        assert_eq!(
            outcome,
            AdvanceOutcome::Proceeded {
                frame: Frame::new(0)
            }
        );
    }

    // ==========================================
    // Local progression
    // ==========================================

    #[test]
    fn local_session_ticks_sequentially() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let mut user = StubUser::new();
        controller.start_session(local_session(), no_delay()).unwrap();
        for expected in 0..5_u32 {
            let outcome = controller.advance(&mut user).unwrap();
            assert_eq!(
                outcome,
                AdvanceOutcome::Proceeded {
                    frame: Frame::new(expected)
                }
            );
        }
        assert_eq!(
            user.processed,
            (0..5).map(Frame::new).collect::<Vec<_>>()
        );
        assert_eq!(controller.last_processed_frame(), Frame::new(4));
        assert_eq!(controller.phase(), SessionPhase::Running);
        assert_eq!(user.post_rollbacks, 0);
        assert_eq!(user.stalls, 0);
        assert!(user.restores.is_empty());
        assert!(user.resimulated.is_empty());
    }

    #[test]
    fn confirmation_begins_after_the_window_fills() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let mut user = StubUser::new();
        controller.start_session(local_session(), no_delay()).unwrap();
        for _ in 0..=MAX_ROLLBACK {
            controller.advance(&mut user).unwrap();
        }
        assert!(user.confirmed.is_empty());
        controller.advance(&mut user).unwrap(); // tick MAX_ROLLBACK + 1
        assert_eq!(user.confirmed, vec![Frame::new(0)]);
        assert_eq!(user.checksums.len(), 1);
        assert_eq!(user.checksums[0].0, Frame::new(0));
        assert_eq!(controller.confirmed_frame(), Some(Frame::new(0)));

        controller.advance(&mut user).unwrap();
        assert_eq!(user.confirmed, vec![Frame::new(0), Frame::new(1)]);
    }

    #[test]
    fn replay_end_stops_ticking() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let mut user = StubUser::new();
        user.inputs_exhausted_after = Some(2);
        controller.start_session(local_session(), no_delay()).unwrap();
        for _ in 0..3 {
            assert!(matches!(
                controller.advance(&mut user).unwrap(),
                AdvanceOutcome::Proceeded { .. }
            ));
        }
        assert_eq!(controller.advance(&mut user).unwrap(), AdvanceOutcome::Ended);
        // the session does not advance past the exhaustion point
        assert_eq!(controller.last_processed_frame(), Frame::new(2));
    }

    #[test]
    fn positive_delay_shifts_local_inputs() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let mut user = StubUser::new();
        user.local_axis_by_frame = |_| 7;
        let settings = RollbackSettings {
            local_input_delay: 3,
            ..RollbackSettings::default()
        };
        controller.start_session(local_session(), settings).unwrap();
        controller.advance(&mut user).unwrap();
        // frames 0..3 carry the neutral prefill; the first fetched input
        // lands on frame 3
        let mut manager_view = controller.input_manager.clone();
        let (input, kind) = manager_view.input_for_frame(Frame::new(0), PlayerSpot::Player1);
        assert_eq!(kind, super::super::per_player_inputs::InputKind::Confirmed);
        assert_eq!(input.move_forward, Fx::ZERO);
        let (input, _kind) = manager_view.input_for_frame(Frame::new(3), PlayerSpot::Player1);
        assert_eq!(input.move_forward, Fx::from_int(7));
    }

    // ==========================================
    // Negative local input delay
    // ==========================================

    #[test]
    fn negative_delay_corrects_by_local_rollback() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let mut user = StubUser::new();
        // the local input changes every tick, so every confirmation after
        // the lag window contradicts the prediction it replaced
        user.local_axis_by_frame = |frame| frame as i32;
        let settings = RollbackSettings {
            local_input_delay: -2,
            ..RollbackSettings::default()
        };
        controller.start_session(local_session(), settings).unwrap();

        for _ in 0..6 {
            assert!(matches!(
                controller.advance(&mut user).unwrap(),
                AdvanceOutcome::Proceeded { .. }
            ));
        }

        // ticks 0 and 1 run purely on prediction; from tick 2 on, each
        // fetched input retroactively lands two frames back and corrects
        assert_eq!(
            user.restores,
            vec![Frame::new(0), Frame::new(1), Frame::new(2), Frame::new(3)]
        );
        assert_eq!(user.post_rollbacks, 4);
        assert_eq!(
            user.resimulated,
            vec![
                Frame::new(0),
                Frame::new(1),
                Frame::new(1),
                Frame::new(2),
                Frame::new(2),
                Frame::new(3),
                Frame::new(3),
                Frame::new(4),
            ]
        );
    }

    #[test]
    fn negative_delay_with_steady_input_never_rolls_back() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let mut user = StubUser::new();
        user.local_axis_by_frame = |_| 4;
        let settings = RollbackSettings {
            local_input_delay: -3,
            ..RollbackSettings::default()
        };
        controller.start_session(local_session(), settings).unwrap();
        for _ in 0..20 {
            controller.advance(&mut user).unwrap();
        }
        // predictions only ever disagree at the very first confirmation,
        // where the neutral prediction meets the held input
        assert_eq!(user.restores, vec![Frame::new(0)]);
        assert_eq!(user.post_rollbacks, 1);
    }

    // ==========================================
    // Sync test mode
    // ==========================================

    #[test]
    fn sync_test_rolls_back_every_frame() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let mut user = StubUser::new();
        let settings = RollbackSettings {
            local_input_delay: 0,
            use_sync_test: true,
            ..RollbackSettings::default()
        };
        controller.start_session(local_session(), settings).unwrap();
        for _ in 0..4 {
            controller.advance(&mut user).unwrap();
        }
        // ticks 1..3 each restored and re-simulated the previous frame
        assert_eq!(
            user.restores,
            vec![Frame::new(0), Frame::new(1), Frame::new(2)]
        );
        assert_eq!(
            user.resimulated,
            vec![Frame::new(0), Frame::new(1), Frame::new(2)]
        );
        assert_eq!(user.post_rollbacks, 3);
    }

    // ==========================================
    // Effects
    // ==========================================

    #[test]
    fn effects_registered_after_a_tick_land_on_the_current_frame() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let mut user = StubUser::new();
        controller.start_session(local_session(), no_delay()).unwrap();
        controller.advance(&mut user).unwrap();
        controller.register_effect(Frame::new(0), 42, 3);
        assert!(controller.current_frame_events().new_events.contains(&42));
        controller.advance(&mut user).unwrap();
        assert!(controller
            .current_frame_events()
            .past_continuing_events
            .contains(&42));
    }

    #[test]
    fn effect_registration_outside_window_is_dropped() {
        let mut controller: RollbackController<TestConfig> = RollbackController::new();
        let mut user = StubUser::new();
        controller.start_session(local_session(), no_delay()).unwrap();
        controller.advance(&mut user).unwrap();
        controller.register_effect(Frame::new(5), 9, 2); // future frame
        assert!(controller.current_frame_events().new_events.is_empty());
    }
}
