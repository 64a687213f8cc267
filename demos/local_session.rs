//! Minimal runnable session: one local player driving a box around, with
//! sync-test mode re-simulating every frame to verify determinism.
//!
//! Run with: cargo run --example local_session

use rampart::prelude::*;

/// Complete simulation state for the demo: one box, plus counters that make
/// nondeterminism visible in the logged checksums.
#[derive(Clone, Default, Hash)]
struct World {
    frame: u32,
    position: (i64, i64),
    jumps: u32,
}

struct DemoConfig;

impl Config for DemoConfig {
    type Snapshot = World;
    // no event-driven effects in this demo
    type Effect = ();
}

struct DemoGame {
    world: World,
}

impl DemoGame {
    /// Deterministic input script: pace back and forth, jump periodically.
    fn scripted_input(frame: u32) -> CharacterInput {
        let mut input = CharacterInput::default();
        input.move_forward = if (frame / 60) % 2 == 0 {
            Fx::ONE
        } else {
            Fx::NEG_ONE
        };
        input.move_right = Fx::HALF;
        if frame % 30 == 15 {
            input.commands = CommandButtons::JUMP;
        }
        input
    }

    fn step(&mut self, frame: Frame, inputs: &PlayerInputsForFrame) {
        for input in inputs.iter() {
            self.world.position.0 = self.world.position.0.wrapping_add(input.move_forward.raw());
            self.world.position.1 = self.world.position.1.wrapping_add(input.move_right.raw());
            if input.commands.is_pressed(CommandButtons::JUMP) {
                self.world.jumps += 1;
            }
        }
        self.world.frame = frame.number().wrapping_add(1);
    }
}

impl RollbackUser<DemoConfig> for DemoGame {
    fn generate_snapshot(&mut self, _frame: Frame, snapshot: &mut World) {
        *snapshot = self.world.clone();
    }

    fn restore_snapshot(&mut self, _frame: Frame, snapshot: &World) {
        self.world = snapshot.clone();
    }

    fn input_for_next_frame(&mut self, frame: Frame, input: &mut CharacterInput) -> bool {
        *input = Self::scripted_input(frame.number());
        true
    }

    fn process_frame(&mut self, frame: Frame, inputs: &PlayerInputsForFrame) {
        self.step(frame, inputs);
    }

    fn process_frame_without_rendering(&mut self, frame: Frame, inputs: &PlayerInputsForFrame) {
        self.step(frame, inputs);
    }

    fn on_post_rollback(&mut self) {}

    fn send_local_inputs(&mut self, _update_frame: Frame, _history: &InputHistoryArray) {}

    fn send_time_quality_report(&mut self, _frame: Frame) {}

    fn send_validation_checksum(&mut self, frame: Frame, checksum: u32) {
        tracing::debug!(frame = frame.number(), checksum, "frame verified");
    }

    fn on_stalling_for_remote_inputs(&mut self, _stall: &StallInfo) {}

    fn on_inputs_exit_rollback_window(&mut self, _confirmed_frame: Frame) {}

    fn on_desync_detected(&mut self, frame: Frame, local_checksum: u32, remote_checksum: u32) {
        tracing::error!(
            frame = frame.number(),
            local_checksum,
            remote_checksum,
            "nondeterminism detected"
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // configure logging: output core and demo logs to standard out
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::INFO)
            .finish(),
    )?;

    let mut controller: RollbackController<DemoConfig> = RollbackController::new();
    controller.start_session(
        SessionInfo {
            total_players: 1,
            local_spot: PlayerSpot::Player1,
            is_networked: false,
        },
        RollbackSettings {
            local_input_delay: 2,
            use_sync_test: true,
            ..RollbackSettings::default()
        },
    )?;

    let mut game = DemoGame {
        world: World::default(),
    };
    for _ in 0..300 {
        match controller.advance(&mut game)? {
            AdvanceOutcome::Proceeded { .. } => {},
            AdvanceOutcome::Stalled { stall } => {
                tracing::warn!(waiting_on = stall.waiting_on.len(), "stalled");
            },
            AdvanceOutcome::Ended => break,
        }
    }

    tracing::info!(
        frames = game.world.frame,
        jumps = game.world.jumps,
        x = game.world.position.0,
        y = game.world.position.1,
        checksum = checksum_of(&game.world),
        "session complete; every frame re-simulated identically"
    );
    controller.end_session();
    Ok(())
}
