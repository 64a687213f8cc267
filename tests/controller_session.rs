//! Two-peer session scenarios: happy path, misprediction, stall, stale
//! peers, desync detection, and effects across rollback.


use rampart::prelude::*;
use stubs::{checksum_map, neutral_input, StubEffect, TwoPeerHarness};

fn online_settings(delay: u32) -> RollbackSettings {
    RollbackSettings {
        local_input_delay: 0,
        online_input_delay: delay,
        use_lockstep: false,
        use_sync_test: false,
    }
}

fn attack_every_five_from_fifteen(frame: u32) -> CharacterInput {
    let mut input = CharacterInput::default();
    if frame >= 15 && frame % 5 == 0 {
        input.commands = CommandButtons::ATTACK;
    }
    input
}

// ==========================================
// Scenario: two-player happy path
// ==========================================

#[test]
fn happy_path_never_rolls_back_and_checksums_agree() {
    let mut harness = TwoPeerHarness::new(
        online_settings(3),
        attack_every_five_from_fifteen,
        neutral_input,
    );
    for _ in 0..120 {
        let (outcome_a, outcome_b) = harness.run_round();
        assert!(matches!(outcome_a, AdvanceOutcome::Proceeded { .. }));
        assert!(matches!(outcome_b, AdvanceOutcome::Proceeded { .. }));
    }

    // zero rollbacks on either side
    assert!(harness.a.game.restores.is_empty());
    assert!(harness.b.game.restores.is_empty());
    assert_eq!(harness.a.game.post_rollbacks, 0);
    assert_eq!(harness.b.game.post_rollbacks, 0);

    // every emitted validation checksum matches its counterpart
    let checksums_a = checksum_map(&harness.a.game.sent_checksums);
    let checksums_b = checksum_map(&harness.b.game.sent_checksums);
    assert!(!checksums_a.is_empty());
    assert_eq!(checksums_a, checksums_b);

    // both sides ended frame 119 in the identical state
    assert_eq!(harness.a.game.world, harness.b.game.world);
    assert_eq!(harness.a.game.world.frame, 120);
    assert_eq!(
        checksum_of(&harness.a.game.world),
        checksum_of(&harness.b.game.world)
    );

    // nobody reported a desync
    assert!(harness.a.game.desyncs.is_empty());
    assert!(harness.b.game.desyncs.is_empty());

    // confirmations are strictly increasing and gap-free
    let confirmed: Vec<u32> = harness
        .a
        .game
        .confirmed
        .iter()
        .map(|frame| frame.number())
        .collect();
    let expected: Vec<u32> = (0..confirmed.len() as u32).collect();
    assert_eq!(confirmed, expected);
}

// ==========================================
// Scenario: single misprediction
// ==========================================

fn jump_at_forty(frame: u32) -> CharacterInput {
    let mut input = CharacterInput::default();
    if frame == 40 {
        input.commands = CommandButtons::JUMP;
    }
    input
}

#[test]
fn late_input_rolls_back_once_and_reconverges() {
    let mut harness = TwoPeerHarness::new(online_settings(0), neutral_input, jump_at_forty);
    // B's updates sent in rounds 40 and 41 arrive only at round 42, so A
    // simulates frames 40 and 41 on the stale prediction
    harness.schedule_b_to_a = |sent| if (40..=41).contains(&sent) { 42 } else { sent + 1 };

    for _ in 0..60 {
        harness.run_round();
    }

    // exactly one rollback on A, targeting the mis-predicted frame
    assert_eq!(harness.a.game.restores, vec![Frame::new(40)]);
    assert_eq!(harness.a.game.post_rollbacks, 1);
    assert_eq!(
        harness.a.game.resimulated,
        vec![Frame::new(40), Frame::new(41)]
    );
    // B never mis-predicted (A's inputs all arrived on time)
    assert!(harness.b.game.restores.is_empty());

    // the corrected timelines agree, including over the mis-predicted span
    assert_eq!(harness.a.game.world, harness.b.game.world);
    assert_eq!(harness.a.game.world.jumps[1], 1);
    let checksums_a = checksum_map(&harness.a.game.sent_checksums);
    let checksums_b = checksum_map(&harness.b.game.sent_checksums);
    assert_eq!(checksums_a, checksums_b);
    assert!(harness.a.game.desyncs.is_empty());
    assert!(harness.b.game.desyncs.is_empty());
}

// ==========================================
// Scenario: stall when the prediction window empties
// ==========================================

#[test]
fn suspended_deliveries_stall_at_the_window_edge() {
    let mut harness = TwoPeerHarness::new(online_settings(0), neutral_input, neutral_input);
    // B's updates after round 20 are withheld until round 32
    harness.schedule_b_to_a = |sent| if sent > 20 { 32 } else { sent + 1 };

    // frames 0..=30 proceed: confirmed through 20, predicted beyond
    for expected in 0..=30_u32 {
        let (outcome_a, _outcome_b) = harness.run_round();
        assert_eq!(
            outcome_a,
            AdvanceOutcome::Proceeded {
                frame: Frame::new(expected)
            },
            "frame {expected} should proceed"
        );
    }

    // frame 31 is beyond 20 + MAX_ROLLBACK: stall, naming the remote spot
    let (outcome_a, _outcome_b) = harness.run_round();
    let AdvanceOutcome::Stalled { stall } = outcome_a else {
        panic!("expected a stall at frame 31, got {outcome_a:?}");
    };
    assert_eq!(stall.waiting_on.len(), 1);
    let waiting = stall.waiting_on.get(0).expect("one blocking player");
    assert_eq!(waiting.spot, PlayerSpot::Player2);
    assert_eq!(waiting.last_frame_received, Some(Frame::new(20)));
    assert_eq!(harness.a.game.stalls.len(), 1);

    // deliveries resume: the stall clears within one tick, no rollback
    let (outcome_a, _outcome_b) = harness.run_round();
    assert_eq!(
        outcome_a,
        AdvanceOutcome::Proceeded {
            frame: Frame::new(31)
        }
    );
    assert!(harness.a.game.restores.is_empty());
    assert_eq!(harness.a.game.post_rollbacks, 0);
}

// ==========================================
// Scenario: lockstep
// ==========================================

#[test]
fn lockstep_waits_for_every_confirmed_input() {
    let settings = RollbackSettings {
        local_input_delay: 0,
        online_input_delay: 1,
        use_lockstep: true,
        use_sync_test: false,
    };
    let mut harness = TwoPeerHarness::new(settings, attack_every_five_from_fifteen, neutral_input);

    // round 0: both sides have stored and broadcast their delayed frame-0
    // input but hold no confirmed remote input yet
    let (outcome_a, outcome_b) = harness.run_round();
    assert!(matches!(outcome_a, AdvanceOutcome::Stalled { .. }));
    assert!(matches!(outcome_b, AdvanceOutcome::Stalled { .. }));

    // from then on, every round advances exactly one fully confirmed frame
    for expected in 0..40_u32 {
        let (outcome_a, outcome_b) = harness.run_round();
        assert_eq!(
            outcome_a,
            AdvanceOutcome::Proceeded {
                frame: Frame::new(expected)
            }
        );
        assert_eq!(
            outcome_b,
            AdvanceOutcome::Proceeded {
                frame: Frame::new(expected)
            }
        );
    }

    // lockstep never predicts, so nothing ever rolls back
    assert!(harness.a.game.restores.is_empty());
    assert!(harness.b.game.restores.is_empty());
    assert_eq!(harness.a.game.world, harness.b.game.world);
    assert_eq!(
        checksum_map(&harness.a.game.sent_checksums),
        checksum_map(&harness.b.game.sent_checksums)
    );
}

// ==========================================
// Scenario: peer too far behind
// ==========================================

#[test]
fn input_below_the_confirmation_horizon_is_fatal() {
    let mut harness = TwoPeerHarness::new(online_settings(0), neutral_input, neutral_input);
    for _ in 0..26 {
        harness.run_round();
    }
    // frames confirmed through 14 by now (25 − MAX_ROLLBACK − 1)
    assert_eq!(
        harness.a.controller.confirmed_frame(),
        Some(Frame::new(14))
    );

    let stale = InputUpdate {
        update_frame: Frame::new(10),
        inputs: [CharacterInput::default(); MAX_ROLLBACK as usize],
    };
    let result = harness
        .a
        .controller
        .handle_input_update(PlayerSpot::Player2, &stale);
    assert_eq!(
        result,
        Err(NetcodeError::PeerTooFarBehind {
            spot: PlayerSpot::Player2,
            update_frame: Frame::new(10),
            confirmed_frame: Frame::new(14),
        })
    );
    // no snapshot was restored
    assert!(harness.a.game.restores.is_empty());
    // the session itself is still advanceable; termination is the host's call
    let (outcome_a, _outcome_b) = harness.run_round();
    assert!(matches!(outcome_a, AdvanceOutcome::Proceeded { .. }));
}

// ==========================================
// Scenario: desync detection
// ==========================================

#[test]
fn corrupted_state_is_reported_by_the_non_host() {
    let mut harness = TwoPeerHarness::new(online_settings(0), neutral_input, neutral_input);
    // the host's state entering frame 30 silently diverges
    harness.a.game.corrupt_state_entering = Some(30);

    for _ in 0..60 {
        harness.run_round();
    }

    // the checksum streams first disagree exactly at frame 30
    let checksums_a = checksum_map(&harness.a.game.sent_checksums);
    let checksums_b = checksum_map(&harness.b.game.sent_checksums);
    for ((frame_a, sum_a), (frame_b, sum_b)) in checksums_a.iter().zip(checksums_b.iter()) {
        assert_eq!(frame_a, frame_b);
        if *frame_a < 30 {
            assert_eq!(sum_a, sum_b, "frame {frame_a} should still agree");
        } else {
            assert_ne!(sum_a, sum_b, "frame {frame_a} should diverge");
        }
    }

    // the non-host (B) observed the divergence; the host compares nothing
    assert!(!harness.b.game.desyncs.is_empty());
    assert_eq!(harness.b.game.desyncs[0].0, Frame::new(30));
    assert!(harness.a.game.desyncs.is_empty());
    // reporting is diagnostic only: the session kept running
    assert!(matches!(
        harness.b.controller.phase(),
        SessionPhase::Running
    ));
}

// ==========================================
// Scenario: effects across rollback
// ==========================================

fn local_jump_at_fifty(frame: u32) -> CharacterInput {
    let mut input = CharacterInput::default();
    if frame == 50 {
        input.commands = CommandButtons::JUMP;
    }
    input
}

fn remote_attack_at_forty_eight(frame: u32) -> CharacterInput {
    let mut input = CharacterInput::default();
    if frame == 48 {
        input.commands = CommandButtons::ATTACK;
    }
    input
}

#[test]
fn effect_respawned_during_replay_is_continuing_not_new() {
    let mut harness = TwoPeerHarness::new(
        online_settings(0),
        local_jump_at_fifty,
        remote_attack_at_forty_eight,
    );
    // B's updates for rounds 48..=52 arrive only at round 53: A simulates
    // 48..=52 on predictions, mis-predicting B's attack at 48
    harness.schedule_b_to_a = |sent| if (48..=52).contains(&sent) { 53 } else { sent + 1 };

    for _ in 0..=53 {
        harness.run_round();
    }

    // the correction rolled A back to 48 at wall-clock frame 53
    assert_eq!(harness.a.game.restores, vec![Frame::new(48)]);
    assert_eq!(
        harness.a.game.resimulated,
        (48..=52).map(Frame::new).collect::<Vec<_>>()
    );

    // the replay re-spawned the frame-50 effect; at the present frame (53)
    // it reads as already-running, not as a fresh trigger
    let events = harness.a.controller.current_frame_events();
    let effect = StubEffect { id: 7 };
    assert!(!events.new_events.contains(&effect));
    assert!(events.past_continuing_events.contains(&effect));

    // and the spawn frame still lists it exactly once as new
    let spawn_slot = harness.a.controller.effects().events_at(-3);
    assert_eq!(spawn_slot.new_events.len(), 1);
    assert!(spawn_slot.new_events.contains(&effect));

    // both timelines agree after the correction
    assert_eq!(harness.a.game.world, harness.b.game.world);
    assert_eq!(harness.a.game.world.attacks_landed[1], 1);
}
