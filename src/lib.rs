//! # Rampart
//!
//! Rampart is the deterministic rollback netcode core of a peer-to-peer
//! multiplayer game: it keeps independently simulating clients synchronized
//! to bit-exact state while masking network latency.
//!
//! The crate owns the hard, game-agnostic parts:
//!
//! - a sliding window of locally computed simulation snapshots,
//! - confirmed and predicted player inputs,
//! - the per-tick decision to advance, stall, or roll back, and
//! - the replay loop that re-simulates after a mis-predicted input is
//!   corrected.
//!
//! The game itself, the transport, the renderer, and persistence all sit
//! behind the [`RollbackUser`](rollback::RollbackUser) callback trait and the
//! wire shapes in [`net`]. The controller never opens a socket, never reads a
//! clock on the simulation path, and never throws: every operation reports
//! by return value.
//!
//! Determinism rests on the fixed-point substrate in [`math`] (all
//! simulation-visible numbers are [`Fx`](math::Fx) values with exact bit
//! equality) and on the deterministic checksums in [`checksum`] that peers
//! exchange to detect divergence.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use serde::{Deserialize, Serialize};

pub mod checksum;
pub mod containers;
pub mod error;
pub mod input;
pub mod math;
pub mod net;
pub mod prelude;
pub mod rollback;
pub mod telemetry;
pub mod time_quality;

pub use error::{NetcodeError, NetcodeResult, SessionConfigError};

// #############
// # CONSTANTS #
// #############

/// Maximum number of simulating players in a session.
///
/// Compile-time constant that must agree across all peers. The spectator
/// spot exists beyond these and never participates in simulation.
pub const MAX_PLAYERS: usize = 4;

/// Maximum number of frames the simulation may run ahead of confirmed remote
/// input, and therefore the farthest back a rollback can reach.
///
/// Compile-time constant that must agree across all peers: it sizes the
/// redundant input history on the wire.
pub const MAX_ROLLBACK: u32 = 10;

/// Maximum supported input delay, in frames.
///
/// Compile-time constant that must agree across all peers.
pub const MAX_INPUT_DELAY: u32 = 10;

// #########
// # FRAME #
// #########

/// A single step of simulation time.
///
/// Frames are unsigned 32-bit and **wrap-around is tolerated**: all window
/// logic compares frames through [`Frame::delta`], a signed recency
/// difference, never through naive `<`. Sessions begin at frame 0; the
/// pre-session sentinel [`Frame::PRE_SESSION`] is `u32::MAX`, whose successor
/// wraps to 0.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct Frame(u32);

impl Frame {
    /// The frame "before" frame 0: the value of `last_processed_frame`
    /// before the first tick of a session.
    pub const PRE_SESSION: Frame = Frame(u32::MAX);

    /// Creates a frame from its number.
    #[inline]
    #[must_use]
    pub const fn new(number: u32) -> Self {
        Frame(number)
    }

    /// The underlying frame number.
    #[inline]
    #[must_use]
    pub const fn number(self) -> u32 {
        self.0
    }

    /// The next frame (wrapping).
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Frame(self.0.wrapping_add(1))
    }

    /// The previous frame (wrapping).
    #[inline]
    #[must_use]
    pub const fn previous(self) -> Self {
        Frame(self.0.wrapping_sub(1))
    }

    /// This frame shifted by a signed number of frames (wrapping).
    #[inline]
    #[must_use]
    pub const fn offset(self, frames: i32) -> Self {
        Frame(self.0.wrapping_add(frames as u32))
    }

    /// Signed recency difference `self − other`.
    ///
    /// Positive when `self` is more recent than `other`. Correct across
    /// 32-bit wrap as long as the two frames are within 2^31 of each other,
    /// which every window in this crate guarantees by construction.
    #[inline]
    #[must_use]
    pub const fn delta(self, other: Frame) -> i32 {
        self.0.wrapping_sub(other.0) as i32
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Frame::PRE_SESSION {
            write!(f, "pre-session")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u32> for Frame {
    #[inline]
    fn from(number: u32) -> Self {
        Frame(number)
    }
}

impl From<Frame> for u32 {
    #[inline]
    fn from(frame: Frame) -> Self {
        frame.0
    }
}

// ###############
// # PLAYER SPOT #
// ###############

/// A seat within a session.
///
/// Spots are session-level identities: each peer may see network players in
/// a different order, but every peer agrees on who holds which spot (see
/// [`net::spot_mapping`]). The spectator spot can tag observers but never
/// participates in simulation.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum PlayerSpot {
    /// First player seat. By convention, the session host.
    #[default]
    Player1,
    /// Second player seat.
    Player2,
    /// Third player seat.
    Player3,
    /// Fourth player seat.
    Player4,
    /// A non-simulating observer.
    Spectator,
}

impl PlayerSpot {
    /// The zero-based index of a player seat, or `None` for the spectator.
    #[inline]
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            PlayerSpot::Player1 => Some(0),
            PlayerSpot::Player2 => Some(1),
            PlayerSpot::Player3 => Some(2),
            PlayerSpot::Player4 => Some(3),
            PlayerSpot::Spectator => None,
        }
    }

    /// The player seat at a zero-based index.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PlayerSpot::Player1),
            1 => Some(PlayerSpot::Player2),
            2 => Some(PlayerSpot::Player3),
            3 => Some(PlayerSpot::Player4),
            _ => None,
        }
    }

    /// True for the four player seats, false for the spectator.
    #[inline]
    #[must_use]
    pub const fn is_player(self) -> bool {
        !matches!(self, PlayerSpot::Spectator)
    }

    /// True when this is a player seat within a session of `total_players`.
    #[must_use]
    pub fn is_within_total(self, total_players: u8) -> bool {
        match self.index() {
            Some(index) => (index as u8) < total_players,
            None => false,
        }
    }

    /// Validates a session player count.
    #[must_use]
    pub const fn is_valid_total(total_players: u8) -> bool {
        total_players >= 1 && (total_players as usize) <= MAX_PLAYERS
    }

    /// Iterates the player seats of a session in spot order.
    pub fn players(total_players: u8) -> impl Iterator<Item = PlayerSpot> {
        (0..usize::from(total_players)).filter_map(PlayerSpot::from_index)
    }
}

impl std::fmt::Display for PlayerSpot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerSpot::Player1 => write!(f, "P1"),
            PlayerSpot::Player2 => write!(f, "P2"),
            PlayerSpot::Player3 => write!(f, "P3"),
            PlayerSpot::Player4 => write!(f, "P4"),
            PlayerSpot::Spectator => write!(f, "spectator"),
        }
    }
}

// ##########
// # CONFIG #
// ##########

/// Compile-time parameterization of a session.
///
/// Bundles the host-defined types the core stores on the host's behalf.
/// Implement it on a marker struct:
///
/// ```
/// use rampart::Config;
///
/// #[derive(Clone, Default, Hash)]
/// struct WorldSnapshot {
///     frame: u32,
///     positions: [(i64, i64); 2],
/// }
///
/// #[derive(Copy, Clone, Default, PartialEq)]
/// struct HitEffect {
///     kind: u8,
/// }
///
/// struct GameSession;
///
/// impl Config for GameSession {
///     type Snapshot = WorldSnapshot;
///     type Effect = HitEffect;
/// }
/// ```
pub trait Config: 'static {
    /// Complete, self-contained record of the simulation state entering a
    /// frame. Value-copied on restore and byte-hashed for desync detection,
    /// so it must be plain data: no pointers into shared structures; flatten
    /// any graphs to indices.
    type Snapshot: Clone + Default + std::hash::Hash;

    /// Identifier (plus pose, if the host wants one) of an event-driven
    /// effect, tracked across the rollback window so the renderer can tell
    /// replayed effects from new ones.
    type Effect: Copy + Default + PartialEq;
}

// #########
// # TESTS #
// #########

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod frame_tests {
    use super::*;

    #[test]
    fn next_and_previous_are_inverse() {
        let f = Frame::new(41);
        assert_eq!(f.next(), Frame::new(42));
        assert_eq!(f.next().previous(), f);
    }

    #[test]
    fn pre_session_successor_is_frame_zero() {
        assert_eq!(Frame::PRE_SESSION.next(), Frame::new(0));
        assert_eq!(Frame::new(0).previous(), Frame::PRE_SESSION);
    }

    #[test]
    fn delta_is_signed_recency() {
        assert_eq!(Frame::new(10).delta(Frame::new(7)), 3);
        assert_eq!(Frame::new(7).delta(Frame::new(10)), -3);
        assert_eq!(Frame::new(5).delta(Frame::new(5)), 0);
    }

    #[test]
    fn delta_survives_wraparound() {
        let before_wrap = Frame::new(u32::MAX - 1);
        let after_wrap = before_wrap.offset(5);
        assert_eq!(after_wrap, Frame::new(3));
        assert_eq!(after_wrap.delta(before_wrap), 5);
        assert_eq!(before_wrap.delta(after_wrap), -5);
    }

    #[test]
    fn offset_accepts_negative_shifts() {
        assert_eq!(Frame::new(10).offset(-4), Frame::new(6));
        assert_eq!(Frame::new(2).offset(-5), Frame::new(u32::MAX - 2));
    }

    #[test]
    fn display_marks_pre_session() {
        assert_eq!(Frame::new(17).to_string(), "17");
        assert_eq!(Frame::PRE_SESSION.to_string(), "pre-session");
    }
}
