//! Wire message shapes.
//!
//! The transport layer owns delivery; the core owns these shapes. Every
//! message is fixed-size after encoding (fixed-integer bincode, fixed-length
//! arrays) so the transport can budget bandwidth and so nothing on the wire
//! depends on allocator or platform behavior.

use serde::{Deserialize, Serialize};

use super::spot_mapping::PeerId;
use crate::input::InputHistoryArray;
use crate::{Frame, MAX_PLAYERS};

/// Delivery class a message requires from the transport.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// Loss and reordering are tolerated by the protocol on top.
    UnreliableUnordered,
    /// Must arrive, in order.
    ReliableOrdered,
}

/// Broadcast of one player's recent inputs.
///
/// Index 0 of `inputs` is the input for `update_frame`; index `i` is for
/// `update_frame − i`. The redundant window means the stream tolerates loss:
/// any later update re-carries the missing frames.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputUpdate {
    /// Newest frame carried by this update.
    pub update_frame: Frame,
    /// Inputs for `update_frame`, `update_frame − 1`, …, newest first.
    pub inputs: InputHistoryArray,
}

impl InputUpdate {
    /// The input carried for `frame`, if this update covers it.
    #[must_use]
    pub fn input_for(&self, frame: Frame) -> Option<&crate::input::CharacterInput> {
        let back = self.update_frame.delta(frame);
        if back < 0 {
            return None;
        }
        self.inputs.get(back as usize)
    }

    /// The oldest frame carried by this update.
    #[must_use]
    pub fn oldest_frame(&self) -> Frame {
        self.update_frame.offset(-(self.inputs.len() as i32 - 1))
    }
}

/// Timing probe used for clock-drift management between peers.
///
/// `ping` is an opaque local timestamp; the receiving peer echoes it back in
/// a [`TimeQualityResponse`] untouched.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeQualityReport {
    /// Frame the sender was on when it sent the report.
    pub frame: Frame,
    /// Opaque sender timestamp, echoed back verbatim.
    pub ping: u64,
}

/// Echo of a [`TimeQualityReport`]'s timestamp.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeQualityResponse {
    /// The `ping` value from the report being answered.
    pub pong: u64,
}

/// State checksum for a fully confirmed frame, broadcast for desync
/// detection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationChecksum {
    /// The confirmed frame the checksum describes.
    pub frame: Frame,
    /// Deterministic checksum of the frame's snapshot.
    pub checksum: u32,
}

/// Agreed seat assignment for the session.
///
/// Each peer may learn of network players in a different order, so the host
/// broadcasts one canonical spot order. Fixed size on the wire: unused
/// entries are zeroed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSpotMapping {
    /// Number of players in the session.
    pub total_players: u8,
    /// Peer id per spot, in spot order; entries at `total_players` and
    /// beyond are [`PeerId::ZERO`].
    pub player_ids: [PeerId; MAX_PLAYERS],
}

/// Umbrella over every message the core shapes.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum NetMessage {
    /// Input broadcast.
    InputUpdate(InputUpdate),
    /// Timing probe.
    TimeQualityReport(TimeQualityReport),
    /// Timing probe echo.
    TimeQualityResponse(TimeQualityResponse),
    /// Confirmed-frame checksum.
    ValidationChecksum(ValidationChecksum),
    /// Seat assignment.
    PlayerSpotMapping(PlayerSpotMapping),
}

impl NetMessage {
    /// The delivery class the transport must provide for this message.
    ///
    /// Input updates tolerate loss thanks to the redundant history window,
    /// except under lockstep, where the host should upgrade them to reliable
    /// delivery because no prediction covers a gap.
    #[must_use]
    pub fn delivery(&self) -> Delivery {
        match self {
            NetMessage::InputUpdate(_)
            | NetMessage::TimeQualityReport(_)
            | NetMessage::TimeQualityResponse(_) => Delivery::UnreliableUnordered,
            NetMessage::ValidationChecksum(_) | NetMessage::PlayerSpotMapping(_) => {
                Delivery::ReliableOrdered
            },
        }
    }
}

// #########
// # TESTS #
// #########
