//! Seat assignment shared by all peers.
//!
//! Transports identify peers by their own notion of identity; the simulation
//! identifies them by [`PlayerSpot`]. Each peer may learn of the others in a
//! different order, so one canonical mapping is agreed (host-authored,
//! broadcast via [`PlayerSpotMapping`](super::messages::PlayerSpotMapping))
//! and then locked for the duration of the match.

use serde::{Deserialize, Serialize};

use crate::{PlayerSpot, MAX_PLAYERS};

/// Opaque transport-level player identity.
///
/// Whatever the transport uses natively (a platform account id, a connection
/// hash) is reduced to this fixed-size value for the wire. Zero is reserved
/// for "no peer".
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct PeerId(
    /// Raw identity bits; zero is reserved.
    pub u64,
);

impl PeerId {
    /// The reserved "no peer" id used to zero unused wire slots.
    pub const ZERO: PeerId = PeerId(0);

    /// True for the reserved empty id.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Errors from building or querying the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpotMappingError {
    /// The mapping is locked against further changes.
    Locked,
    /// Player count outside `1..=MAX_PLAYERS`.
    InvalidTotalPlayers {
        /// The rejected count.
        total_players: usize,
    },
    /// The local peer id did not appear in the ordered id list.
    LocalPeerMissing,
    /// The same peer id appeared in more than one slot.
    DuplicatePeer {
        /// The duplicated id.
        peer: PeerId,
    },
    /// Queried before a mapping was set.
    NotSet,
}

impl std::fmt::Display for SpotMappingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "spot mapping is locked"),
            Self::InvalidTotalPlayers { total_players } => {
                write!(
                    f,
                    "invalid player count {} (expected 1..={})",
                    total_players, MAX_PLAYERS
                )
            },
            Self::LocalPeerMissing => {
                write!(f, "local peer id not present in the mapping")
            },
            Self::DuplicatePeer { peer } => {
                write!(f, "peer id {} appears more than once", peer)
            },
            Self::NotSet => write!(f, "spot mapping not set"),
        }
    }
}

impl std::error::Error for SpotMappingError {}

/// The canonical peer-id-per-spot table for a session.
#[derive(Debug, Clone, Default)]
pub struct SpotMapping {
    is_set: bool,
    is_locked: bool,
    total_players: u8,
    local_spot: PlayerSpot,
    ids: [PeerId; MAX_PLAYERS],
}

impl SpotMapping {
    /// Creates an empty, unlocked mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a mapping has been successfully set.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.is_set
    }

    /// True while the mapping rejects changes.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.is_locked
    }

    /// Locks or unlocks the mapping. Lock before gameplay starts; the table
    /// must not shift under a running session.
    pub fn set_locked(&mut self, locked: bool) {
        self.is_locked = locked;
    }

    /// Installs the canonical mapping: `ids_in_spot_order[i]` holds spot `i`.
    ///
    /// # Errors
    ///
    /// Rejects locked mappings, invalid player counts, duplicate ids, and id
    /// lists that do not contain `local_peer`. On error the previous mapping
    /// (if any) is invalidated.
    pub fn set_mapping(
        &mut self,
        local_peer: PeerId,
        ids_in_spot_order: &[PeerId],
    ) -> Result<(), SpotMappingError> {
        if self.is_locked {
            return Err(SpotMappingError::Locked);
        }
        // invalidate until we succeed, like any other half-applied update
        self.is_set = false;

        if ids_in_spot_order.is_empty() || ids_in_spot_order.len() > MAX_PLAYERS {
            return Err(SpotMappingError::InvalidTotalPlayers {
                total_players: ids_in_spot_order.len(),
            });
        }

        let mut local_spot = None;
        let mut ids = [PeerId::ZERO; MAX_PLAYERS];
        for (index, &peer) in ids_in_spot_order.iter().enumerate() {
            if ids[..index].contains(&peer) {
                return Err(SpotMappingError::DuplicatePeer { peer });
            }
            ids[index] = peer;
            if peer == local_peer {
                local_spot = Some(index);
            }
        }

        let Some(local_index) = local_spot else {
            return Err(SpotMappingError::LocalPeerMissing);
        };
        let Some(local_spot) = PlayerSpot::from_index(local_index) else {
            return Err(SpotMappingError::InvalidTotalPlayers {
                total_players: ids_in_spot_order.len(),
            });
        };

        self.total_players = ids_in_spot_order.len() as u8;
        self.local_spot = local_spot;
        self.ids = ids;
        self.is_set = true;
        Ok(())
    }

    /// Number of players in the mapping.
    #[must_use]
    pub const fn total_players(&self) -> u8 {
        self.total_players
    }

    /// The spot held by the local peer.
    #[must_use]
    pub const fn local_spot(&self) -> PlayerSpot {
        self.local_spot
    }

    /// Looks up the spot a peer holds.
    ///
    /// # Errors
    ///
    /// [`SpotMappingError::NotSet`] before a mapping is installed.
    pub fn spot_for_peer(&self, peer: PeerId) -> Result<Option<PlayerSpot>, SpotMappingError> {
        if !self.is_set {
            return Err(SpotMappingError::NotSet);
        }
        // linear search: total players is tiny
        for index in 0..usize::from(self.total_players) {
            if self.ids[index] == peer {
                return Ok(PlayerSpot::from_index(index));
            }
        }
        Ok(None)
    }

    /// Looks up the peer holding a spot.
    ///
    /// # Errors
    ///
    /// [`SpotMappingError::NotSet`] before a mapping is installed.
    pub fn peer_for_spot(&self, spot: PlayerSpot) -> Result<Option<PeerId>, SpotMappingError> {
        if !self.is_set {
            return Err(SpotMappingError::NotSet);
        }
        match spot.index() {
            Some(index) if index < usize::from(self.total_players) => Ok(Some(self.ids[index])),
            _ => Ok(None),
        }
    }

    /// The fixed-size wire form of this mapping.
    ///
    /// # Errors
    ///
    /// [`SpotMappingError::NotSet`] before a mapping is installed.
    pub fn to_message(&self) -> Result<super::messages::PlayerSpotMapping, SpotMappingError> {
        if !self.is_set {
            return Err(SpotMappingError::NotSet);
        }
        Ok(super::messages::PlayerSpotMapping {
            total_players: self.total_players,
            player_ids: self.ids,
        })
    }

    /// Installs a mapping received from the host.
    ///
    /// # Errors
    ///
    /// Same conditions as [`set_mapping`](Self::set_mapping).
    pub fn apply_message(
        &mut self,
        local_peer: PeerId,
        message: &super::messages::PlayerSpotMapping,
    ) -> Result<(), SpotMappingError> {
        let count = usize::from(message.total_players).min(MAX_PLAYERS);
        self.set_mapping(local_peer, &message.player_ids[..count])
    }
}

// #########
// # TESTS #
// #########
