//! Wire-facing surface of the core: message shapes, the binary codec, and
//! the peer-to-spot mapping.
//!
//! No sockets live here; the concrete transport is the host's business.
//! The core only dictates what travels and which delivery class it needs.

pub mod codec;
pub mod messages;
pub mod spot_mapping;

pub use messages::{
    Delivery, InputUpdate, NetMessage, PlayerSpotMapping, TimeQualityReport, TimeQualityResponse,
    ValidationChecksum,
};
pub use spot_mapping::{PeerId, SpotMapping};
