//! Convenient re-exports for common usage.
//!
//! ```rust
//! use rampart::prelude::*;
//! ```

pub use crate::checksum::{checksum_of, serialized_checksum};
pub use crate::containers::{FlexArray, RingBuffer};
pub use crate::error::{NetcodeError, NetcodeResult, SessionConfigError};
pub use crate::input::{
    CharacterInput, CommandButtons, InputHistoryArray, PlayerInputsForFrame, UiChoice,
};
pub use crate::math::{Fx, FxQuat, FxVec3};
pub use crate::net::{
    Delivery, InputUpdate, NetMessage, PeerId, PlayerSpotMapping, SpotMapping, TimeQualityReport,
    TimeQualityResponse, ValidationChecksum,
};
pub use crate::rollback::{
    AdvanceOutcome, ControllerMode, InputKind, RollbackController, RollbackSettings, RollbackUser,
    SessionInfo, SessionPhase, StallInfo, StallPlayerInfo,
};
pub use crate::time_quality::TimeQuality;
pub use crate::{Config, Frame, PlayerSpot, MAX_INPUT_DELAY, MAX_PLAYERS, MAX_ROLLBACK};
