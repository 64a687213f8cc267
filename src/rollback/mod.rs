//! The rollback core: bounded storage for inputs and snapshots, desync
//! checking, effect tracking, and the controller state machine that ties
//! them to the host through [`RollbackUser`].

pub mod controller;
pub mod desync;
pub mod event_tracker;
pub mod input_manager;
pub mod per_player_inputs;
pub mod settings;
pub mod snapshot_store;
pub mod user;

pub use controller::{AdvanceOutcome, ControllerMode, RollbackController, SessionPhase};
pub use desync::DesyncChecker;
pub use event_tracker::{EffectsForFrame, EventTracker};
pub use input_manager::InputManager;
pub use per_player_inputs::{InputKind, PerPlayerInputs};
pub use settings::{RollbackSettings, SessionInfo, StallInfo, StallPlayerInfo};
pub use snapshot_store::SnapshotStore;
pub use user::RollbackUser;
