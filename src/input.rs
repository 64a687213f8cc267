//! The per-frame, per-player input record and its aggregates.
//!
//! [`CharacterInput`] is the only game-related data that crosses the network,
//! so it is built exclusively from exactly-comparable, hashable parts: fixed
//! point scalars, a small enum, and a packed bitset. Two inputs are equal iff
//! they are byte-for-byte the same choice by the player.

use serde::{Deserialize, Serialize};

use crate::containers::FlexArray;
use crate::math::{Fx, FxQuat, FxVec3};
use crate::{MAX_PLAYERS, MAX_ROLLBACK};

/// One entry per command the game exposes, packed into a `u32`.
///
/// The bit assignments are part of the wire/replay contract; append new
/// commands, never renumber existing ones.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct CommandButtons(u32);

impl CommandButtons {
    /// No commands held.
    pub const NONE: CommandButtons = CommandButtons(0);
    /// Jump command.
    pub const JUMP: CommandButtons = CommandButtons(1 << 0);
    /// Primary attack command.
    pub const ATTACK: CommandButtons = CommandButtons(1 << 1);
    /// Block/guard command.
    pub const BLOCK: CommandButtons = CommandButtons(1 << 2);
    /// Dash/evade command.
    pub const DASH: CommandButtons = CommandButtons(1 << 3);
    /// Sprint modifier.
    pub const SPRINT: CommandButtons = CommandButtons(1 << 4);
    /// Crouch command.
    pub const CROUCH: CommandButtons = CommandButtons(1 << 5);
    /// Context interact command.
    pub const INTERACT: CommandButtons = CommandButtons(1 << 6);
    /// Grapple command.
    pub const GRAPPLE: CommandButtons = CommandButtons(1 << 7);

    /// Raw bit representation.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Reconstructs from raw bits (replay/wire decode path).
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        CommandButtons(bits)
    }

    /// True when every bit of `command` is held.
    #[inline]
    #[must_use]
    pub const fn is_pressed(self, command: CommandButtons) -> bool {
        self.0 & command.0 == command.0
    }

    /// Returns self with `command` held.
    #[inline]
    #[must_use]
    pub const fn with(self, command: CommandButtons) -> Self {
        CommandButtons(self.0 | command.0)
    }

    /// Returns self with `command` released.
    #[inline]
    #[must_use]
    pub const fn without(self, command: CommandButtons) -> Self {
        CommandButtons(self.0 & !command.0)
    }

    /// True when no commands are held.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for CommandButtons {
    type Output = CommandButtons;

    #[inline]
    fn bitor(self, rhs: CommandButtons) -> CommandButtons {
        CommandButtons(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for CommandButtons {
    #[inline]
    fn bitor_assign(&mut self, rhs: CommandButtons) {
        self.0 |= rhs.0;
    }
}

/// Which interactive UI option the player committed to this frame, if any.
///
/// Menu-style choices ride the input stream like any other command so that
/// both peers resolve them on the same frame.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum UiChoice {
    /// No choice made this frame.
    #[default]
    None,
    /// First presented option.
    OptionA,
    /// Second presented option.
    OptionB,
    /// Third presented option.
    OptionC,
    /// Fourth presented option.
    OptionD,
    /// Fifth presented option.
    OptionE,
}

/// Everything a player expressed in one frame.
///
/// Move axes are expected in `[-1, 1]`; the camera pose feeds aim-dependent
/// gameplay. All fields are exactly comparable; prediction correctness is
/// decided by `==` on this type.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct CharacterInput {
    /// Camera position driving aim traces.
    pub cam_position: FxVec3,
    /// Camera orientation driving aim traces.
    pub cam_rotation: FxQuat,
    /// Forward/backward move axis in `[-1, 1]`.
    pub move_forward: Fx,
    /// Right/left move axis in `[-1, 1]`.
    pub move_right: Fx,
    /// Interactive UI choice committed this frame.
    pub ui_choice: UiChoice,
    /// Held logical commands.
    pub commands: CommandButtons,
}

/// Spot-ordered inputs for one frame: index = spot index.
pub type PlayerInputsForFrame = FlexArray<CharacterInput, MAX_PLAYERS>;

/// The redundant input window carried by every input update message.
///
/// Index 0 is the message's frame; index `i` is that frame minus `i`. Losing
/// any single packet is harmless as long as one of the next `MAX_ROLLBACK`
/// arrives.
pub type InputHistoryArray = [CharacterInput; MAX_ROLLBACK as usize];

// #########
// # TESTS #
// #########
