use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::blocks::{BlockRecord, RoundPlan, Vp};
use crate::error::{TabletopError, TabletopResult};

// ---------------------------------------------------------------------------
// Start mode
// ---------------------------------------------------------------------------

/// Top-level experiment mode selected when the session is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StartMode {
    /// Unmasked condition.
    C,
    /// Masked condition.
    T,
}

impl StartMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartMode::C => "C",
            StartMode::T => "T",
        }
    }
}

impl FromStr for StartMode {
    type Err = TabletopError;

    fn from_str(s: &str) -> TabletopResult<Self> {
        match s.trim() {
            "C" => Ok(StartMode::C),
            "T" => Ok(StartMode::T),
            other => Err(TabletopError::UnknownStartMode(other.to_string())),
        }
    }
}

impl fmt::Display for StartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Which virtual player holds each role for the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Roles {
    pub signaler: Vp,
    pub judge: Vp,
    pub first_player: Vp,
    pub second_player: Vp,
}

impl Roles {
    /// Assignment where `leader` signals and plays first.
    pub fn led_by(leader: Vp) -> Self {
        Roles {
            signaler: leader,
            judge: leader.other(),
            first_player: leader,
            second_player: leader.other(),
        }
    }

    pub fn leader(&self) -> Vp {
        self.first_player
    }
}

impl Default for Roles {
    fn default() -> Self {
        Roles::led_by(Vp::Vp1)
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

pub const NO_PAUSE_MESSAGE: &str = "";

/// Position, roles and pause flags of one running session.
///
/// Only the controller mutates this; everything else reads it through the
/// accessors below.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub(crate) blocks: Vec<BlockRecord>,
    pub(crate) start_mode: StartMode,
    pub(crate) current_block_idx: usize,
    pub(crate) current_round_idx: usize,
    pub(crate) roles: Roles,
    pub(crate) current_plan: Option<RoundPlan>,
    pub(crate) in_block_pause: bool,
    pub(crate) pause_message: String,
    pub(crate) session_finished: bool,
}

impl SessionState {
    pub(crate) fn new(blocks: Vec<BlockRecord>, start_mode: StartMode) -> Self {
        SessionState {
            blocks,
            start_mode,
            current_block_idx: 0,
            current_round_idx: 0,
            roles: Roles::default(),
            current_plan: None,
            in_block_pause: false,
            pause_message: NO_PAUSE_MESSAGE.to_string(),
            session_finished: false,
        }
    }

    pub fn blocks(&self) -> &[BlockRecord] {
        &self.blocks
    }

    pub fn start_mode(&self) -> StartMode {
        self.start_mode
    }

    pub fn current_block_idx(&self) -> usize {
        self.current_block_idx
    }

    pub fn current_round_idx(&self) -> usize {
        self.current_round_idx
    }

    pub fn roles(&self) -> Roles {
        self.roles
    }

    pub fn signaler(&self) -> Vp {
        self.roles.signaler
    }

    pub fn judge(&self) -> Vp {
        self.roles.judge
    }

    pub fn first_player(&self) -> Vp {
        self.roles.first_player
    }

    pub fn second_player(&self) -> Vp {
        self.roles.second_player
    }

    /// Effective plan cached by the last round setup.
    pub fn current_plan(&self) -> Option<&RoundPlan> {
        self.current_plan.as_ref()
    }

    pub fn in_block_pause(&self) -> bool {
        self.in_block_pause
    }

    pub fn pause_message(&self) -> &str {
        &self.pause_message
    }

    pub fn session_finished(&self) -> bool {
        self.session_finished
    }

    pub fn current_block(&self) -> Option<&BlockRecord> {
        self.blocks.get(self.current_block_idx)
    }

    pub fn current_block_total_rounds(&self) -> usize {
        self.current_block().map(|b| b.total_rounds()).unwrap_or(0)
    }

    /// 1-based position of the current round within its block.
    pub fn round_in_block(&self) -> usize {
        self.current_round_idx + 1
    }

    /// The block that follows the current one, if any.
    pub fn next_block_preview(&self) -> Option<&BlockRecord> {
        self.blocks.get(self.current_block_idx + 1)
    }

    pub fn is_last_block(&self) -> bool {
        self.current_block_idx + 1 >= self.blocks.len()
    }

    pub fn has_next_round(&self) -> bool {
        self.current_round_idx + 1 < self.current_block_total_rounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_mode_parses_known_modes() {
        assert_eq!("C".parse::<StartMode>().unwrap(), StartMode::C);
        assert_eq!("T".parse::<StartMode>().unwrap(), StartMode::T);
        assert_eq!(" T\n".parse::<StartMode>().unwrap(), StartMode::T);
    }

    #[test]
    fn test_start_mode_rejects_unknown() {
        assert!(matches!(
            "X".parse::<StartMode>(),
            Err(TabletopError::UnknownStartMode(m)) if m == "X"
        ));
        assert!("".parse::<StartMode>().is_err());
        assert!("c".parse::<StartMode>().is_err());
    }

    #[test]
    fn test_roles_led_by_vp2() {
        let roles = Roles::led_by(Vp::Vp2);
        assert_eq!(roles.signaler, Vp::Vp2);
        assert_eq!(roles.judge, Vp::Vp1);
        assert_eq!(roles.first_player, Vp::Vp2);
        assert_eq!(roles.second_player, Vp::Vp1);
        assert_eq!(roles.leader(), Vp::Vp2);
    }
}
