//! Session controller: plan and role computation, round advancement and the
//! pause between blocks.

use serde::Serialize;

use crate::blocks::{validate_blocks, BlockRecord, RoundPlan, Vp};
use crate::error::{TabletopError, TabletopResult};
use crate::state::{Roles, SessionState, StartMode, NO_PAUSE_MESSAGE};

pub const BLOCK_PAUSE_MESSAGE: &str = "Dieser Block ist vorbei. Nehmen Sie sich einen Moment zum Durchatmen.\n\
Wenn Sie bereit sind, klicken Sie auf Weiter.";

// ---------------------------------------------------------------------------
// Counterbalancing rule
// ---------------------------------------------------------------------------

/// Blocks 2 and 3 run with hands and leadership exchanged between vp1 and
/// vp2. Applies to these two indices only, whatever the block count.
pub fn is_swap_block(index: u32) -> bool {
    matches!(index, 2 | 3)
}

pub fn block_leader(index: u32) -> Vp {
    if is_swap_block(index) {
        Vp::Vp2
    } else {
        Vp::Vp1
    }
}

pub fn roles_for_block(index: u32) -> Roles {
    Roles::led_by(block_leader(index))
}

/// Plan of `round_idx` in `block` as it is dealt, with the swap applied.
pub fn effective_plan(block: &BlockRecord, round_idx: usize) -> Option<RoundPlan> {
    let stored = block.round(round_idx)?;
    if is_swap_block(block.index) {
        Some(stored.swapped())
    } else {
        Some(*stored)
    }
}

// ---------------------------------------------------------------------------
// Snapshot handed to the view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSnapshot {
    pub block_idx: usize,
    pub round_idx: usize,
    pub block_index: u32,
    pub practice: bool,
    pub round_in_block: usize,
    pub total_rounds: usize,
    pub roles: Roles,
    /// `None` once the session is finished.
    pub plan: Option<RoundPlan>,
    pub in_block_pause: bool,
    pub pause_message: String,
    pub session_finished: bool,
    pub start_immediately: bool,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct SessionController {
    state: SessionState,
}

impl SessionController {
    pub fn new(blocks: Vec<BlockRecord>, start_mode: StartMode) -> TabletopResult<Self> {
        validate_blocks(&blocks)?;
        let mut controller = SessionController {
            state: SessionState::new(blocks, start_mode),
        };
        controller.setup_round()?;
        Ok(controller)
    }

    /// Build a controller from an unparsed start mode, as supplied on the
    /// command line.
    pub fn from_config(blocks: Vec<BlockRecord>, start_mode: &str) -> TabletopResult<Self> {
        let mode: StartMode = start_mode.parse()?;
        Self::new(blocks, mode)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn no_active_round(&self) -> TabletopError {
        TabletopError::NoActiveRound {
            block_idx: self.state.current_block_idx,
            round_idx: self.state.current_round_idx,
        }
    }

    /// Current block together with the plan as dealt for the current round.
    pub fn get_current_plan(&self) -> TabletopResult<(&BlockRecord, RoundPlan)> {
        let block = self
            .state
            .blocks
            .get(self.state.current_block_idx)
            .ok_or_else(|| self.no_active_round())?;
        let plan = effective_plan(block, self.state.current_round_idx)
            .ok_or_else(|| self.no_active_round())?;
        Ok((block, plan))
    }

    /// Assign roles for the round under the cursors and cache its plan.
    pub fn setup_round(&mut self) -> TabletopResult<Roles> {
        let (block, plan) = self.get_current_plan()?;
        let index = block.index;
        let roles = roles_for_block(index);
        self.state.roles = roles;
        self.state.current_plan = Some(plan);
        log::debug!(
            "block {} round {}: signaler {} judge {}",
            index,
            self.state.round_in_block(),
            roles.signaler,
            roles.judge
        );
        Ok(roles)
    }

    /// Move both cursors and recompute plan and roles in one step.
    fn place(&mut self, block_idx: usize, round_idx: usize) -> TabletopResult<()> {
        let block = self
            .state
            .blocks
            .get(block_idx)
            .ok_or(TabletopError::NoActiveRound { block_idx, round_idx })?;
        let plan = effective_plan(block, round_idx)
            .ok_or(TabletopError::NoActiveRound { block_idx, round_idx })?;
        let roles = roles_for_block(block.index);

        self.state.current_block_idx = block_idx;
        self.state.current_round_idx = round_idx;
        self.state.current_plan = Some(plan);
        self.state.roles = roles;
        Ok(())
    }

    /// Advance to the next round.
    ///
    /// At the end of a block the cursors move to the first round of the next
    /// block and the session enters the block pause; at the end of the last
    /// block the session is marked finished. While paused, this ends the
    /// pause without moving the cursors again.
    pub fn prepare_next_round(&mut self, start_immediately: bool) -> TabletopResult<RoundSnapshot> {
        if self.state.session_finished {
            return Ok(self.snapshot_with(start_immediately));
        }
        if self.state.in_block_pause {
            self.end_pause();
            return Ok(self.snapshot_with(start_immediately));
        }

        let block_idx = self.state.current_block_idx;
        if self.state.has_next_round() {
            self.place(block_idx, self.state.current_round_idx + 1)?;
            self.state.in_block_pause = false;
        } else if !self.state.is_last_block() {
            self.place(block_idx + 1, 0)?;
            self.state.in_block_pause = true;
            self.state.pause_message = BLOCK_PAUSE_MESSAGE.to_string();
            log::info!(
                "block {} finished, pausing before block {}",
                self.state.blocks[block_idx].index,
                self.state.blocks[block_idx + 1].index
            );
        } else {
            self.state.session_finished = true;
            self.state.in_block_pause = false;
            self.state.pause_message = NO_PAUSE_MESSAGE.to_string();
            self.state.current_plan = None;
            log::info!("session finished after {} blocks", self.state.blocks.len());
        }
        Ok(self.snapshot_with(start_immediately))
    }

    /// Leave the block pause. The upcoming round was prepared when the pause
    /// began, so only the flags change.
    pub fn resume(&mut self) -> RoundSnapshot {
        if self.state.in_block_pause {
            self.end_pause();
        }
        self.snapshot()
    }

    fn end_pause(&mut self) {
        self.state.in_block_pause = false;
        self.state.pause_message = NO_PAUSE_MESSAGE.to_string();
        if let Some(block) = self.state.current_block() {
            log::info!("resuming with block {}", block.index);
        }
    }

    /// Place the cursors explicitly, e.g. to resume a session at a later
    /// block. Clears the pause and finished flags.
    pub fn jump_to(&mut self, block_idx: usize, round_idx: usize) -> TabletopResult<RoundSnapshot> {
        self.place(block_idx, round_idx)?;
        self.state.in_block_pause = false;
        self.state.pause_message = NO_PAUSE_MESSAGE.to_string();
        self.state.session_finished = false;
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        self.snapshot_with(false)
    }

    fn snapshot_with(&self, start_immediately: bool) -> RoundSnapshot {
        let state = &self.state;
        let block = state.current_block();
        RoundSnapshot {
            block_idx: state.current_block_idx,
            round_idx: state.current_round_idx,
            block_index: block.map(|b| b.index).unwrap_or(0),
            practice: block.map(|b| b.practice).unwrap_or(false),
            round_in_block: state.round_in_block(),
            total_rounds: state.current_block_total_rounds(),
            roles: state.roles,
            plan: state.current_plan,
            in_block_pause: state.in_block_pause,
            pause_message: state.pause_message.clone(),
            session_finished: state.session_finished,
            start_immediately,
        }
    }
}
