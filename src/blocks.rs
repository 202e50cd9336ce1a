use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{TabletopError, TabletopResult};

static DEFAULT_BLOCKS_JSON: &str = include_str!("../data/blocks.json");

static DEFAULT_BLOCKS: Lazy<Vec<BlockRecord>> = Lazy::new(|| {
    serde_json::from_str(DEFAULT_BLOCKS_JSON).expect("Failed to parse bundled block configuration")
});

// ---------------------------------------------------------------------------
// Virtual players and hands
// ---------------------------------------------------------------------------

/// Virtual player key. `Vp1` is player 1, `Vp2` is player 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vp {
    Vp1,
    Vp2,
}

impl Vp {
    pub fn number(self) -> u8 {
        match self {
            Vp::Vp1 => 1,
            Vp::Vp2 => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Vp> {
        match n {
            1 => Some(Vp::Vp1),
            2 => Some(Vp::Vp2),
            _ => None,
        }
    }

    pub fn other(self) -> Vp {
        match self {
            Vp::Vp1 => Vp::Vp2,
            Vp::Vp2 => Vp::Vp1,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Vp::Vp1 => "vp1",
            Vp::Vp2 => "vp2",
        }
    }
}

impl fmt::Display for Vp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A pair of hand values, stored in the configuration as `[a, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hand(pub u32, pub u32);

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// Hands dealt to both virtual players for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPlan {
    pub vp1: Hand,
    pub vp2: Hand,
}

impl RoundPlan {
    pub fn new(vp1: Hand, vp2: Hand) -> Self {
        RoundPlan { vp1, vp2 }
    }

    pub fn hand(&self, vp: Vp) -> Hand {
        match vp {
            Vp::Vp1 => self.vp1,
            Vp::Vp2 => self.vp2,
        }
    }

    /// Copy of this plan with the vp1 and vp2 hands exchanged.
    pub fn swapped(&self) -> RoundPlan {
        RoundPlan {
            vp1: self.vp2,
            vp2: self.vp1,
        }
    }
}

// ---------------------------------------------------------------------------
// Block records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub index: u32,
    #[serde(default)]
    pub practice: bool,
    pub rounds: Vec<RoundPlan>,
}

impl BlockRecord {
    pub fn round(&self, round_idx: usize) -> Option<&RoundPlan> {
        self.rounds.get(round_idx)
    }

    pub fn total_rounds(&self) -> usize {
        self.rounds.len()
    }
}

/// Reject configurations that could never start a session.
pub fn validate_blocks(blocks: &[BlockRecord]) -> TabletopResult<()> {
    if blocks.is_empty() {
        return Err(TabletopError::EmptyBlockList);
    }
    if let Some(empty) = blocks.iter().find(|b| b.rounds.is_empty()) {
        return Err(TabletopError::EmptyBlock { index: empty.index });
    }
    Ok(())
}

pub fn parse_blocks(json: &str) -> TabletopResult<Vec<BlockRecord>> {
    let blocks: Vec<BlockRecord> = serde_json::from_str(json)?;
    validate_blocks(&blocks)?;
    Ok(blocks)
}

pub fn load_blocks(path: &Path) -> TabletopResult<Vec<BlockRecord>> {
    let text = std::fs::read_to_string(path)?;
    let blocks = parse_blocks(&text)?;
    log::info!("loaded {} blocks from {}", blocks.len(), path.display());
    Ok(blocks)
}

/// The bundled configuration: one practice block followed by the four
/// experiment blocks.
pub fn default_blocks() -> Vec<BlockRecord> {
    DEFAULT_BLOCKS.clone()
}
