use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabletopError {
    #[error("Block configuration is empty")]
    EmptyBlockList,

    #[error("Block {index} has no rounds")]
    EmptyBlock { index: u32 },

    #[error("Unknown start mode: {0} (expected C or T)")]
    UnknownStartMode(String),

    #[error("No active round at block {block_idx}, round {round_idx}")]
    NoActiveRound { block_idx: usize, round_idx: usize },

    #[error("Overlay handle is stale: {0}")]
    StaleOverlayHandle(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TabletopResult<T> = Result<T, TabletopError>;
