use thiserror::Error;

#[derive(Debug, Error)]
pub enum MazeError {
    #[error("maze has no rows")]
    Empty,
    #[error("maze row {row} has width {width}, expected {expected}")]
    RaggedRow {
        row: usize,
        width: usize,
        expected: usize,
    },
    #[error("maze has no '{0}' cell")]
    MissingMarker(char),
    #[error("maze has more than one '{0}' cell")]
    DuplicateMarker(char),
    #[error("maze has no pellets")]
    NoPellets,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid maze: {0}")]
    Maze(#[from] MazeError),
    #[error("config has no ghost cards")]
    NoGhosts,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("upgrade database failed validation; the shop is closed")]
    InvalidDatabase,
    #[error("unknown upgrade: {0}")]
    UnknownUpgrade(String),
    #[error("target level {target} must be current level + 1 (current: {current})")]
    WrongLevel { current: u32, target: u32 },
    #[error("target level {target} exceeds max level {max}")]
    AboveMaxLevel { target: u32, max: u32 },
    #[error("cost table of {name} has no entry for level {level}")]
    MissingCost { name: String, level: u32 },
    #[error("cost {cost} of {name} is negative")]
    NegativeCost { name: String, cost: i64 },
    #[error("insufficient funds: {available}/{cost}")]
    InsufficientFunds { available: u64, cost: u64 },
}
