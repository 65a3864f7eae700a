use thiserror::Error;

/// Errors surfaced by the learning core and its collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// A batch was requested from replay memory before enough transitions were stored
    #[error("insufficient replay data: requested {requested} transitions but only {available} are stored")]
    InsufficientData { requested: usize, available: usize },

    /// The encoding mode, action space and approximator shapes disagree
    #[error("configuration mismatch: {0}")]
    ConfigurationMismatch(String),

    /// A checkpoint is missing fields or does not fit the configured network
    #[error("corrupt state store: {0}")]
    CorruptStateStore(String),

    /// A hyperparameter is outside its valid range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("action {action} is outside the action space of size {num_actions}")]
    InvalidAction { action: usize, num_actions: usize },

    /// The body covers every cell, so there is nowhere left to put the apple
    #[error("no free cell left to place the apple")]
    NoFreeCell,

    #[error("failed to encode network weights: {0}")]
    WeightEncoding(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to serialize checkpoint: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("failed to write score log: {0}")]
    ScoreLog(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
