//! A Deep Q Network that learns to play snake
//!
//! The [environment](env::SnakeEnv) encodes the board either as egocentric ray features or as a square patch around
//! the head. A [`DQNAgent`](algo::DQNAgent) learns from replayed transitions through any [`QFunction`](model::QFunction),
//! and a [`Trainer`](train::Trainer) ties the two together.

/// Implemented RL algorithms
pub mod algo;

/// Persisted learner state
pub mod checkpoint;

/// Hyperparameters and their defaults
pub mod config;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Data structures
pub mod ds;

/// The snake environment and its state encodings
pub mod env;

/// Exploration policies
pub mod exploration;

/// Experience replay
pub mod memory;

/// Action value approximators
pub mod model;

/// The training loop
pub mod train;

mod error;
mod traits;
mod util;

pub use error::{Error, Result};
