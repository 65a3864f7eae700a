mod replay;
mod transition;

pub use replay::ReplayMemory;
pub use transition::{RewardStats, Transition, TransitionBatch};

#[cfg(test)]
pub(crate) use transition::tests::transition as mock_transition;
