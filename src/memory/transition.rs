use serde::{Deserialize, Serialize};

use crate::env::{StateEncoding, APPLE_REWARD, APPROACH_REWARD, DEATH_REWARD};

/// A single recorded step of experience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// The encoding before taking the action
    pub state: StateEncoding,
    /// The action taken in the given state
    pub action: usize,
    /// The encoding after the action is taken
    pub next_state: StateEncoding,
    /// The reward received after taking the action
    pub reward: f32,
    /// Whether the agent survived the step
    pub alive: bool,
}

/// A zipped batch of [transitions](Transition)
#[derive(Clone, Debug, Default)]
pub struct TransitionBatch {
    pub states: Vec<StateEncoding>,
    pub actions: Vec<usize>,
    pub next_states: Vec<StateEncoding>,
    pub rewards: Vec<f32>,
    pub alive: Vec<bool>,
}

impl TransitionBatch {
    /// Construct a `TransitionBatch` from an iterator of [transition](Transition) references and a specified batch size
    pub fn from_iter<'a>(iter: impl IntoIterator<Item = &'a Transition>, batch_size: usize) -> Self {
        let batch = Self {
            states: Vec::with_capacity(batch_size),
            actions: Vec::with_capacity(batch_size),
            next_states: Vec::with_capacity(batch_size),
            rewards: Vec::with_capacity(batch_size),
            alive: Vec::with_capacity(batch_size),
        };

        iter.into_iter().fold(batch, |mut b, t| {
            b.states.push(t.state.clone());
            b.actions.push(t.action);
            b.next_states.push(t.next_state.clone());
            b.rewards.push(t.reward);
            b.alive.push(t.alive);
            b
        })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Counts of the reward classes held in replay memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewardStats {
    pub apples: usize,
    pub deaths: usize,
    pub approaches: usize,
    pub neutral: usize,
}

impl RewardStats {
    pub fn from_rewards(rewards: impl IntoIterator<Item = f32>) -> Self {
        rewards
            .into_iter()
            .fold(Self::default(), |mut stats, reward| {
                if reward == APPLE_REWARD {
                    stats.apples += 1;
                } else if reward == DEATH_REWARD {
                    stats.deaths += 1;
                } else if reward == APPROACH_REWARD {
                    stats.approaches += 1;
                } else {
                    stats.neutral += 1;
                }
                stats
            })
    }

    pub fn total(&self) -> usize {
        self.apples + self.deaths + self.approaches + self.neutral
    }

    fn percent(&self, count: usize) -> f32 {
        match self.total() {
            0 => 0.0,
            total => count as f32 * 100.0 / total as f32,
        }
    }

    pub fn apple_percent(&self) -> f32 {
        self.percent(self.apples)
    }

    pub fn death_percent(&self) -> f32 {
        self.percent(self.deaths)
    }

    pub fn approach_percent(&self) -> f32 {
        self.percent(self.approaches)
    }

    pub fn neutral_percent(&self) -> f32 {
        self.percent(self.neutral)
    }
}
