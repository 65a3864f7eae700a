use burn::config::Config;

use crate::{
    env::EncodingMode,
    error::{Error, Result},
};

/// Environment parameters
#[derive(Config, Debug)]
pub struct EnvConfig {
    /// Grid width in cells
    #[config(default = 30)]
    pub width: usize,
    /// Grid height in cells
    #[config(default = 17)]
    pub height: usize,
    /// Radius of the image-mode patch; the board padding is `view_radius + 2`
    #[config(default = 5)]
    pub view_radius: usize,
    #[config(default = "EncodingMode::Vector")]
    pub mode: EncodingMode,
    /// Moves allowed without eating before the episode is cut off
    #[config(default = 1000)]
    pub max_moves_without_apple: u32,
    pub seed: Option<u64>,
}

/// Learner hyperparameters
#[derive(Config, Debug)]
pub struct AgentConfig {
    /// Replay memory capacity
    #[config(default = 300000)]
    pub capacity: usize,
    #[config(default = 512)]
    pub batch_size: usize,
    /// The discount factor
    #[config(default = 0.99)]
    pub gamma: f32,
    #[config(default = 1.0)]
    pub epsilon_start: f32,
    #[config(default = 0.1)]
    pub epsilon_end: f32,
    /// Exponential decay rate of epsilon per push
    #[config(default = 1e-5)]
    pub epsilon_decay: f32,
    /// Learning steps between target network syncs
    #[config(default = 300)]
    pub target_sync_every: usize,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
    pub seed: Option<u64>,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig(String::from("capacity must be positive")));
        }
        if self.batch_size < 20 {
            return Err(Error::InvalidConfig(format!(
                "batch size must be at least 20, got {}",
                self.batch_size
            )));
        }
        if 2 * self.batch_size > self.capacity {
            return Err(Error::InvalidConfig(format!(
                "capacity {} cannot hold two batches of {}",
                self.capacity, self.batch_size
            )));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(Error::InvalidConfig(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }
        if self.target_sync_every == 0 {
            return Err(Error::InvalidConfig(String::from(
                "target sync threshold must be positive",
            )));
        }
        Ok(())
    }
}

/// Thresholds of the replay admission policy, percentages in `[0, 100]`
#[derive(Config, Debug)]
pub struct AdmissionConfig {
    /// How many recent transitions are pushed alongside an apple or a death
    #[config(default = 8)]
    pub look_back: usize,
    /// Apples and deaths are favoured while their share of memory stays below this percentage
    #[config(default = 8.0)]
    pub ceiling: f32,
    #[config(default = 0.05)]
    pub random_probability: f64,
    /// Random admission only happens once both apples and deaths exceed this percentage
    #[config(default = 5.0)]
    pub floor: f32,
}

/// Probabilities of switching into an evaluation mode after an episode, once memory has wrapped
#[derive(Config, Debug)]
pub struct EvaluationConfig {
    #[config(default = 0.1)]
    pub exploit_probability: f64,
    #[config(default = 0.2)]
    pub explore_probability: f64,
}

/// Everything the training driver needs, loadable from JSON
#[derive(Config, Debug)]
pub struct TrainingConfig {
    pub env: EnvConfig,
    pub agent: AgentConfig,
    pub admission: AdmissionConfig,
    pub evaluation: EvaluationConfig,
    /// Ticks between training reports
    #[config(default = 50000)]
    pub report_every: u64,
    #[config(default = 5000)]
    pub report_offset: u64,
    /// Stored states probed for the mean action values at each report
    #[config(default = 1000)]
    pub q_probe_size: usize,
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new(
            EnvConfig::new(),
            AgentConfig::new(),
            AdmissionConfig::new(),
            EvaluationConfig::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TrainingConfig::default();
        assert_eq!((config.env.width, config.env.height), (30, 17), "grid size");
        assert_eq!(config.env.view_radius, 5);
        assert_eq!(config.agent.capacity, 300_000);
        assert_eq!(config.agent.batch_size, 512);
        assert_eq!(config.agent.target_sync_every, 300);
        assert_eq!(config.admission.look_back, 8);
        assert!(config.agent.validate().is_ok(), "defaults are valid");
    }

    #[test]
    fn rejects_small_batches() {
        let config = AgentConfig::new().with_batch_size(10);
        assert!(
            matches!(config.validate(), Err(Error::InvalidConfig(_))),
            "training cadence needs batch_size / 20 > 0"
        );
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training.json");
        let config = TrainingConfig::default().with_report_every(10);
        config.save(&path).unwrap();

        let loaded = TrainingConfig::load(&path).unwrap();
        assert_eq!(loaded.report_every, 10);
        assert_eq!(loaded.env.mode, EncodingMode::Vector);
        assert_eq!(loaded.agent.gamma, config.agent.gamma);
    }
}
