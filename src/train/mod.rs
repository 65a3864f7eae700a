mod admission;
mod score_log;

pub use admission::AdmissionPolicy;
pub use score_log::{ScoreLog, ScoreRecord};

use std::{
    path::PathBuf,
    sync::mpsc::Receiver,
};

use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    algo::DQNAgent,
    config::{EvaluationConfig, TrainingConfig},
    env::SnakeEnv,
    error::{Error, Result},
    model::QFunction,
};

/// Commands accepted by a running [`Trainer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ToggleTraining,
    /// Toggle per-episode console reporting
    ToggleDisplay,
    /// Save everything and stop
    Quit,
}

/// How the agent picks actions in the current episode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayMode {
    /// Epsilon greedy
    #[default]
    Normal,
    /// Always the greedy action; scores of these episodes are recorded
    ForceExploit,
    /// Always a random action
    ForceExplore,
}

/// Drives the environment and the learner one tick at a time
pub struct Trainer<Q: QFunction> {
    env: SnakeEnv,
    agent: DQNAgent<Q>,
    admission: AdmissionPolicy,
    evaluation: EvaluationConfig,
    report_every: u64,
    report_offset: u64,
    q_probe_size: usize,
    training: bool,
    display: bool,
    play_mode: PlayMode,
    ticks: u64,
    episodes: u64,
    scores: Vec<u32>,
    score_log: Option<ScoreLog>,
    checkpoint_path: Option<PathBuf>,
    rng: StdRng,
}

fn check_probability(name: &str, p: f64) -> Result<()> {
    (0.0..=1.0)
        .contains(&p)
        .then_some(())
        .ok_or_else(|| Error::InvalidConfig(format!("{name} must be in [0, 1], got {p}")))
}

impl<Q: QFunction> Trainer<Q> {
    /// ### Errors
    /// - `ConfigurationMismatch` if the environment and the agent disagree on the action space or the encoding size
    /// - `InvalidConfig` if a probability is outside `[0, 1]`
    pub fn new(
        env: SnakeEnv,
        agent: DQNAgent<Q>,
        config: &TrainingConfig,
        training: bool,
    ) -> Result<Self> {
        if env.mode() != agent.mode() {
            return Err(Error::ConfigurationMismatch(format!(
                "environment encodes {:?} states but the network reads {:?}",
                env.mode(),
                agent.mode()
            )));
        }
        if env.num_actions() != agent.num_actions() {
            return Err(Error::ConfigurationMismatch(format!(
                "{:?} mode has {} actions but the network outputs {}",
                env.mode(),
                env.num_actions(),
                agent.num_actions()
            )));
        }
        if env.input_size() != agent.input_size() {
            return Err(Error::ConfigurationMismatch(format!(
                "{:?} mode encodes {} values but the network expects {}",
                env.mode(),
                env.input_size(),
                agent.input_size()
            )));
        }
        check_probability("admission.random_probability", config.admission.random_probability)?;
        check_probability("evaluation.exploit_probability", config.evaluation.exploit_probability)?;
        check_probability("evaluation.explore_probability", config.evaluation.explore_probability)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            env,
            agent,
            admission: AdmissionPolicy::new(&config.admission),
            evaluation: config.evaluation.clone(),
            report_every: config.report_every,
            report_offset: config.report_offset,
            q_probe_size: config.q_probe_size,
            training,
            display: true,
            play_mode: PlayMode::Normal,
            ticks: 0,
            episodes: 0,
            scores: Vec::new(),
            score_log: None,
            checkpoint_path: None,
            rng,
        })
    }

    /// Save checkpoints to `path` at every report and on shutdown
    pub fn with_checkpoint_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_path = Some(path.into());
        self
    }

    /// Append recorded episode scores to `log`
    pub fn with_score_log(mut self, log: ScoreLog) -> Self {
        self.score_log = Some(log);
        self
    }

    pub fn env(&self) -> &SnakeEnv {
        &self.env
    }

    pub fn agent(&self) -> &DQNAgent<Q> {
        &self.agent
    }

    pub fn admission(&self) -> &AdmissionPolicy {
        &self.admission
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    pub fn is_displaying(&self) -> bool {
        self.display
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Scores recorded this session
    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    /// Advance one tick with the agent choosing the action
    pub fn tick(&mut self) -> Result<()> {
        self.tick_with(None)
    }

    /// Advance one tick, using `action` instead of the agent's choice when given
    pub fn tick_with(&mut self, action: Option<usize>) -> Result<()> {
        if self.training
            && self.report_every > 0
            && self.ticks % self.report_every == self.report_offset
        {
            self.report()?;
        }
        self.ticks += 1;

        if self.env.is_alive() {
            let action = match action {
                Some(action) => action,
                None => self.agent.select_action(
                    self.env.state(),
                    self.play_mode == PlayMode::ForceExploit,
                    self.play_mode == PlayMode::ForceExplore,
                ),
            };
            self.env.apply_action(action)?;

            let transition = self.env.get_transition();
            // episodes cut off for looping never reach memory
            if self.training && self.env.moves_without_apple() < self.env.max_moves() {
                for transition in self.admission.admit(transition, &mut self.rng) {
                    self.agent.remember(transition)?;
                }
            }
        }

        if !self.env.is_alive() {
            self.end_episode()?;
        }
        Ok(())
    }

    fn end_episode(&mut self) -> Result<()> {
        self.episodes += 1;
        let score = self.env.score();
        if !self.training || self.play_mode == PlayMode::ForceExploit {
            self.record_score(score)?;
        } else {
            debug!("Episode {} ended with score {score}", self.episodes);
        }

        self.env.reset()?;

        if self.agent.push_count() > self.agent.memory().capacity() as u64 {
            let mode = if self.rng.gen_bool(self.evaluation.exploit_probability) {
                PlayMode::ForceExploit
            } else if self.rng.gen_bool(self.evaluation.explore_probability) {
                PlayMode::ForceExplore
            } else {
                PlayMode::Normal
            };
            if mode != self.play_mode {
                debug!("Switching play mode to {mode:?}");
            }
            self.play_mode = mode;
        }
        Ok(())
    }

    fn record_score(&mut self, score: u32) -> Result<()> {
        self.scores.push(score);
        if let Some(log) = self.score_log.as_mut() {
            log.record(self.episodes, score)?;
        }
        if self.display {
            let average = self.scores.iter().map(|&s| u64::from(s)).sum::<u64>() / self.scores.len() as u64;
            info!("Score: {score}    Average: {average}");
        }
        Ok(())
    }

    /// Log memory statistics, refresh the admission rates, probe the action values and save a checkpoint
    pub fn report(&mut self) -> Result<()> {
        let stats = self.agent.memory().reward_stats();
        self.admission.update_rates(&stats);
        info!(
            "Apples: {:.1}%, Deaths: {:.1}%, Closer: {:.1}%, Further: {:.1}%",
            stats.apple_percent(),
            stats.death_percent(),
            stats.approach_percent(),
            stats.neutral_percent()
        );
        info!(
            "Epsilon: {:.3}, Memory length: {}, Push count: {}",
            self.agent.epsilon(),
            self.agent.memory().len(),
            self.agent.push_count()
        );
        self.agent.probe_q_values(self.q_probe_size);
        self.save_checkpoint()
    }

    fn save_checkpoint(&self) -> Result<()> {
        if let Some(path) = &self.checkpoint_path {
            self.agent.checkpoint()?.save(path)?;
            info!("Checkpoint saved to {}", path.display());
        }
        Ok(())
    }

    /// Save the checkpoint and flush the score log
    pub fn shutdown(&mut self) -> Result<()> {
        self.save_checkpoint()?;
        if let Some(log) = self.score_log.as_mut() {
            log.flush()?;
        }
        Ok(())
    }

    /// Apply a control; returns `false` once the trainer should stop
    pub fn handle(&mut self, control: Control) -> Result<bool> {
        match control {
            Control::ToggleTraining => {
                self.training = !self.training;
                info!("Training {}", if self.training { "on" } else { "off" });
            }
            Control::ToggleDisplay => {
                self.display = !self.display;
                info!("Display {}", if self.display { "on" } else { "off" });
            }
            Control::Quit => {
                self.shutdown()?;
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Run until `max_ticks` ticks have elapsed or [`Control::Quit`] arrives, then shut down
    pub fn run(&mut self, max_ticks: Option<u64>, controls: &Receiver<Control>) -> Result<()> {
        loop {
            while let Ok(control) = controls.try_recv() {
                if !self.handle(control)? {
                    return Ok(());
                }
            }

            if max_ticks.is_some_and(|max| self.ticks >= max) {
                break;
            }
            self.tick()?;
        }
        self.shutdown()
    }
}
