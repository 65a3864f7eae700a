use std::slice;

use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    checkpoint::{Checkpoint, FORMAT_VERSION},
    config::AgentConfig,
    decay::{Decay, Exponential},
    env::{EncodingMode, StateEncoding},
    error::{Error, Result},
    exploration::{Choice, EpsilonGreedy},
    memory::{ReplayMemory, Transition},
    model::QFunction,
    util,
};

/// A Deep Q Network learner with experience replay and a periodically synchronised target network
///
/// ### Generics
/// - `Q`: The [`QFunction`] used for both the online and the target network
/// - `D`: The decay schedule of the epsilon greedy exploration, driven by the lifetime push count
pub struct DQNAgent<Q: QFunction, D: Decay = Exponential> {
    online: Q,
    target: Q,
    memory: ReplayMemory,
    exploration: EpsilonGreedy<D>,
    num_actions: usize,
    batch_size: usize,
    train_every: u64,
    gamma: f32,
    target_sync_every: usize,
    target_sync_counter: usize,
    push_count: u64,
    train_loss: Vec<f32>,
    q_history: Vec<Vec<f32>>,
    rng: StdRng,
}

impl<Q: QFunction> DQNAgent<Q> {
    /// Initialize a new `DQNAgent` with exponentially decaying epsilon
    ///
    /// ### Arguments
    /// - `online` The network that is trained and acted upon
    /// - `target` A network of the same topology; its weights are overwritten with the online weights
    /// - `config` Hyperparameters, validated here
    pub fn new(online: Q, target: Q, config: &AgentConfig) -> Result<Self> {
        let decay = Exponential::new(
            config.epsilon_decay,
            config.epsilon_start,
            config.epsilon_end,
        )?;
        Self::with_exploration(online, target, EpsilonGreedy::new(decay), config)
    }
}

impl<Q: QFunction, D: Decay> DQNAgent<Q, D> {
    pub fn with_exploration(
        online: Q,
        mut target: Q,
        exploration: EpsilonGreedy<D>,
        config: &AgentConfig,
    ) -> Result<Self> {
        config.validate()?;
        if online.input_size() != target.input_size()
            || online.num_actions() != target.num_actions()
            || online.mode() != target.mode()
            || online.topology() != target.topology()
        {
            return Err(Error::ConfigurationMismatch(format!(
                "online network ({}) and target network ({}) differ",
                online.topology(),
                target.topology()
            )));
        }
        target.set_weights(online.get_weights());

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            num_actions: online.num_actions(),
            online,
            target,
            memory: ReplayMemory::new(config.capacity),
            exploration,
            batch_size: config.batch_size,
            train_every: (config.batch_size / 20) as u64,
            gamma: config.gamma,
            target_sync_every: config.target_sync_every,
            target_sync_counter: 0,
            push_count: 0,
            train_loss: Vec::new(),
            q_history: Vec::new(),
            rng,
        })
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    pub fn input_size(&self) -> usize {
        self.online.input_size()
    }

    /// The encoding the networks read
    pub fn mode(&self) -> EncodingMode {
        self.online.mode()
    }

    /// Lifetime number of transitions pushed to replay memory
    pub fn push_count(&self) -> u64 {
        self.push_count
    }

    /// The current exploration probability
    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon(self.push_count)
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn online(&self) -> &Q {
        &self.online
    }

    pub fn target(&self) -> &Q {
        &self.target
    }

    pub fn train_loss(&self) -> &[f32] {
        &self.train_loss
    }

    pub fn q_history(&self) -> &[Vec<f32>] {
        &self.q_history
    }

    /// Choose an action for `state`
    ///
    /// A uniformly random action is returned when `force_explore` is set or when the epsilon greedy policy explores
    /// and `force_exploit` is not set. Otherwise the action with the highest predicted value is returned, the lowest
    /// action winning ties.
    pub fn select_action(
        &mut self,
        state: &StateEncoding,
        force_exploit: bool,
        force_explore: bool,
    ) -> usize {
        let choice = match (force_explore, force_exploit) {
            (true, _) => Choice::Explore,
            (false, true) => Choice::Exploit,
            (false, false) => self.exploration.choose(self.push_count, &mut self.rng),
        };

        match choice {
            Choice::Explore => self.rng.gen_range(0..self.num_actions),
            Choice::Exploit => self
                .online
                .predict(slice::from_ref(state))
                .first()
                .and_then(|q| util::argmax(q))
                .unwrap_or(0),
        }
    }

    /// Store a transition and advance the lifetime push count, returning the memory slot written
    pub fn push_experience(&mut self, transition: Transition) -> usize {
        self.push_count += 1;
        self.memory.push(transition)
    }

    /// Perform one DQN learning step if enough data is stored and the push count is on cadence
    ///
    /// ### Returns
    /// - `Ok(None)` when the step was skipped
    /// - `Ok(Some(loss))` after fitting the online network on one sampled batch
    pub fn learn_step(&mut self) -> Result<Option<f32>> {
        if self.memory.len() < 2 * self.batch_size
            || self.push_count % self.train_every != 1 % self.train_every
        {
            return Ok(None);
        }

        let batch = self.memory.sample_zipped(self.batch_size, &mut self.rng)?;

        // Only the taken action's value is moved towards the Bellman target
        let mut targets = self.online.predict(&batch.states);
        let future = self.target.predict(&batch.next_states);
        for (i, row) in targets.iter_mut().enumerate() {
            row[batch.actions[i]] = if batch.alive[i] {
                batch.rewards[i] + self.gamma * util::max(&future[i])
            } else {
                batch.rewards[i]
            };
        }

        let loss = self.online.fit(&batch.states, &targets);
        self.train_loss.push(loss);

        self.target_sync_counter += 1;
        if self.target_sync_counter > self.target_sync_every {
            self.sync_target();
        }

        Ok(Some(loss))
    }

    /// Push a transition then attempt a learning step
    pub fn remember(&mut self, transition: Transition) -> Result<Option<f32>> {
        self.push_experience(transition);
        self.learn_step()
    }

    /// Copy the online weights into the target network
    pub fn sync_target(&mut self) {
        self.target.set_weights(self.online.get_weights());
        self.target_sync_counter = 0;
        info!("Target network synchronised at push {}", self.push_count);
    }

    /// Record the mean predicted action values over up to `n` random stored states
    pub fn probe_q_values(&mut self, n: usize) -> Option<&[f32]> {
        let n = n.min(self.memory.len());
        if n == 0 {
            return None;
        }
        let states = self
            .memory
            .sample(n, &mut self.rng)
            .ok()?
            .into_iter()
            .map(|t| t.state.clone())
            .collect::<Vec<_>>();
        let means = util::column_means(&self.online.predict(&states));
        debug!("Mean Q values over {n} states: {means:?}");
        self.q_history.push(means);
        self.q_history.last().map(Vec::as_slice)
    }

    /// Snapshot the learner into a [`Checkpoint`]
    pub fn checkpoint(&self) -> Result<Checkpoint> {
        Ok(Checkpoint {
            format_version: FORMAT_VERSION,
            topology: self.online.topology(),
            weights: self.online.serialize_weights(self.online.get_weights())?,
            memory: self.memory.iter().cloned().collect(),
            push_count: self.push_count,
            train_loss: self.train_loss.clone(),
            q_history: self.q_history.clone(),
        })
    }

    /// Resume from a [`Checkpoint`]
    ///
    /// The checkpoint is fully validated before anything is modified, so on error the agent is left untouched.
    pub fn restore(&mut self, checkpoint: Checkpoint) -> Result<()> {
        if checkpoint.format_version != FORMAT_VERSION {
            return Err(Error::CorruptStateStore(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                checkpoint.format_version
            )));
        }
        if checkpoint.topology != self.online.topology() {
            return Err(Error::CorruptStateStore(format!(
                "checkpoint network {} does not match configured network {}",
                checkpoint.topology,
                self.online.topology()
            )));
        }
        if (checkpoint.memory.len() as u64) > checkpoint.push_count {
            return Err(Error::CorruptStateStore(format!(
                "{} stored transitions but only {} pushes",
                checkpoint.memory.len(),
                checkpoint.push_count
            )));
        }
        let mode = self.online.mode();
        let input_size = self.online.input_size();
        let malformed = checkpoint.memory.iter().position(|t| {
            t.state.mode() != mode
                || t.next_state.mode() != mode
                || t.state.len() != input_size
                || t.next_state.len() != input_size
                || t.action >= self.num_actions
        });
        if let Some(ix) = malformed {
            return Err(Error::CorruptStateStore(format!(
                "transition {ix} does not fit {mode:?} encodings of {input_size} inputs and {} actions",
                self.num_actions
            )));
        }
        let weights = self.online.deserialize_weights(checkpoint.weights)?;

        self.online.set_weights(weights);
        self.target.set_weights(self.online.get_weights());
        self.target_sync_counter = 0;
        self.memory = ReplayMemory::restore(
            checkpoint.memory,
            self.memory.capacity(),
            checkpoint.push_count,
        );
        self.push_count = checkpoint.push_count;
        self.train_loss = checkpoint.train_loss;
        self.q_history = checkpoint.q_history;

        info!(
            "Restored {} transitions after {} pushes",
            self.memory.len(),
            self.push_count
        );
        Ok(())
    }
}
