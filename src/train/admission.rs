use rand::Rng;

use crate::{
    config::AdmissionConfig,
    env::{APPLE_REWARD, DEATH_REWARD},
    memory::{RewardStats, Transition},
};

/// Decides which transitions reach replay memory
///
/// Ordinary steps are held in a short pending window. When an apple or a death happens while that class is rare in
/// memory, the window's most recent steps are admitted together with the event, so the steps leading up to sparse
/// rewards are over-represented. Occasionally an ordinary step is admitted on its own once both classes are common.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    window: Vec<Transition>,
    look_back: usize,
    ceiling: f32,
    floor: f32,
    random_probability: f64,
    apple_percent: f32,
    death_percent: f32,
}

impl AdmissionPolicy {
    pub fn new(config: &AdmissionConfig) -> Self {
        Self {
            window: Vec::with_capacity(config.look_back + 2),
            look_back: config.look_back,
            ceiling: config.ceiling,
            floor: config.floor,
            random_probability: config.random_probability,
            apple_percent: 0.0,
            death_percent: 0.0,
        }
    }

    /// Refresh the apple and death shares used by the thresholds
    pub fn update_rates(&mut self, stats: &RewardStats) {
        self.apple_percent = stats.apple_percent();
        self.death_percent = stats.death_percent();
    }

    pub fn rates(&self) -> (f32, f32) {
        (self.apple_percent, self.death_percent)
    }

    /// Number of transitions waiting in the window
    pub fn pending(&self) -> usize {
        self.window.len()
    }

    /// Offer a transition; returns the transitions to push, oldest first
    pub fn admit<R: Rng + ?Sized>(&mut self, transition: Transition, rng: &mut R) -> Vec<Transition> {
        let rare_apple = transition.reward == APPLE_REWARD && self.apple_percent < self.ceiling;
        let rare_death = transition.reward == DEATH_REWARD && self.death_percent < self.ceiling;

        if rare_apple || rare_death {
            self.window.push(transition);
            let start = self.window.len().saturating_sub(self.look_back);
            let admitted = self.window.split_off(start);
            self.window.clear();
            admitted
        } else if rng.gen_bool(self.random_probability)
            && self.apple_percent.min(self.death_percent) > self.floor
        {
            vec![transition]
        } else {
            if self.window.len() > self.look_back {
                self.window.clear();
            }
            self.window.push(transition);
            Vec::new()
        }
    }
}
