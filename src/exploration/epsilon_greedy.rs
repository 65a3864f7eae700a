use rand::Rng;

use crate::decay::Decay;

use super::Choice;

/// Epsilon greedy exploration policy with time-decaying epsilon threshold
///
/// Time is measured in lifetime pushes to replay memory, so exploration fades as experience accumulates.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// The exploration probability after `t` pushes
    pub fn epsilon(&self, t: u64) -> f32 {
        self.epsilon.evaluate(t as f32)
    }

    /// Invoke epsilon greedy policy at time `t`
    pub fn choose<R: Rng + ?Sized>(&self, t: u64, rng: &mut R) -> Choice {
        if self.epsilon(t) > rng.gen::<f32>() {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::decay::{Constant, Exponential};

    use super::*;

    #[test]
    fn epsilon_follows_schedule() {
        let policy = EpsilonGreedy::new(Exponential::new(1e-5, 1.0, 0.1).unwrap());
        assert_eq!(policy.epsilon(0), 1.0, "epsilon starts at start value");
        assert!(
            (policy.epsilon(100_000) - (0.1 + 0.9 * f32::exp(-1.0))).abs() < 1e-6,
            "epsilon decays exponentially"
        );
    }

    #[test]
    fn extreme_epsilons_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        let always = EpsilonGreedy::new(Constant::new(1.0));
        let never = EpsilonGreedy::new(Constant::new(0.0));
        for t in 0..100 {
            assert_eq!(always.choose(t, &mut rng), Choice::Explore);
            assert_eq!(never.choose(t, &mut rng), Choice::Exploit);
        }
    }
}
