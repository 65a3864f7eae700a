use rand::{seq::SliceRandom, Rng};

use crate::{
    ds::RingBuffer,
    error::{Error, Result},
};

use super::{RewardStats, Transition, TransitionBatch};

/// A fixed-size memory storage for reinforcement learning experiences
///
/// This structure uses a ring buffer to store transitions. It automatically overwrites the oldest transitions once it
/// reaches its capacity, so after `n` pushes it holds exactly `min(n, capacity)` of them.
#[derive(Debug, Clone)]
pub struct ReplayMemory {
    memory: RingBuffer<Transition>,
}

impl ReplayMemory {
    /// **Panics** if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        Self {
            memory: RingBuffer::new(capacity),
        }
    }

    /// Rebuild a memory from transitions listed oldest first, see [`RingBuffer::from_chronological`]
    pub fn restore(transitions: Vec<Transition>, capacity: usize, total_pushes: u64) -> Self {
        Self {
            memory: RingBuffer::from_chronological(transitions, capacity, total_pushes),
        }
    }

    /// Add a new transition to the memory and return the slot it was written to
    pub fn push(&mut self, transition: Transition) -> usize {
        self.memory.push(transition)
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.memory.capacity()
    }

    /// The transition stored in `slot`, if populated
    pub fn get(&self, slot: usize) -> Option<&Transition> {
        self.memory.view().get(slot)
    }

    /// Iterate from the oldest to the newest transition
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.memory.chronological()
    }

    /// Sample `batch_size` distinct transitions uniformly without replacement
    ///
    /// ### Returns
    /// - `Err(InsufficientData)` if fewer than `batch_size` transitions are stored
    /// - `Ok(transitions)` otherwise, in no particular order
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        if batch_size > self.memory.len() {
            return Err(Error::InsufficientData {
                requested: batch_size,
                available: self.memory.len(),
            });
        }

        Ok(self.memory.view().choose_multiple(rng, batch_size).collect())
    }

    /// Sample a batch and zip the vector of transitions into a [`TransitionBatch`]
    pub fn sample_zipped<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<TransitionBatch> {
        let transitions = self.sample(batch_size, rng)?;
        Ok(TransitionBatch::from_iter(transitions, batch_size))
    }

    /// Tally the reward classes currently stored
    pub fn reward_stats(&self) -> RewardStats {
        RewardStats::from_rewards(self.memory.view().iter().map(|t| t.reward))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{rngs::StdRng, SeedableRng};

    use crate::memory::transition::tests::transition;

    use super::*;

    const MEMORY_CAP: usize = 4;
    const BATCH_SIZE: usize = 2;

    #[test]
    fn replay_memory_functional() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut memory = ReplayMemory::new(MEMORY_CAP);

        assert!(
            matches!(
                memory.sample(BATCH_SIZE, &mut rng),
                Err(Error::InsufficientData {
                    requested: 2,
                    available: 0
                })
            ),
            "sample refuses when too few transitions"
        );

        memory.push(transition(0, 0.0, true));
        assert!(
            memory.sample_zipped(BATCH_SIZE, &mut rng).is_err(),
            "sample_zipped refuses a short batch"
        );

        memory.push(transition(1, 0.0, true));
        let batch = memory.sample(BATCH_SIZE, &mut rng).unwrap();
        assert_eq!(batch.len(), 2, "sample works");
        assert_ne!(batch[0], batch[1], "sampled without replacement");
        assert!(
            memory
                .sample_zipped(BATCH_SIZE, &mut rng)
                .is_ok_and(|b| b.len() == 2),
            "sample_zipped works"
        );
    }

    #[test]
    fn overwrites_oldest_beyond_capacity() {
        let mut memory = ReplayMemory::new(MEMORY_CAP);
        for push_count in 1..=11 {
            memory.push(transition(push_count, 0.0, true));
            assert_eq!(memory.len(), push_count.min(MEMORY_CAP), "size is min(pushes, capacity)");
            assert_eq!(
                memory.get((push_count - 1) % MEMORY_CAP),
                Some(&transition(push_count, 0.0, true)),
                "newest transition in slot (push_count - 1) % capacity"
            );
        }

        let ids = memory
            .iter()
            .map(|t| t.state.as_slice()[0] as usize)
            .collect::<Vec<_>>();
        assert_eq!(ids, [8, 9, 10, 11], "holds the most recent transitions oldest first");
    }

    #[test]
    fn sample_covers_whole_memory() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut memory = ReplayMemory::new(MEMORY_CAP);
        for i in 0..MEMORY_CAP {
            memory.push(transition(i, 0.0, true));
        }

        let batch = memory.sample(MEMORY_CAP, &mut rng).unwrap();
        let ids = batch
            .iter()
            .map(|t| t.state.as_slice()[0] as usize)
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), MEMORY_CAP, "every transition drawn exactly once");
    }

    #[test]
    fn restore_keeps_most_recent_set() {
        let mut memory = ReplayMemory::new(MEMORY_CAP);
        for i in 0..9 {
            memory.push(transition(i, 0.0, true));
        }
        let saved = memory.iter().cloned().collect::<Vec<_>>();
        let restored = ReplayMemory::restore(saved.clone(), MEMORY_CAP, 9);

        assert_eq!(
            restored.iter().cloned().collect::<Vec<_>>(),
            saved,
            "same transitions in the same order"
        );
        assert_eq!(restored.get(8 % MEMORY_CAP), memory.get(8 % MEMORY_CAP), "newest slot kept");
    }
}
