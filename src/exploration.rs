use rand::{thread_rng, Rng};

use crate::decay::Decay;

/// The two arms of an exploration policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Explore,
    Exploit,
}

/// Epsilon greedy exploration policy with a time-decaying epsilon threshold
///
/// With probability epsilon the agent explores, otherwise it exploits its
/// current value estimates. A [`Constant`](crate::decay::Constant) schedule
/// gives the classic fixed-epsilon policy.
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// Invoke epsilon greedy policy for the current episode
    pub fn choose(&self, episode: u32) -> Choice {
        self.choose_with(&mut thread_rng(), episode)
    }

    /// Same as [`choose`](Self::choose), with an explicit randomness source
    ///
    /// Epsilon 0 never explores and epsilon 1 never exploits, regardless of
    /// what the rng produces.
    pub fn choose_with(&self, rng: &mut impl Rng, episode: u32) -> Choice {
        let epsilon = self.epsilon.evaluate(episode as f32);
        if rng.gen::<f32>() < epsilon {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::decay;

    #[test]
    fn epsilon_zero_always_exploits() {
        let policy = EpsilonGreedy::new(decay::Constant::new(0.0));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert_eq!(policy.choose_with(&mut rng, 0), Choice::Exploit);
        }
    }

    #[test]
    fn epsilon_one_always_explores() {
        let policy = EpsilonGreedy::new(decay::Constant::new(1.0));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert_eq!(policy.choose_with(&mut rng, 0), Choice::Explore);
        }
    }

    #[test]
    fn decayed_epsilon_shifts_toward_exploitation() {
        let policy = EpsilonGreedy::new(decay::Exponential::new(1e-2, 1.0, 0.01).unwrap());
        let mut rng = StdRng::seed_from_u64(7);
        let explored_late = (0..1000)
            .filter(|_| policy.choose_with(&mut rng, 10_000) == Choice::Explore)
            .count();
        assert!(explored_late < 100, "late episodes explore at roughly vf");
    }
}
