use std::{
    collections::{hash_map::Entry, HashMap},
    ops::Index,
};

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite state space and action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Update the environment in response to an action taken by an agent
    fn step(&mut self, action: Self::Action) -> Transition<Self::State>;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;
}

/// An [`Environment`] with a finite action space
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions for the current state
    ///
    /// The returned slice should never be empty, instead specify an action that represents doing nothing if necessary.
    fn actions(&self) -> Vec<Self::Action>;

    /// Sample an action uniformly at random
    fn random_action(&self) -> Self::Action;
}

/// The result of a single environment step
///
/// Unlike an `Option`-terminated step, the successor state is reported even on
/// terminal transitions, so value updates can bootstrap from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition<S> {
    /// The state of the environment after the action was applied
    pub state: S,
    /// The reward associated with the transition
    pub reward: f32,
    /// Whether the episode has terminated
    pub done: bool,
}

/// A keyed accumulator for per-episode statistics
///
/// Environments own a `Report` and accumulate into it during [`Environment::step`];
/// the training driver drains it with [`Report::take`] at episode boundaries.
#[derive(Debug, Clone, Default)]
pub struct Report {
    data: HashMap<&'static str, f64>,
}

impl Report {
    /// Initialize a report with the given keys, all zeroed
    pub fn new(keys: Vec<&'static str>) -> Self {
        Self {
            data: keys.into_iter().map(|k| (k, 0.0)).collect(),
        }
    }

    /// Entry API over a tracked key
    pub fn entry(&mut self, key: &'static str) -> Entry<'_, &'static str, f64> {
        self.data.entry(key)
    }

    /// The tracked keys
    pub fn keys(&self) -> Vec<&'static str> {
        self.data.keys().copied().collect()
    }

    /// Take the accumulated values, resetting all keys to zero
    pub fn take(&mut self) -> HashMap<&'static str, f64> {
        let keys = self.keys();
        std::mem::replace(&mut self.data, keys.into_iter().map(|k| (k, 0.0)).collect())
    }
}

impl Index<&str> for Report {
    type Output = f64;

    fn index(&self, key: &str) -> &Self::Output {
        &self.data[key]
    }
}
