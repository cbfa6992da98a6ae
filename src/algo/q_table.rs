use std::{fs, io, path::Path};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    assert_interval, decay,
    decay::Decay,
    env::{DiscreteActionSpace, Environment},
    exploration::{Choice, EpsilonGreedy},
    gym::drone::{Maneuver, State, DISTANCE_SENTINEL, MAX_SPEED},
};

/// Number of discrete speeds
pub const SPEEDS: usize = MAX_SPEED as usize + 1;
/// Number of discrete distances, sentinel included
pub const DISTANCES: usize = DISTANCE_SENTINEL as usize + 1;
/// Number of maneuvers
pub const ACTIONS: usize = 3;

const TABLE_VERSION: u32 = 1;

type Values = [[[f32; ACTIONS]; DISTANCES]; SPEEDS];

/// Persistence failures for [`QTable`]
#[derive(Error, Debug)]
pub enum QTableError {
    #[error("table io: {0}")]
    Io(#[from] io::Error),
    #[error("table codec: {0}")]
    Codec(#[from] bincode::Error),
    #[error("unsupported table version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },
}

/// A dense table of action values over the drone approach state space
///
/// The state space is small and fully enumerable, so the table is a fixed
/// `speed x distance x action` grid rather than a sparse map. Every cell
/// exists from construction on; an out-of-range lookup is a logic defect
/// and panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    values: Values,
}

impl QTable {
    /// A zero-initialized table
    pub fn new() -> Self {
        Self {
            values: [[[0.0; ACTIONS]; DISTANCES]; SPEEDS],
        }
    }

    /// The action values recorded for a state
    pub fn get(&self, state: State) -> &[f32; ACTIONS] {
        &self.values[state.0][state.1]
    }

    fn get_mut(&mut self, state: State) -> &mut [f32; ACTIONS] {
        &mut self.values[state.0][state.1]
    }

    /// The highest action value recorded for a state
    pub fn max_value(&self, state: State) -> f32 {
        self.get(state)
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// The maneuver with the highest recorded value, lowest index winning ties
    pub fn greedy(&self, state: State) -> Maneuver {
        let values = self.get(state);
        let mut best = 0;
        for (i, &v) in values.iter().enumerate().skip(1) {
            if v > values[best] {
                best = i;
            }
        }
        Maneuver::from(best)
    }

    /// Serialize the table and publish it atomically at `path`
    ///
    /// The record is written next to the destination and renamed over it, so a
    /// reader never observes a partially written table.
    pub fn save(&self, path: &Path) -> Result<(), QTableError> {
        let bytes = bincode::serialize(&(TABLE_VERSION, self))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        info!("Q-table saved to {}", path.display());
        Ok(())
    }

    /// Deserialize a table previously written by [`save`](Self::save)
    pub fn load(path: &Path) -> Result<Self, QTableError> {
        let bytes = fs::read(path)?;
        let (version, table): (u32, Self) = bincode::deserialize(&bytes)?;
        if version != TABLE_VERSION {
            return Err(QTableError::Version {
                found: version,
                expected: TABLE_VERSION,
            });
        }
        Ok(table)
    }

    /// Like [`load`](Self::load), but a missing file yields a fresh zeroed table
    ///
    /// Every other failure still propagates.
    pub fn load_or_new(path: &Path) -> Result<Self, QTableError> {
        match Self::load(path) {
            Err(QTableError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "no Q-table found at {}, starting from zeros",
                    path.display()
                );
                Ok(Self::new())
            }
            other => other,
        }
    }
}

impl Default for QTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the [`QTableAgent`]
pub struct QTableAgentConfig<D: Decay = decay::Constant> {
    pub exploration: EpsilonGreedy<D>,
    pub alpha: f32,
    pub gamma: f32,
}

impl Default for QTableAgentConfig {
    fn default() -> Self {
        Self {
            exploration: EpsilonGreedy::new(decay::Constant::new(0.2)),
            alpha: 0.1,
            gamma: 0.9,
        }
    }
}

/// A Q-learning agent for the drone approach task
///
/// Drives any [`Environment`] over the drone state and action space, selecting
/// maneuvers epsilon-greedily and correcting its value estimates with the
/// one-step temporal-difference rule. The table is the only state carried
/// across episodes.
pub struct QTableAgent<D: Decay = decay::Constant> {
    q_table: QTable,
    exploration: EpsilonGreedy<D>,
    alpha: f32,   // learning rate
    gamma: f32,   // discount factor
    episode: u32, // current episode
}

impl<D: Decay> QTableAgent<D> {
    /// Initialize a new agent with a zeroed table
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(config: QTableAgentConfig<D>) -> Self {
        Self::with_table(QTable::new(), config)
    }

    /// Initialize an agent around an existing table, e.g. one loaded from disk
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn with_table(q_table: QTable, config: QTableAgentConfig<D>) -> Self {
        assert_interval!(config.alpha, 0.0, 1.0);
        assert_interval!(config.gamma, 0.0, 1.0);
        Self {
            q_table,
            exploration: config.exploration,
            alpha: config.alpha,
            gamma: config.gamma,
            episode: 0,
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn into_q_table(self) -> QTable {
        self.q_table
    }

    /// Choose a maneuver for `state` under the exploration policy
    ///
    /// Does not touch the table, so evaluation rollouts can call this freely.
    pub fn act<E>(&self, env: &E, state: State) -> Maneuver
    where
        E: DiscreteActionSpace<State = State, Action = Maneuver>,
    {
        match self.exploration.choose(self.episode) {
            Choice::Explore => env.random_action(),
            Choice::Exploit => self.q_table.greedy(state),
        }
    }

    /// Apply the one-step temporal-difference update for a transition
    ///
    /// Bootstraps from the successor state even when it was terminal; exactly
    /// one cell is mutated.
    fn learn(&mut self, state: State, action: Maneuver, reward: f32, next_state: State) {
        let q = self.q_table.get(state)[action as usize];
        let max_next = self.q_table.max_value(next_state);
        let updated = q + self.alpha * (reward + self.gamma * max_next - q);
        self.q_table.get_mut(state)[action as usize] = updated;
    }

    /// Run one training episode, returning its total reward
    pub fn go<E>(&mut self, env: &mut E) -> f32
    where
        E: Environment<State = State, Action = Maneuver> + DiscreteActionSpace,
    {
        let mut state = env.reset();
        let mut total_reward = 0.0;

        loop {
            let action = self.act(env, state);
            let transition = env.step(action);
            self.learn(state, action, transition.reward, transition.state);

            total_reward += transition.reward;
            state = transition.state;
            if transition.done {
                break;
            }
        }

        self.episode += 1;
        total_reward
    }
}
