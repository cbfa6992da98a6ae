/// Implemented RL algorithms
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Environment traits and step results
pub mod env;

/// Exploration policies
pub mod exploration;

/// Simulated control environments
pub mod gym;

mod util;
