pub mod q_table;

pub use q_table::{QTable, QTableAgent, QTableAgentConfig, QTableError};
