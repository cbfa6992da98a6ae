use std::{error::Error, path::PathBuf};

use clap::Parser;
use drone_rl::{
    algo::{QTable, QTableAgent, QTableAgentConfig},
    decay,
    env::Environment,
    exploration::EpsilonGreedy,
    gym::DroneApproach,
};

/// Run one greedy evaluation episode against a trained Q-table
#[derive(Parser)]
struct Args {
    /// Q-table produced by the train demo; missing file falls back to zeros
    #[arg(long, default_value = "qtable.bin")]
    table: PathBuf,

    /// Selected x-coordinate in pixels, snapped to the grid before use
    #[arg(long)]
    click_x: i32,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let table = QTable::load_or_new(&args.table)?;
    let agent = QTableAgent::with_table(
        table,
        QTableAgentConfig {
            exploration: EpsilonGreedy::new(decay::Constant::new(0.0)),
            ..Default::default()
        },
    );

    let mut env = DroneApproach::new();
    env.set_target(Some(DroneApproach::snap_target(args.click_x)));

    let mut state = env.reset();
    loop {
        let action = agent.act(&env, state);
        let transition = env.step(action);
        let frame = env.render_state();
        println!(
            "target x {} | speed {} distance {} | reward {}",
            frame.target.0, transition.state.0, transition.state.1, transition.reward
        );

        state = transition.state;
        if transition.done {
            break;
        }
    }

    Ok(())
}
