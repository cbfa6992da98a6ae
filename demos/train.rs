use std::{error::Error, path::PathBuf, thread, time::Duration};

use clap::Parser;
use drone_rl::{
    algo::{QTableAgent, QTableAgentConfig},
    gym::{drone, DroneApproach},
};

/// Train a tabular Q-learning agent on the drone approach task
#[derive(Parser)]
struct Args {
    /// Number of training episodes
    #[arg(long, default_value_t = 1000)]
    episodes: u32,

    /// Inter-episode pacing delay in milliseconds
    #[arg(long, default_value_t = 500)]
    delay: u64,

    /// Where to write the learned Q-table
    #[arg(long, default_value = "qtable.bin")]
    out: PathBuf,

    /// Optional CSV file for the per-episode reward curve
    #[arg(long)]
    curve: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut env = DroneApproach::new();
    env.set_target(Some((
        5 * drone::SCREEN_WIDTH / 6,
        drone::SCREEN_HEIGHT / 2,
    )));
    let mut agent = QTableAgent::new(QTableAgentConfig::default());

    let mut wtr = args.curve.as_deref().map(csv::Writer::from_path).transpose()?;
    if let Some(wtr) = wtr.as_mut() {
        wtr.write_record(["episode", "reward", "steps"])?;
    }

    for episode in 0..args.episodes {
        let total_reward = agent.go(&mut env);
        let report = env.report.take();

        if let Some(wtr) = wtr.as_mut() {
            wtr.write_record(&[
                episode.to_string(),
                total_reward.to_string(),
                report["steps"].to_string(),
            ])?;
        }
        if episode % 10 == 0 {
            println!(
                "episode {}/{}: reward {total_reward}, steps {}",
                episode, args.episodes, report["steps"]
            );
        }

        thread::sleep(Duration::from_millis(args.delay));
    }

    if let Some(wtr) = wtr.as_mut() {
        wtr.flush()?;
    }
    agent.q_table().save(&args.out)?;

    Ok(())
}
