use anyhow::Result;
use clap::{Parser, ValueEnum};
use ml_pilot::modes::{TrainConfig, TrainMode};
use ml_pilot::rl::{SyntheticEnv, TrainingBackend, default_device};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ml_pilot")]
#[command(version, about = "Recurrent actor-critic training for image-based control")]
struct Cli {
    /// Run mode (currently only 'train' is implemented)
    #[arg(long, default_value = "train")]
    mode: Mode,

    /// Total number of training epochs
    #[arg(long, default_value = "10000")]
    epochs: usize,

    /// Number of parallel environment instances
    #[arg(long, default_value = "16")]
    num_envs: usize,

    /// Directory for checkpoints, history and the reward plot
    #[arg(long, default_value = "models")]
    save_dir: PathBuf,

    /// Episode length of the synthetic environment
    #[arg(long, default_value = "200")]
    episode_len: usize,

    /// Environment RNG seed
    #[arg(long, default_value = "42")]
    seed: u64,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Train the agent against the synthetic environment
    Train,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.mode {
        Mode::Train => {
            let device = default_device();
            let mut config = TrainConfig::new(cli.epochs, cli.save_dir);
            config.num_envs = cli.num_envs;

            let env = SyntheticEnv::<TrainingBackend>::new(
                cli.num_envs,
                cli.episode_len,
                cli.seed,
                device.clone(),
            );

            let mut train_mode = TrainMode::new(config, env, device)?;
            train_mode.run()?;
        }
    }

    Ok(())
}
