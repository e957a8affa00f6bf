//! Training mode
//!
//! This module implements the epoch loop: collect a rollout, perform one
//! optimization step, record metrics, and periodically checkpoint and render
//! the reward curve. Restarts resume from the last checkpoint and reload the
//! persisted history so logging stays continuous.

use anyhow::{Context, Result, bail};
use burn::tensor::backend::AutodiffBackend;
use std::path::PathBuf;

use crate::metrics::{TrainingHistory, TrainingStats, render_reward_curve};
use crate::rl::{
    ActorCriticAgent, ActorCriticConfig, TrainerConfig, VectorEnv, checkpoint_exists,
    collect_rollout, load_checkpoint, save_checkpoint,
};

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Total number of epochs to train (one rollout + update per epoch)
    pub num_epochs: usize,

    /// Number of parallel environment instances
    pub num_envs: usize,

    /// Directory holding the checkpoint, the history and the reward plot
    pub save_dir: PathBuf,

    /// Save a checkpoint and re-render the plot every N epochs
    pub checkpoint_frequency: usize,

    /// Log training progress every N epochs
    pub log_frequency: usize,

    /// Network architecture
    pub network_config: ActorCriticConfig,

    /// Training hyperparameters
    pub trainer_config: TrainerConfig,
}

impl TrainConfig {
    /// Create a new training configuration with defaults
    ///
    /// # Arguments
    ///
    /// * `num_epochs` - Number of epochs to train
    /// * `save_dir` - Directory for checkpoints and history
    pub fn new(num_epochs: usize, save_dir: PathBuf) -> Self {
        Self {
            num_epochs,
            num_envs: 16,
            save_dir,
            checkpoint_frequency: 10,
            log_frequency: 1,
            network_config: ActorCriticConfig::default(),
            trainer_config: TrainerConfig::default(),
        }
    }

    fn history_path(&self) -> PathBuf {
        self.save_dir.join("history.json")
    }

    fn plot_path(&self) -> PathBuf {
        self.save_dir.join("rewards.png")
    }
}

/// Training mode driver
///
/// Runs the training loop over a batched environment, logging progress and
/// saving checkpoints periodically.
pub struct TrainMode<B: AutodiffBackend, E: VectorEnv<B>> {
    /// Agent being trained
    agent: ActorCriticAgent<B>,

    /// Batched environment for rollout collection
    env: E,

    /// Rolling training statistics for progress lines
    stats: TrainingStats,

    /// Full per-epoch history, persisted across restarts
    history: TrainingHistory,

    /// Training configuration
    config: TrainConfig,
}

impl<B: AutodiffBackend, E: VectorEnv<B>> TrainMode<B, E> {
    /// Create a new training mode, resuming from `save_dir` when a
    /// checkpoint exists there
    pub fn new(config: TrainConfig, env: E, device: B::Device) -> Result<Self> {
        let agent = if checkpoint_exists(&config.save_dir) {
            let agent = load_checkpoint::<B>(&config.save_dir, &device)
                .context("Failed to resume from checkpoint")?;
            println!(
                "Resuming from checkpoint at {:?} ({} epochs trained)",
                config.save_dir,
                agent.epochs_trained()
            );
            agent
        } else {
            let network = config.network_config.init::<B>(&device);
            ActorCriticAgent::new(
                network,
                config.network_config.clone(),
                config.trainer_config.clone(),
                device,
            )
        };

        let history = TrainingHistory::load_or_default(&config.history_path())
            .context("Failed to load training history")?;

        // 100-epoch rolling window
        let stats = TrainingStats::new(100);

        Ok(Self {
            agent,
            env,
            stats,
            history,
            config,
        })
    }

    /// Run the training loop
    ///
    /// Trains until `num_epochs` total epochs have completed (counting
    /// epochs restored from a checkpoint). A non-finite total loss aborts
    /// the run: retrying a diverged update is pointless.
    pub fn run(&mut self) -> Result<()> {
        self.print_header();

        let start_epoch = self.agent.epochs_trained();
        for epoch in start_epoch..self.config.num_epochs {
            let rollout = collect_rollout(
                &mut self.agent,
                &mut self.env,
                self.config.trainer_config.horizon,
            );
            let report = self.agent.update(&rollout);

            if !report.loss_total.is_finite() {
                bail!(
                    "non-finite total loss {} at epoch {}",
                    report.loss_total,
                    epoch + 1
                );
            }

            self.stats.record_epoch(report.mean_reward);
            self.stats.record_update(
                report.loss_actions,
                report.loss_values,
                report.loss_entropy,
                report.loss_total,
            );

            self.history.record(report.loss_total, report.mean_reward);
            if let Err(err) = self.history.save(&self.config.history_path()) {
                eprintln!("warning: failed to persist training history: {err:#}");
            }

            if (epoch + 1) % self.config.log_frequency == 0 {
                self.print_progress(epoch + 1);
            }

            if (epoch + 1) % self.config.checkpoint_frequency == 0 {
                self.save_checkpoint()?;
            }
        }

        save_checkpoint(&self.agent, &self.config.save_dir)
            .context("Failed to save final checkpoint")?;

        println!("\nTraining complete!");
        println!("Checkpoint saved to: {:?}", self.config.save_dir);
        println!("\nFinal Statistics:");
        println!("{}", self.stats.format_summary());

        Ok(())
    }

    fn save_checkpoint(&self) -> Result<()> {
        save_checkpoint(&self.agent, &self.config.save_dir).with_context(|| {
            format!("Failed to save checkpoint to {:?}", self.config.save_dir)
        })?;
        println!("  Checkpoint saved: {:?}", self.config.save_dir);

        // The plot is a best-effort sink; never let it halt training.
        if let Err(err) =
            render_reward_curve(&self.history.mean_rewards, &self.config.plot_path())
        {
            eprintln!("warning: failed to render reward plot: {err:#}");
        }

        Ok(())
    }

    fn print_header(&self) {
        println!("{}", "=".repeat(70));
        println!("Recurrent Actor-Critic Training");
        println!("{}", "=".repeat(70));
        println!("Epochs: {}", self.config.num_epochs);
        println!("Environments: {}", self.config.num_envs);
        println!("Trainer Config:");
        println!(
            "  Learning rate: {}",
            self.config.trainer_config.learning_rate
        );
        println!("  Gamma: {}", self.config.trainer_config.gamma);
        println!("  Lambda: {}", self.config.trainer_config.lambda);
        println!(
            "  Entropy weight: {}",
            self.config.trainer_config.entropy_weight
        );
        println!(
            "  Max grad norm: {}",
            self.config.trainer_config.max_grad_norm
        );
        println!("  Horizon: {} steps", self.config.trainer_config.horizon);
        println!(
            "Checkpoints: Every {} epochs",
            self.config.checkpoint_frequency
        );
        println!("Save dir: {:?}", self.config.save_dir);
        println!("{}", "=".repeat(70));
        println!();
    }

    fn print_progress(&self, epoch: usize) {
        println!(
            "[Epoch {}/{}] {}",
            epoch,
            self.config.num_epochs,
            self.stats.format_summary()
        );
    }
}
