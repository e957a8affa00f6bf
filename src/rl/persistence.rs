//! Checkpointing for trained agents
//!
//! A checkpoint is a directory holding three files with fixed names,
//! overwritten in place on every save:
//! - `model.mpk` - network weights (Burn record format)
//! - `optimizer.mpk` - Adam optimizer state
//! - `checkpoint.meta.json` - configurations and training progress as JSON
//!
//! There is no atomic-rename dance: training is offline and a torn
//! checkpoint just means re-running a few epochs.

use super::agent::{ActorCriticAgent, AgentOptimizerRecord};
use super::config::TrainerConfig;
use super::network::ActorCriticConfig;
use anyhow::{Context, Result};
use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata saved with a checkpoint
///
/// Contains everything needed to rebuild the agent before loading the
/// weight and optimizer records into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Training hyperparameters in effect
    pub trainer_config: TrainerConfig,

    /// Network architecture
    pub network_config: ActorCriticConfig,

    /// Number of completed training epochs
    pub epochs_trained: usize,

    /// Version identifier for compatibility checking
    pub version: String,
}

impl CheckpointMetadata {
    /// Create new metadata
    pub fn new(
        trainer_config: TrainerConfig,
        network_config: ActorCriticConfig,
        epochs_trained: usize,
    ) -> Self {
        Self {
            trainer_config,
            network_config,
            epochs_trained,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Whether `dir` contains a loadable checkpoint
pub fn checkpoint_exists(dir: &Path) -> bool {
    dir.join("model.mpk").exists()
}

/// Save a checkpoint of the agent to `dir`
///
/// Creates the directory if needed and overwrites any previous checkpoint
/// in place.
pub fn save_checkpoint<B: AutodiffBackend>(
    agent: &ActorCriticAgent<B>,
    dir: &Path,
) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create checkpoint directory: {dir:?}"))?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

    let network_record = agent.network().clone().into_record();
    recorder
        .record(network_record, dir.join("model"))
        .context("Failed to save network weights")?;

    recorder
        .record(agent.optimizer_record(), dir.join("optimizer"))
        .context("Failed to save optimizer state")?;

    let metadata = CheckpointMetadata::new(
        agent.config().clone(),
        agent.network_config().clone(),
        agent.epochs_trained(),
    );
    let meta_path = dir.join("checkpoint.meta.json");
    let meta_json =
        serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
    std::fs::write(&meta_path, meta_json)
        .with_context(|| format!("Failed to write metadata to {meta_path:?}"))?;

    Ok(())
}

/// Load an agent from a checkpoint directory
///
/// Rebuilds the network from the stored configuration, then restores the
/// weights, the optimizer state and the epoch counter.
pub fn load_checkpoint<B: AutodiffBackend>(
    dir: &Path,
    device: &B::Device,
) -> Result<ActorCriticAgent<B>> {
    let meta_path = dir.join("checkpoint.meta.json");
    let meta_json = std::fs::read_to_string(&meta_path)
        .with_context(|| format!("Failed to read metadata from {meta_path:?}"))?;
    let metadata: CheckpointMetadata =
        serde_json::from_str(&meta_json).context("Failed to deserialize metadata")?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

    let network = metadata.network_config.init::<B>(device);
    let network_record = recorder
        .load(dir.join("model"), device)
        .with_context(|| format!("Failed to load network weights from {dir:?}"))?;
    let network = network.load_record(network_record);

    let mut agent = ActorCriticAgent::new(
        network,
        metadata.network_config.clone(),
        metadata.trainer_config.clone(),
        device.clone(),
    );

    let optimizer_record: AgentOptimizerRecord<B> = recorder
        .load(dir.join("optimizer"), device)
        .with_context(|| format!("Failed to load optimizer state from {dir:?}"))?;
    agent.load_optimizer_record(optimizer_record);
    agent.set_epochs_trained(metadata.epochs_trained);

    Ok(agent)
}
