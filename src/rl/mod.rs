//! Reinforcement learning components
//!
//! Provides:
//! - Backend aliases for training and inference
//! - Recurrent actor-critic network and agent
//! - Batched environment interface with a synthetic stand-in
//! - Rollout collection, lambda-return estimation and loss composition
//! - Checkpoint persistence

pub mod agent;
pub mod backend;
pub mod config;
pub mod environment;
pub mod network;
pub mod persistence;
pub mod returns;
pub mod rollout;

pub use agent::{ActorCriticAgent, LossBundle, UpdateReport};
pub use backend::{InferenceBackend, TrainingBackend, default_device};
pub use config::TrainerConfig;
pub use environment::{EnvStep, SyntheticEnv, VectorEnv};
pub use network::{ActorCriticConfig, ActorCriticNetwork, ActorCriticOutput};
pub use persistence::{
    CheckpointMetadata, checkpoint_exists, load_checkpoint, save_checkpoint,
};
pub use returns::compute_lambda_returns;
pub use rollout::{RolloutOutput, collect_rollout};
