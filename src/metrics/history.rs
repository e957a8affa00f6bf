//! Persisted training history
//!
//! The full per-epoch loss and reward sequences are kept on disk as JSON and
//! reloaded on restart, so logging and plotting stay continuous across
//! interrupted runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-epoch training history, persisted across restarts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Total loss of every completed epoch
    pub loss_totals: Vec<f32>,

    /// Batch-mean reward of every completed epoch
    pub mean_rewards: Vec<f32>,
}

impl TrainingHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one epoch's scalars
    pub fn record(&mut self, loss_total: f32, mean_reward: f32) {
        self.loss_totals.push(loss_total);
        self.mean_rewards.push(mean_reward);
    }

    /// Number of recorded epochs
    pub fn len(&self) -> usize {
        self.mean_rewards.len()
    }

    /// Whether no epoch has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.mean_rewards.is_empty()
    }

    /// Write the history to `path` as JSON, overwriting in place
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {parent:?}"))?;
        }
        let json = serde_json::to_string(self).context("Failed to serialize history")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write history to {path:?}"))?;
        Ok(())
    }

    /// Load the history from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read history from {path:?}"))?;
        serde_json::from_str(&json).context("Failed to deserialize history")
    }

    /// Load the history if the file exists, otherwise start empty
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
