//! Training statistics tracking
//!
//! This module provides utilities for tracking and monitoring training
//! progress: per-epoch mean rewards and the loss terms of each update.

use std::collections::VecDeque;

/// Training statistics tracker with rolling averages
///
/// Tracks epoch-level rewards and update-level losses using rolling windows
/// for smoothed statistics.
///
/// # Example
///
/// ```rust
/// use ml_pilot::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
///
/// // Record one epoch
/// stats.record_epoch(12.0);
/// stats.record_update(0.02, 0.05, -0.001, 0.07);
///
/// println!("Mean reward: {}", stats.mean_reward());
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Per-epoch mean rewards (rolling window)
    epoch_rewards: VecDeque<f32>,

    /// Policy losses (rolling window)
    action_losses: VecDeque<f32>,

    /// Value losses (rolling window)
    value_losses: VecDeque<f32>,

    /// Entropy loss terms (rolling window)
    entropy_losses: VecDeque<f32>,

    /// Total losses (rolling window)
    total_losses: VecDeque<f32>,

    /// Total number of epochs recorded
    total_epochs: usize,

    /// Window size for rolling averages
    window_size: usize,
}

impl TrainingStats {
    /// Create a new training statistics tracker
    ///
    /// # Arguments
    ///
    /// * `window_size` - Number of recent values to keep for rolling averages
    pub fn new(window_size: usize) -> Self {
        Self {
            epoch_rewards: VecDeque::with_capacity(window_size),
            action_losses: VecDeque::with_capacity(window_size),
            value_losses: VecDeque::with_capacity(window_size),
            entropy_losses: VecDeque::with_capacity(window_size),
            total_losses: VecDeque::with_capacity(window_size),
            total_epochs: 0,
            window_size,
        }
    }

    /// Record the completion of a training epoch
    ///
    /// # Arguments
    ///
    /// * `mean_reward` - Batch-mean total reward of the epoch's rollout
    pub fn record_epoch(&mut self, mean_reward: f32) {
        Self::push_deque(&mut self.epoch_rewards, mean_reward, self.window_size);
        self.total_epochs += 1;
    }

    /// Record the loss terms of one optimization step
    pub fn record_update(
        &mut self,
        action_loss: f32,
        value_loss: f32,
        entropy_loss: f32,
        total_loss: f32,
    ) {
        Self::push_deque(&mut self.action_losses, action_loss, self.window_size);
        Self::push_deque(&mut self.value_losses, value_loss, self.window_size);
        Self::push_deque(&mut self.entropy_losses, entropy_loss, self.window_size);
        Self::push_deque(&mut self.total_losses, total_loss, self.window_size);
    }

    /// Mean reward over the rolling window, or 0.0 if nothing was recorded
    pub fn mean_reward(&self) -> f32 {
        Self::mean(&self.epoch_rewards)
    }

    /// Mean policy loss over the rolling window
    pub fn mean_action_loss(&self) -> f32 {
        Self::mean(&self.action_losses)
    }

    /// Mean value loss over the rolling window
    pub fn mean_value_loss(&self) -> f32 {
        Self::mean(&self.value_losses)
    }

    /// Mean entropy loss term over the rolling window
    pub fn mean_entropy_loss(&self) -> f32 {
        Self::mean(&self.entropy_losses)
    }

    /// Mean total loss over the rolling window
    pub fn mean_total_loss(&self) -> f32 {
        Self::mean(&self.total_losses)
    }

    /// Total number of epochs recorded
    pub fn total_epochs(&self) -> usize {
        self.total_epochs
    }

    /// Window size for rolling averages
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Format a summary of the current statistics
    pub fn format_summary(&self) -> String {
        format!(
            "Epochs: {} | Reward: {:.2} | A_Loss: {:.4} | V_Loss: {:.4} | E_Loss: {:.5} | Total: {:.4}",
            self.total_epochs,
            self.mean_reward(),
            self.mean_action_loss(),
            self.mean_value_loss(),
            self.mean_entropy_loss(),
            self.mean_total_loss(),
        )
    }

    fn mean(deque: &VecDeque<f32>) -> f32 {
        if deque.is_empty() {
            0.0
        } else {
            deque.iter().sum::<f32>() / deque.len() as f32
        }
    }

    fn push_deque(deque: &mut VecDeque<f32>, value: f32, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let stats = TrainingStats::new(100);
        assert_eq!(stats.window_size(), 100);
        assert_eq!(stats.total_epochs(), 0);
    }

    #[test]
    fn test_record_epoch() {
        let mut stats = TrainingStats::new(100);
        stats.record_epoch(10.0);

        assert_eq!(stats.total_epochs(), 1);
        assert!((stats.mean_reward() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_record_update() {
        let mut stats = TrainingStats::new(100);
        stats.record_update(0.02, 0.05, -0.001, 0.069);

        assert!((stats.mean_action_loss() - 0.02).abs() < 1e-5);
        assert!((stats.mean_value_loss() - 0.05).abs() < 1e-5);
        assert!((stats.mean_entropy_loss() + 0.001).abs() < 1e-5);
        assert!((stats.mean_total_loss() - 0.069).abs() < 1e-5);
    }

    #[test]
    fn test_rolling_average() {
        let mut stats = TrainingStats::new(3);

        stats.record_epoch(1.0);
        stats.record_epoch(2.0);
        stats.record_epoch(3.0);

        assert_eq!(stats.total_epochs(), 3);
        assert!((stats.mean_reward() - 2.0).abs() < 1e-5);

        // A 4th epoch evicts the first
        stats.record_epoch(4.0);

        assert_eq!(stats.total_epochs(), 4);
        assert!((stats.mean_reward() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_format_summary() {
        let mut stats = TrainingStats::new(100);
        stats.record_epoch(15.5);
        stats.record_update(0.02, 0.05, -0.001, 0.069);

        let summary = stats.format_summary();
        assert!(summary.contains("Epochs: 1"));
        assert!(summary.contains("Reward: 15.50"));
        assert!(summary.contains("A_Loss: 0.0200"));
        assert!(summary.contains("V_Loss: 0.0500"));
        assert!(summary.contains("Total: 0.0690"));
    }

    #[test]
    fn test_empty_stats() {
        let stats = TrainingStats::new(100);

        assert_eq!(stats.mean_reward(), 0.0);
        assert_eq!(stats.mean_action_loss(), 0.0);
        assert_eq!(stats.mean_value_loss(), 0.0);
        assert_eq!(stats.mean_entropy_loss(), 0.0);
        assert_eq!(stats.mean_total_loss(), 0.0);
    }
}
