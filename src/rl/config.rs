//! Training hyperparameter configuration

use serde::{Deserialize, Serialize};

/// Configuration for the recurrent actor-critic trainer
///
/// This struct contains all hyperparameters used by the training algorithm.
/// Default values match the tuning the trainer ships with.
///
/// # Example
///
/// ```rust
/// use ml_pilot::rl::TrainerConfig;
///
/// // Use default hyperparameters
/// let config = TrainerConfig::default();
///
/// // Or customize specific parameters
/// let config = TrainerConfig {
///     learning_rate: 1e-3,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Learning rate for the Adam optimizer
    ///
    /// Default: 1e-4
    pub learning_rate: f64,

    /// Discount factor for future rewards (gamma)
    ///
    /// Determines how much future rewards are valued relative to immediate rewards.
    /// Values closer to 1.0 make the agent more far-sighted.
    ///
    /// Default: 0.99
    pub gamma: f32,

    /// Lambda parameter for lambda-return estimation
    ///
    /// Controls the bias-variance tradeoff of the return targets.
    /// Higher values (closer to 1.0) lean on Monte Carlo estimates (higher variance,
    /// lower bias). Lower values lean on one-step TD estimates.
    ///
    /// Default: 0.95
    pub lambda: f32,

    /// Weight of the entropy bonus in the loss function
    ///
    /// Encourages exploration by rewarding higher-entropy policies.
    ///
    /// Default: 0.001
    pub entropy_weight: f32,

    /// Maximum gradient norm for gradient clipping
    ///
    /// Prevents exploding gradients by clipping the global gradient norm.
    ///
    /// Default: 10.0
    pub max_grad_norm: f32,

    /// Maximum number of environment steps collected per rollout
    ///
    /// A rollout ends earlier if the environments terminate before the
    /// horizon is reached.
    ///
    /// Default: 200
    pub horizon: usize,
}

impl TrainerConfig {
    /// Create a new configuration with default hyperparameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    ///
    /// Checks that all hyperparameters are in valid ranges.
    ///
    /// # Returns
    ///
    /// `Ok(())` if all parameters are valid, `Err(String)` with an error message otherwise.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ml_pilot::rl::TrainerConfig;
    ///
    /// let mut config = TrainerConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.learning_rate = -0.1;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), String> {
        if self.learning_rate <= 0.0 {
            return Err(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }

        if !(0.0..=1.0).contains(&self.lambda) {
            return Err(format!("lambda must be in [0, 1], got {}", self.lambda));
        }

        if self.entropy_weight < 0.0 {
            return Err(format!(
                "entropy_weight must be non-negative, got {}",
                self.entropy_weight
            ));
        }

        if self.max_grad_norm <= 0.0 {
            return Err(format!(
                "max_grad_norm must be positive, got {}",
                self.max_grad_norm
            ));
        }

        // The loss drops the bootstrap-only final step, so at least two
        // collected steps are required.
        if self.horizon < 2 {
            return Err(format!("horizon must be at least 2, got {}", self.horizon));
        }

        Ok(())
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-4,
            gamma: 0.99,
            lambda: 0.95,
            entropy_weight: 0.001,
            max_grad_norm: 10.0,
            horizon: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainerConfig::default();
        assert_eq!(config.learning_rate, 1e-4);
        assert_eq!(config.gamma, 0.99);
        assert_eq!(config.lambda, 0.95);
        assert_eq!(config.entropy_weight, 0.001);
        assert_eq!(config.max_grad_norm, 10.0);
        assert_eq!(config.horizon, 200);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TrainerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_negative_learning_rate() {
        let mut config = TrainerConfig::default();
        config.learning_rate = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_gamma_out_of_range() {
        let mut config = TrainerConfig::default();
        config.gamma = 1.5;
        assert!(config.validate().is_err());

        config.gamma = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_lambda_out_of_range() {
        let mut config = TrainerConfig::default();
        config.lambda = 1.5;
        assert!(config.validate().is_err());

        config.lambda = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_negative_entropy_weight() {
        let mut config = TrainerConfig::default();
        config.entropy_weight = -0.001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_non_positive_grad_norm() {
        let mut config = TrainerConfig::default();
        config.max_grad_norm = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_horizon_too_short() {
        let mut config = TrainerConfig::default();
        config.horizon = 1;
        assert!(config.validate().is_err());

        config.horizon = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_config() {
        let config = TrainerConfig {
            learning_rate: 1e-3,
            gamma: 0.95,
            horizon: 50,
            ..Default::default()
        };
        assert_eq!(config.learning_rate, 1e-3);
        assert_eq!(config.gamma, 0.95);
        assert_eq!(config.horizon, 50);
        assert_eq!(config.lambda, 0.95); // From default
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = TrainerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: TrainerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.learning_rate, config.learning_rate);
        assert_eq!(restored.horizon, config.horizon);
    }
}
