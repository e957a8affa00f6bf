//! Recurrent actor-critic agent: hidden-state ownership, loss composition
//! and parameter updates
//!
//! The agent wraps the pure [`ActorCriticNetwork`] with the stateful rollout
//! contract: `reset` materializes a zeroed hidden state for a batch of
//! environments, `forward` threads it through the network, and `clear` drops
//! it at rollout end so state can never leak across independent rollouts.

use super::config::TrainerConfig;
use super::network::{ActorCriticConfig, ActorCriticNetwork, ActorCriticOutput};
use super::returns::compute_lambda_returns;
use super::rollout::RolloutOutput;
use burn::{
    grad_clipping::GradientClippingConfig,
    nn::LstmState,
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    tensor::{
        ElementConversion, Tensor,
        activation::{log_softmax, softmax},
        backend::AutodiffBackend,
    },
};

/// Record type of the agent's optimizer, used for checkpointing
pub type AgentOptimizerRecord<B> =
    <OptimizerAdaptor<Adam, ActorCriticNetwork<B>, B> as Optimizer<
        ActorCriticNetwork<B>,
        B,
    >>::Record;

/// Loss terms for one action head
///
/// `loss_values` is the shared value-regression term: the identical tensor is
/// placed in both heads' bundles, so summing both totals counts it twice.
/// That weighting is part of the trained behavior and is kept as is.
#[derive(Debug, Clone)]
pub struct LossBundle<B: AutodiffBackend> {
    /// Policy-gradient term: `-mean(log_prob * advantage)`
    pub loss_actions: Tensor<B, 1>,
    /// Value regression term: `mean((V - R)^2)`
    pub loss_values: Tensor<B, 1>,
    /// Entropy bonus: `-entropy_weight * mean(entropy)`
    pub loss_entropy: Tensor<B, 1>,
}

impl<B: AutodiffBackend> LossBundle<B> {
    /// Sum of all terms in this bundle
    pub fn total(&self) -> Tensor<B, 1> {
        self.loss_actions.clone() + self.loss_values.clone() + self.loss_entropy.clone()
    }
}

/// Scalar summary of one optimization step, for logging
#[derive(Debug, Clone, Copy)]
pub struct UpdateReport {
    /// Policy loss summed over both heads
    pub loss_actions: f32,
    /// Shared value loss (counted once here, twice in the total)
    pub loss_values: f32,
    /// Entropy terms summed over both heads
    pub loss_entropy: f32,
    /// The optimized objective (both bundle totals summed)
    pub loss_total: f32,
    /// Mean total reward per environment over the rollout
    pub mean_reward: f32,
}

/// Recurrent actor-critic agent
///
/// Owns the network, the Adam optimizer (with global-norm gradient clipping)
/// and the recurrent state of the rollout in flight.
///
/// # Type Parameters
///
/// * `B` - Autodiff backend for gradient computation
pub struct ActorCriticAgent<B: AutodiffBackend> {
    /// Actor-critic neural network
    network: ActorCriticNetwork<B>,

    /// Adam optimizer for network parameters
    optim: OptimizerAdaptor<Adam, ActorCriticNetwork<B>, B>,

    /// Network architecture (kept for checkpoint metadata)
    network_config: ActorCriticConfig,

    /// Training hyperparameters
    config: TrainerConfig,

    /// Recurrent state of the rollout in flight; `None` outside rollouts
    hidden: Option<LstmState<B, 2>>,

    /// Number of completed training epochs
    epochs_trained: usize,

    /// Device for tensor operations
    device: B::Device,
}

impl<B: AutodiffBackend> ActorCriticAgent<B> {
    /// Create a new agent
    ///
    /// # Arguments
    ///
    /// * `network` - the actor-critic network to train
    /// * `network_config` - the configuration the network was built from
    /// * `config` - training hyperparameters
    /// * `device` - device for computation
    pub fn new(
        network: ActorCriticNetwork<B>,
        network_config: ActorCriticConfig,
        config: TrainerConfig,
        device: B::Device,
    ) -> Self {
        config.validate().expect("Invalid trainer configuration");

        let optim = Self::build_optimizer(&config);

        Self {
            network,
            optim,
            network_config,
            config,
            hidden: None,
            epochs_trained: 0,
            device,
        }
    }

    fn build_optimizer(
        config: &TrainerConfig,
    ) -> OptimizerAdaptor<Adam, ActorCriticNetwork<B>, B> {
        AdamConfig::new()
            .with_grad_clipping(Some(GradientClippingConfig::Norm(config.max_grad_norm)))
            .init()
    }

    /// Reset the recurrent state to zeros for `num_envs` environments
    ///
    /// Valid in any state; starts a fresh rollout.
    pub fn reset(&mut self, num_envs: usize) {
        self.hidden = Some(self.network.initial_state(num_envs, &self.device));
    }

    /// Drop the recurrent state at rollout end
    pub fn clear(&mut self) {
        self.hidden = None;
    }

    /// Whether a recurrent state is currently present
    pub fn has_hidden_state(&self) -> bool {
        self.hidden.is_some()
    }

    /// Forward pass threading the owned recurrent state
    ///
    /// # Panics
    ///
    /// Panics if called without a preceding [`Self::reset`] (including after
    /// [`Self::clear`]), or if the observation batch size does not match the
    /// batch size the state was reset for.
    pub fn forward(&mut self, observations: Tensor<B, 4>) -> ActorCriticOutput<B> {
        let state = self.hidden.take().expect("forward called before reset");

        let batch_size = observations.dims()[0];
        let state_batch = state.hidden.dims()[0];
        assert_eq!(
            batch_size, state_batch,
            "observation batch size {batch_size} does not match recurrent state batch size {state_batch}"
        );

        let (output, new_state) = self.network.forward(observations, state);
        self.hidden = Some(new_state);
        output
    }

    /// Compute the per-head loss bundles for a collected rollout
    ///
    /// Returns one bundle per action head plus the batch-mean total reward.
    /// The value term is computed once and shared between both bundles.
    ///
    /// Return targets are lambda-returns computed over the full rollout; the
    /// final step only seeds the bootstrap and is sliced off before any term
    /// is formed. The advantage uses detached values, so the policy term
    /// cannot push gradients into the critic.
    ///
    /// # Panics
    ///
    /// Panics if the rollout is shorter than two steps.
    pub fn compute_loss(
        &self,
        rollout: &RolloutOutput<B>,
    ) -> (LossBundle<B>, LossBundle<B>, f32) {
        let num_envs = rollout.num_envs();
        let num_steps = rollout.num_steps();
        assert!(
            num_steps >= 2,
            "rollout must contain at least two steps, got {num_steps}"
        );

        let returns_full = compute_lambda_returns(
            &rollout.rewards,
            &rollout.values,
            &rollout.ends,
            self.config.gamma,
            self.config.lambda,
        );

        // Drop the bootstrap-only final step everywhere.
        let returns = returns_full.slice([0..num_envs, 0..num_steps - 1]);
        let values = rollout
            .values
            .clone()
            .slice([0..num_envs, 0..num_steps - 1]);

        // Actor-critic decoupling: the advantage treats the value estimate
        // as a constant.
        let advantages = returns.clone() - values.clone().detach();

        let loss_values = {
            let diff = values - returns;
            (diff.clone() * diff).mean()
        };

        let bundle0 = self.head_loss(
            &rollout.logits_actions0,
            &rollout.actions0,
            &advantages,
            &loss_values,
        );
        let bundle1 = self.head_loss(
            &rollout.logits_actions1,
            &rollout.actions1,
            &advantages,
            &loss_values,
        );

        let rewards_data = rollout.rewards.to_data().convert::<f32>();
        let rewards_sum: f32 = rewards_data
            .to_vec::<f32>()
            .expect("rewards data")
            .iter()
            .sum();
        let mean_reward = rewards_sum / num_envs as f32;

        (bundle0, bundle1, mean_reward)
    }

    fn head_loss(
        &self,
        logits: &Tensor<B, 3>,
        actions: &Tensor<B, 2, burn::tensor::Int>,
        advantages: &Tensor<B, 2>,
        loss_values: &Tensor<B, 1>,
    ) -> LossBundle<B> {
        let [num_envs, num_steps, num_actions] = logits.dims();
        let logits = logits
            .clone()
            .slice([0..num_envs, 0..num_steps - 1, 0..num_actions]);
        let actions = actions
            .clone()
            .slice([0..num_envs, 0..num_steps - 1])
            .unsqueeze_dim::<3>(2);

        let log_probs = log_softmax(logits.clone(), 2);
        let taken_log_probs = log_probs.clone().gather(2, actions).squeeze::<2>(2);

        let loss_actions = (taken_log_probs * advantages.clone()).mean().neg();

        // Entropy: -E[sum pi * log pi]; the bonus subtracts it from the loss.
        let probs = softmax(logits, 2);
        let entropy = (probs * log_probs).sum_dim(2).neg().mean();
        let loss_entropy = entropy.mul_scalar(-self.config.entropy_weight);

        LossBundle {
            loss_actions,
            loss_values: loss_values.clone(),
            loss_entropy,
        }
    }

    /// Perform one optimization step on a collected rollout
    ///
    /// Sums both bundle totals, backpropagates through the rollout's logits
    /// and values, and applies a clipped Adam step.
    pub fn update(&mut self, rollout: &RolloutOutput<B>) -> UpdateReport {
        let (bundle0, bundle1, mean_reward) = self.compute_loss(rollout);

        let total = bundle0.total() + bundle1.total();

        let report = UpdateReport {
            loss_actions: scalar(&bundle0.loss_actions) + scalar(&bundle1.loss_actions),
            loss_values: scalar(&bundle0.loss_values),
            loss_entropy: scalar(&bundle0.loss_entropy) + scalar(&bundle1.loss_entropy),
            loss_total: scalar(&total),
            mean_reward,
        };

        let grads = total.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self
            .optim
            .step(self.config.learning_rate, self.network.clone(), grads);

        self.epochs_trained += 1;

        report
    }

    /// Get a reference to the neural network
    pub fn network(&self) -> &ActorCriticNetwork<B> {
        &self.network
    }

    /// Get the network architecture configuration
    pub fn network_config(&self) -> &ActorCriticConfig {
        &self.network_config
    }

    /// Get a reference to the trainer configuration
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Get the device used for computation
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Number of completed training epochs
    pub fn epochs_trained(&self) -> usize {
        self.epochs_trained
    }

    /// Restore the epoch counter from a checkpoint
    pub fn set_epochs_trained(&mut self, epochs: usize) {
        self.epochs_trained = epochs;
    }

    /// Snapshot the optimizer state for checkpointing
    pub fn optimizer_record(&self) -> AgentOptimizerRecord<B> {
        self.optim.to_record()
    }

    /// Restore the optimizer state from a checkpoint
    pub fn load_optimizer_record(&mut self, record: AgentOptimizerRecord<B>) {
        let fresh = Self::build_optimizer(&self.config);
        let optim = std::mem::replace(&mut self.optim, fresh);
        self.optim = optim.load_record(record);
    }
}

fn scalar<B: AutodiffBackend>(tensor: &Tensor<B, 1>) -> f32 {
    tensor.clone().into_scalar().elem::<f32>()
}
