//! Recurrent actor-critic network for two-head visuomotor control
//!
//! This module implements a convolutional network with an LSTM core and three
//! output heads:
//! - **Two actor heads**: independent 7-way action logits per head
//! - **Critic head**: a single value estimate for the observed state
//!
//! # Architecture
//!
//! ```text
//! Input: [batch, 3, 64, 64] in [0, 1], rescaled to [-1, 1]
//!   ↓ Conv2d(3→32, k=3, p=1) + MaxPool(2x2) + ReLU   → [batch, 32, 32, 32]
//!   ↓ Conv2d(32→32, k=3, p=1) + MaxPool(2x2) + ReLU  → [batch, 32, 16, 16]
//!   ↓ Conv2d(32→64, k=3, p=1) + MaxPool(2x2) + ReLU  → [batch, 64, 8, 8]
//!   ↓ Conv2d(64→64, k=3, p=1) + MaxPool(2x2) + ReLU  → [batch, 64, 4, 4]
//!   ↓ Flatten: [batch, 1024]
//!   ↓ LSTM(1024 → 512) with caller-provided state
//!   ↓ Split
//!   ├─→ Actor 0: Linear(512 → 7) → logits [batch, 1, 7]
//!   ├─→ Actor 1: Linear(512 → 7) → logits [batch, 1, 7]
//!   └─→ Critic:  Linear(512 → 1) → value  [batch, 1, 1]
//! ```
//!
//! The network itself is a pure function of observation and recurrent state:
//! `forward(observation, state) -> (output, new_state)`. Ownership of the
//! state across a rollout lives in [`crate::rl::ActorCriticAgent`].
//!
//! Outputs keep an explicit singleton time axis so the rollout collector can
//! concatenate per-step outputs along dimension 1 without reshaping.

use burn::{
    module::Module,
    nn::{
        Linear, LinearConfig, Lstm, LstmConfig, LstmState, PaddingConfig2d,
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
    },
    tensor::{ElementConversion, Tensor, activation::relu, backend::Backend},
};
use serde::{Deserialize, Serialize};

/// Configuration for the recurrent actor-critic network
///
/// The defaults describe the production architecture; tests shrink
/// `image_size` and the channel counts to keep forward passes cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorCriticConfig {
    /// Number of input channels (default: 3, RGB)
    pub input_channels: usize,

    /// Height and width of the (square) input image in pixels (default: 64)
    ///
    /// Must be divisible by 16: each of the four pooling stages halves the
    /// spatial resolution.
    pub image_size: usize,

    /// Number of discrete actions per action head (default: 7)
    pub num_actions: usize,

    /// Output channels of the four convolutional stages (default: [32, 32, 64, 64])
    pub conv_channels: [usize; 4],

    /// Hidden width of the LSTM core (default: 512)
    pub lstm_hidden: usize,
}

impl ActorCriticConfig {
    /// Create a new configuration with default hyperparameters
    pub fn new() -> Self {
        Self {
            input_channels: 3,
            image_size: 64,
            num_actions: 7,
            conv_channels: [32, 32, 64, 64],
            lstm_hidden: 512,
        }
    }

    /// Initialize the network from this configuration
    ///
    /// # Arguments
    ///
    /// * `device` - The device to place the network on
    ///
    /// # Example
    ///
    /// ```rust
    /// use ml_pilot::rl::ActorCriticConfig;
    /// use burn::backend::ndarray::NdArrayDevice;
    /// use burn::backend::NdArray;
    ///
    /// type Backend = NdArray<f32>;
    ///
    /// let device = NdArrayDevice::default();
    /// let network = ActorCriticConfig::new().init::<Backend>(&device);
    /// ```
    pub fn init<B: Backend>(&self, device: &B::Device) -> ActorCriticNetwork<B> {
        assert!(
            self.image_size % 16 == 0 && self.image_size > 0,
            "image_size must be a positive multiple of 16, got {}",
            self.image_size
        );

        // Each stage halves the spatial resolution via max-pooling.
        let final_spatial = self.image_size / 16;
        let lstm_input = self.conv_channels[3] * final_spatial * final_spatial;

        ActorCriticNetwork {
            conv1: Conv2dConfig::new([self.input_channels, self.conv_channels[0]], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            conv2: Conv2dConfig::new([self.conv_channels[0], self.conv_channels[1]], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            conv3: Conv2dConfig::new([self.conv_channels[1], self.conv_channels[2]], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            conv4: Conv2dConfig::new([self.conv_channels[2], self.conv_channels[3]], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            lstm: LstmConfig::new(lstm_input, self.lstm_hidden, true).init(device),
            actor_head0: LinearConfig::new(self.lstm_hidden, self.num_actions).init(device),
            actor_head1: LinearConfig::new(self.lstm_hidden, self.num_actions).init(device),
            critic_head: LinearConfig::new(self.lstm_hidden, 1).init(device),
            input_channels: self.input_channels,
            image_size: self.image_size,
            lstm_hidden: self.lstm_hidden,
        }
    }
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Output of a single forward pass
///
/// All tensors carry a singleton time axis at dimension 1 so the collector
/// can concatenate outputs of consecutive steps along time.
#[derive(Debug, Clone)]
pub struct ActorCriticOutput<B: Backend> {
    /// Action logits for the first head: `[batch, 1, num_actions]`
    pub logits_actions0: Tensor<B, 3>,
    /// Action logits for the second head: `[batch, 1, num_actions]`
    pub logits_actions1: Tensor<B, 3>,
    /// Value estimates: `[batch, 1, 1]`
    pub means_values: Tensor<B, 3>,
}

/// Recurrent actor-critic network
///
/// Pure with respect to its recurrent state: the caller passes the LSTM state
/// in and receives the updated state back. See the module documentation for
/// the full architecture.
///
/// # Type Parameters
///
/// * `B` - The Burn backend (e.g. `NdArray<f32>`, `Autodiff<NdArray<f32>>`)
#[derive(Module, Debug)]
pub struct ActorCriticNetwork<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    conv4: Conv2d<B>,
    pool: MaxPool2d,
    lstm: Lstm<B>,
    actor_head0: Linear<B>,
    actor_head1: Linear<B>,
    critic_head: Linear<B>,
    input_channels: usize,
    image_size: usize,
    lstm_hidden: usize,
}

impl<B: Backend> ActorCriticNetwork<B> {
    /// Forward pass through the network
    ///
    /// # Arguments
    ///
    /// * `observations` - Tensor with shape `[batch, channels, size, size]`,
    ///   values in `[0, 1]`
    /// * `state` - LSTM state for this batch, as returned by a previous call
    ///   or by [`Self::initial_state`]
    ///
    /// # Returns
    ///
    /// The per-head outputs and the updated LSTM state.
    ///
    /// # Panics
    ///
    /// Panics if the observation shape does not match the configured channel
    /// count and image size, or if any value lies outside `[0, 1]`. Both are
    /// upstream data corruption and must not be silently absorbed.
    pub fn forward(
        &self,
        observations: Tensor<B, 4>,
        state: LstmState<B, 2>,
    ) -> (ActorCriticOutput<B>, LstmState<B, 2>) {
        let [batch_size, channels, height, width] = observations.dims();
        assert_eq!(
            channels, self.input_channels,
            "expected {} observation channels, got {}",
            self.input_channels, channels
        );
        assert_eq!(
            [height, width],
            [self.image_size, self.image_size],
            "expected {0}x{0} observations, got {1}x{2}",
            self.image_size,
            height,
            width
        );

        let min = observations.clone().min().into_scalar().elem::<f32>();
        let max = observations.clone().max().into_scalar().elem::<f32>();
        assert!(
            min >= 0.0 && max <= 1.0,
            "observation values must lie in [0, 1], got range [{min}, {max}]"
        );

        // Rescale [0, 1] → [-1, 1]
        let x = observations.mul_scalar(2.0).sub_scalar(1.0);

        let x = relu(self.pool.forward(self.conv1.forward(x)));
        let x = relu(self.pool.forward(self.conv2.forward(x)));
        let x = relu(self.pool.forward(self.conv3.forward(x)));
        let x = relu(self.pool.forward(self.conv4.forward(x)));

        // Flatten to a length-1 sequence: [batch, 1, features]
        let [_, c, h, w] = x.dims();
        let x = x.reshape([batch_size, 1, c * h * w]);

        let (lstm_out, new_state) = self.lstm.forward(x, Some(state));
        // lstm_out: [batch, 1, lstm_hidden]

        let output = ActorCriticOutput {
            logits_actions0: self.actor_head0.forward(lstm_out.clone()),
            logits_actions1: self.actor_head1.forward(lstm_out.clone()),
            means_values: self.critic_head.forward(lstm_out),
        };

        (output, new_state)
    }

    /// Create a zeroed LSTM state for a batch of `batch_size` environments
    pub fn initial_state(&self, batch_size: usize, device: &B::Device) -> LstmState<B, 2> {
        let cell = Tensor::zeros([batch_size, self.lstm_hidden], device);
        let hidden = Tensor::zeros([batch_size, self.lstm_hidden], device);
        LstmState::new(cell, hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::Autodiff;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use burn::tensor::{Distribution, TensorData};

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    /// Reduced architecture so forward passes stay cheap in tests
    fn small_config() -> ActorCriticConfig {
        ActorCriticConfig {
            input_channels: 3,
            image_size: 32,
            num_actions: 7,
            conv_channels: [8, 8, 8, 8],
            lstm_hidden: 32,
        }
    }

    #[test]
    fn test_forward_pass_shapes() {
        let device = NdArrayDevice::default();
        let network = small_config().init::<TestBackend>(&device);

        let observations = Tensor::zeros([2, 3, 32, 32], &device);
        let state = network.initial_state(2, &device);

        let (output, new_state) = network.forward(observations, state);

        assert_eq!(output.logits_actions0.dims(), [2, 1, 7]);
        assert_eq!(output.logits_actions1.dims(), [2, 1, 7]);
        assert_eq!(output.means_values.dims(), [2, 1, 1]);
        assert_eq!(new_state.hidden.dims(), [2, 32]);
        assert_eq!(new_state.cell.dims(), [2, 32]);
    }

    #[test]
    fn test_full_size_forward_pass_shapes() {
        let device = NdArrayDevice::default();
        let network = ActorCriticConfig::new().init::<TestBackend>(&device);

        let observations = Tensor::zeros([1, 3, 64, 64], &device);
        let state = network.initial_state(1, &device);

        let (output, new_state) = network.forward(observations, state);

        assert_eq!(output.logits_actions0.dims(), [1, 1, 7]);
        assert_eq!(output.logits_actions1.dims(), [1, 1, 7]);
        assert_eq!(output.means_values.dims(), [1, 1, 1]);
        assert_eq!(new_state.hidden.dims(), [1, 512]);
    }

    #[test]
    fn test_different_batch_sizes() {
        let device = NdArrayDevice::default();
        let network = small_config().init::<TestBackend>(&device);

        for batch_size in [1, 4, 8] {
            let observations = Tensor::zeros([batch_size, 3, 32, 32], &device);
            let state = network.initial_state(batch_size, &device);

            let (output, _) = network.forward(observations, state);

            assert_eq!(output.logits_actions0.dims(), [batch_size, 1, 7]);
            assert_eq!(output.logits_actions1.dims(), [batch_size, 1, 7]);
            assert_eq!(output.means_values.dims(), [batch_size, 1, 1]);
        }
    }

    #[test]
    #[should_panic(expected = "observation channels")]
    fn test_rejects_wrong_channel_count() {
        let device = NdArrayDevice::default();
        let network = small_config().init::<TestBackend>(&device);

        let observations = Tensor::zeros([2, 4, 32, 32], &device);
        let state = network.initial_state(2, &device);
        let _ = network.forward(observations, state);
    }

    #[test]
    #[should_panic(expected = "32x32 observations")]
    fn test_rejects_wrong_spatial_size() {
        let device = NdArrayDevice::default();
        let network = small_config().init::<TestBackend>(&device);

        let observations = Tensor::zeros([2, 3, 16, 16], &device);
        let state = network.initial_state(2, &device);
        let _ = network.forward(observations, state);
    }

    #[test]
    #[should_panic(expected = "must lie in [0, 1]")]
    fn test_rejects_out_of_range_values() {
        let device = NdArrayDevice::default();
        let network = small_config().init::<TestBackend>(&device);

        let observations = Tensor::<TestBackend, 4>::ones([1, 3, 32, 32], &device).mul_scalar(2.0);
        let state = network.initial_state(1, &device);
        let _ = network.forward(observations, state);
    }

    #[test]
    fn test_state_threading_changes_output() {
        let device = NdArrayDevice::default();
        let network = small_config().init::<TestBackend>(&device);

        let observations =
            Tensor::random([1, 3, 32, 32], Distribution::Uniform(0.0, 1.0), &device);

        // Same observation twice, threading the state: the recurrent core
        // should make the second output differ from the first.
        let state = network.initial_state(1, &device);
        let (out1, state) = network.forward(observations.clone(), state);
        let (out2, _) = network.forward(observations, state);

        let data1: TensorData = out1.logits_actions0.into_data();
        let data2: TensorData = out2.logits_actions0.into_data();
        let vals1 = data1.as_slice::<f32>().unwrap();
        let vals2 = data2.as_slice::<f32>().unwrap();

        let max_diff = vals1
            .iter()
            .zip(vals2.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(
            max_diff > 1e-7,
            "recurrent state should influence the output, max diff: {max_diff}"
        );
    }

    #[test]
    fn test_gradient_flow() {
        let device = NdArrayDevice::default();
        let network = small_config().init::<TestAutodiffBackend>(&device);

        let observations = Tensor::ones([1, 3, 32, 32], &device)
            .mul_scalar(0.5)
            .require_grad();
        let state = network.initial_state(1, &device);

        let (output, _) = network.forward(observations.clone(), state);
        let loss = output.logits_actions0.sum()
            + output.logits_actions1.sum()
            + output.means_values.sum();
        let gradients = loss.backward();

        let obs_grad = observations.grad(&gradients);
        assert!(
            obs_grad.is_some(),
            "Gradients should flow back to input observations"
        );

        let grad_data: TensorData = obs_grad.unwrap().into_data();
        let grad_sum: f32 = grad_data.as_slice::<f32>().unwrap().iter().sum();
        assert!(
            grad_sum.abs() > 1e-6,
            "Gradients should be non-zero, got sum: {grad_sum}"
        );
    }

    #[test]
    fn test_output_finite() {
        let device = NdArrayDevice::default();
        let network = small_config().init::<TestBackend>(&device);

        let observations =
            Tensor::random([4, 3, 32, 32], Distribution::Uniform(0.0, 1.0), &device);
        let state = network.initial_state(4, &device);

        let (output, _) = network.forward(observations, state);

        for tensor in [
            output.logits_actions0,
            output.logits_actions1,
            output.means_values,
        ] {
            let data: TensorData = tensor.into_data();
            for &val in data.as_slice::<f32>().unwrap() {
                assert!(val.is_finite(), "Outputs should be finite, got: {val}");
            }
        }
    }
}
