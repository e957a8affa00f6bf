//! Backend type aliases and device management
//!
//! This module provides convenient type aliases for the Burn backends used in
//! training and inference, as well as helper functions for device management.
//!
//! # Backend Selection
//!
//! - **TrainingBackend**: Autodiff-enabled NdArray backend for training (CPU)
//! - **InferenceBackend**: Plain NdArray backend for inference (CPU)
//!
//! The NdArray backend is sufficient for the 64x64 observation stream and the
//! network size used here. GPU support (via the Wgpu backend) could be added
//! later if needed for larger-scale training.
//!
//! # Example
//!
//! ```rust
//! use ml_pilot::rl::{TrainingBackend, InferenceBackend, default_device};
//!
//! // Create device for training
//! let device = default_device();
//!
//! // Use with training components
//! // let network = ActorCriticConfig::default().init::<TrainingBackend>(&device);
//! ```

use burn::backend::{
    Autodiff,
    ndarray::{NdArray, NdArrayDevice},
};

/// Backend type for training (with autodiff)
///
/// This is the backend used for training the agent. It includes automatic
/// differentiation support needed for gradient-based optimization. Rollouts
/// are collected on this backend as well, so the loss can backpropagate
/// through the recorded logits and value estimates.
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Backend type for inference (without autodiff)
///
/// This is the backend used for running trained models. It's more efficient
/// than the training backend since it doesn't track gradients.
pub type InferenceBackend = NdArray<f32>;

/// Get the default device for computation
///
/// Returns the default NdArray device (CPU). This can be called multiple times
/// safely as it uses Burn's device management.
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}
