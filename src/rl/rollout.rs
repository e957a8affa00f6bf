//! On-policy rollout collection
//!
//! The collector drives the agent and a batched environment through one
//! episode (or up to the horizon) and assembles the per-step records into
//! batch-major tensors. Logits and value estimates keep their autodiff graph:
//! the loss backpropagates through the rollout itself, so there is no second
//! forward pass at update time.

use super::agent::ActorCriticAgent;
use super::environment::VectorEnv;
use burn::tensor::{
    Bool, Int, Tensor, TensorData, activation::softmax, backend::AutodiffBackend,
};
use rand::Rng;

/// A collected rollout, batch-major: every tensor shares the
/// `[num_envs, num_steps]` prefix
#[derive(Debug, Clone)]
pub struct RolloutOutput<B: AutodiffBackend> {
    /// Observations quantized to 0..=255: `[num_envs, num_steps, channels, size, size]`
    ///
    /// Storage only; detached from the autodiff graph.
    pub observations: Tensor<B, 5, Int>,
    /// Sampled actions of the first head: `[num_envs, num_steps]`
    pub actions0: Tensor<B, 2, Int>,
    /// Sampled actions of the second head: `[num_envs, num_steps]`
    pub actions1: Tensor<B, 2, Int>,
    /// First-head logits with autodiff graph: `[num_envs, num_steps, num_actions]`
    pub logits_actions0: Tensor<B, 3>,
    /// Second-head logits with autodiff graph: `[num_envs, num_steps, num_actions]`
    pub logits_actions1: Tensor<B, 3>,
    /// Value estimates with autodiff graph: `[num_envs, num_steps]`
    pub values: Tensor<B, 2>,
    /// Rewards observed after each recorded step: `[num_envs, num_steps]`
    pub rewards: Tensor<B, 2>,
    /// Termination flags: `[num_envs, num_steps]`
    pub ends: Tensor<B, 2, Bool>,
}

impl<B: AutodiffBackend> RolloutOutput<B> {
    /// Number of environment instances in the rollout
    pub fn num_envs(&self) -> usize {
        self.values.dims()[0]
    }

    /// Number of recorded steps
    pub fn num_steps(&self) -> usize {
        self.values.dims()[1]
    }
}

/// Collect one rollout of up to `horizon` steps
///
/// The sequence per rollout is: reset the agent's recurrent state for the
/// environment batch, reset the environment, obtain the initial observation
/// with a null (all-zero) action step, then repeatedly forward, sample one
/// action per head (independent categorical draws, not a joint distribution)
/// and step the environment. Collection stops at the first termination or at
/// the horizon, and the agent's recurrent state is cleared before returning.
///
/// # Panics
///
/// Panics if the environments terminate out of lock-step: a partial
/// termination means the batch semantics are broken upstream.
pub fn collect_rollout<B: AutodiffBackend, E: VectorEnv<B>>(
    agent: &mut ActorCriticAgent<B>,
    env: &mut E,
    horizon: usize,
) -> RolloutOutput<B> {
    let num_envs = env.num_envs();
    let device = agent.device().clone();

    agent.reset(num_envs);
    env.reset();

    // Null action step to obtain the initial observation.
    let null_actions = Tensor::<B, 2, Int>::zeros([num_envs, 2], &device);
    let first = env.step(null_actions);
    let mut observations = first.observations0;

    let mut obs_steps: Vec<Tensor<B, 5, Int>> = Vec::new();
    let mut logits0_steps: Vec<Tensor<B, 3>> = Vec::new();
    let mut logits1_steps: Vec<Tensor<B, 3>> = Vec::new();
    let mut values_steps: Vec<Tensor<B, 3>> = Vec::new();
    let mut actions0_steps: Vec<Vec<i64>> = Vec::new();
    let mut actions1_steps: Vec<Vec<i64>> = Vec::new();
    let mut rewards_steps: Vec<Vec<f32>> = Vec::new();
    let mut dones_steps: Vec<Vec<bool>> = Vec::new();

    for _ in 0..horizon {
        let output = agent.forward(observations.clone());

        let sampled0 = sample_action_batch(&output.logits_actions0);
        let sampled1 = sample_action_batch(&output.logits_actions1);

        // Quantize the decision observation for storage; the graph lives in
        // the logits and values, not here.
        let quantized = observations
            .detach()
            .mul_scalar(255.0)
            .int()
            .unsqueeze_dim::<5>(1);
        obs_steps.push(quantized);
        logits0_steps.push(output.logits_actions0);
        logits1_steps.push(output.logits_actions1);
        values_steps.push(output.means_values);

        let mut action_pairs = Vec::with_capacity(num_envs * 2);
        for env_idx in 0..num_envs {
            action_pairs.push(sampled0[env_idx]);
            action_pairs.push(sampled1[env_idx]);
        }
        let actions = Tensor::<B, 2, Int>::from_data(
            TensorData::new(action_pairs, [num_envs, 2]),
            &device,
        );
        let step = env.step(actions);

        actions0_steps.push(sampled0);
        actions1_steps.push(sampled1);
        rewards_steps.push(step.rewards);
        dones_steps.push(step.dones.clone());

        if step.dones.iter().any(|&done| done) {
            assert!(
                step.dones.iter().all(|&done| done),
                "environments must terminate in lock-step, got partial termination: {:?}",
                step.dones
            );
            break;
        }

        observations = step.observations0;
    }

    // State must not leak into the next rollout.
    agent.clear();

    let num_steps = values_steps.len();
    assert!(num_steps > 0, "horizon must allow at least one step");

    let observations = Tensor::cat(obs_steps, 1);
    let logits_actions0 = Tensor::cat(logits0_steps, 1);
    let logits_actions1 = Tensor::cat(logits1_steps, 1);
    let values = Tensor::cat(values_steps, 1).squeeze::<2>(2);

    RolloutOutput {
        observations,
        actions0: assemble_int(&actions0_steps, num_envs, num_steps, &device),
        actions1: assemble_int(&actions1_steps, num_envs, num_steps, &device),
        logits_actions0,
        logits_actions1,
        values,
        rewards: assemble_floats(&rewards_steps, num_envs, num_steps, &device),
        ends: assemble_bools(&dones_steps, num_envs, num_steps, &device),
    }
}

/// Sample one categorical action per batch row from `[num_envs, 1, num_actions]` logits
fn sample_action_batch<B: AutodiffBackend>(logits: &Tensor<B, 3>) -> Vec<i64> {
    let [num_envs, _, num_actions] = logits.dims();
    let probs = softmax(logits.clone().detach(), 2);
    let probs_data = probs.into_data().convert::<f32>();
    let probs_slice = probs_data.to_vec::<f32>().expect("probability data");

    let mut rng = rand::thread_rng();
    let mut sampled = Vec::with_capacity(num_envs);
    for row in probs_slice.chunks(num_actions) {
        let random_val: f32 = rng.sample(rand::distributions::Standard);
        sampled.push(sample_categorical(row, random_val));
    }
    sampled
}

/// Invert the CDF of one probability row at `random_val`
fn sample_categorical(probs: &[f32], random_val: f32) -> i64 {
    let mut cumsum = 0.0;
    for (idx, &prob) in probs.iter().enumerate() {
        cumsum += prob;
        if random_val < cumsum {
            return idx as i64;
        }
    }

    // Fallback to the last action
    probs.len() as i64 - 1
}

// Per-step records arrive time-major; flatten them env-major to match the
// [num_envs, num_steps] layout of the output tensors.

fn assemble_int<B: AutodiffBackend>(
    steps: &[Vec<i64>],
    num_envs: usize,
    num_steps: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let mut flat = Vec::with_capacity(num_envs * num_steps);
    for env_idx in 0..num_envs {
        for step in steps.iter().take(num_steps) {
            flat.push(step[env_idx]);
        }
    }
    Tensor::from_data(TensorData::new(flat, [num_envs, num_steps]), device)
}

fn assemble_floats<B: AutodiffBackend>(
    steps: &[Vec<f32>],
    num_envs: usize,
    num_steps: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut flat = Vec::with_capacity(num_envs * num_steps);
    for env_idx in 0..num_envs {
        for step in steps.iter().take(num_steps) {
            flat.push(step[env_idx]);
        }
    }
    Tensor::from_data(TensorData::new(flat, [num_envs, num_steps]), device)
}

fn assemble_bools<B: AutodiffBackend>(
    steps: &[Vec<bool>],
    num_envs: usize,
    num_steps: usize,
    device: &B::Device,
) -> Tensor<B, 2, Bool> {
    let mut flat = Vec::with_capacity(num_envs * num_steps);
    for env_idx in 0..num_envs {
        for step in steps.iter().take(num_steps) {
            flat.push(step[env_idx]);
        }
    }
    Tensor::from_data(TensorData::new(flat, [num_envs, num_steps]), device)
}
