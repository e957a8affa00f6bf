//! Batched environment interface and a synthetic stand-in implementation
//!
//! The real environment lives outside this crate; the trainer only relies on
//! the batched [`VectorEnv`] contract. [`SyntheticEnv`] implements that
//! contract with a deterministic, seeded dynamic so the training loop can be
//! exercised end-to-end without external collaborators.

use burn::tensor::{Int, Tensor, TensorData, backend::Backend};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of stepping all environment instances once
#[derive(Debug, Clone)]
pub struct EnvStep<B: Backend> {
    /// Primary viewpoint: `[num_envs, channels, size, size]`, values in [0, 1]
    pub observations0: Tensor<B, 4>,
    /// Secondary viewpoint carried by the wire interface; the trainer
    /// currently ignores it
    pub observations1: Tensor<B, 4>,
    /// Per-instance rewards
    pub rewards: Vec<f32>,
    /// Per-instance termination flags
    pub dones: Vec<bool>,
}

/// Batched environment collaborator
///
/// All instances advance together. Termination is expected to be lock-step:
/// when any instance reports done, all must. The rollout collector enforces
/// this with a fatal assertion.
pub trait VectorEnv<B: Backend> {
    /// Number of parallel environment instances
    fn num_envs(&self) -> usize;

    /// Reset all instances to the start of a fresh episode
    fn reset(&mut self);

    /// Step all instances with one action pair per instance
    ///
    /// # Arguments
    ///
    /// * `actions` - `[num_envs, 2]` integer tensor, one action per head
    fn step(&mut self, actions: Tensor<B, 2, Int>) -> EnvStep<B>;
}

/// Deterministic synthetic environment
///
/// Observations are seeded pseudo-random images in [0, 1). Each instance has
/// a hidden target action for the first head and pays reward 1.0 whenever it
/// is chosen. Episodes have a fixed length and terminate in lock-step;
/// [`Self::with_desynchronized_termination`] breaks the lock-step on the
/// first instance, which is used to exercise the collector's assertion.
pub struct SyntheticEnv<B: Backend> {
    num_envs: usize,
    episode_len: usize,
    image_size: usize,
    num_actions: usize,
    desync_first: bool,
    steps_taken: usize,
    target_actions: Vec<i64>,
    rng: StdRng,
    device: B::Device,
}

impl<B: Backend> SyntheticEnv<B> {
    /// Create a new synthetic environment
    ///
    /// # Arguments
    ///
    /// * `num_envs` - number of parallel instances
    /// * `episode_len` - in-episode steps after the initial null step
    /// * `seed` - RNG seed for observations and targets
    /// * `device` - device to place observation tensors on
    pub fn new(num_envs: usize, episode_len: usize, seed: u64, device: B::Device) -> Self {
        assert!(num_envs > 0, "need at least one environment instance");
        assert!(episode_len > 0, "episode_len must be positive");

        Self {
            num_envs,
            episode_len,
            image_size: 64,
            num_actions: 7,
            desync_first: false,
            steps_taken: 0,
            target_actions: vec![0; num_envs],
            rng: StdRng::seed_from_u64(seed),
            device,
        }
    }

    /// Override the observation resolution (default 64)
    pub fn with_image_size(mut self, image_size: usize) -> Self {
        self.image_size = image_size;
        self
    }

    /// Make the first instance terminate one step before the others
    ///
    /// This violates the lock-step termination contract on purpose.
    pub fn with_desynchronized_termination(mut self) -> Self {
        self.desync_first = true;
        self
    }

    fn random_observations(&mut self) -> Tensor<B, 4> {
        let len = self.num_envs * 3 * self.image_size * self.image_size;
        let data: Vec<f32> = (0..len).map(|_| self.rng.gen::<f32>()).collect();
        Tensor::from_data(
            TensorData::new(
                data,
                [self.num_envs, 3, self.image_size, self.image_size],
            ),
            &self.device,
        )
    }
}

impl<B: Backend> VectorEnv<B> for SyntheticEnv<B> {
    fn num_envs(&self) -> usize {
        self.num_envs
    }

    fn reset(&mut self) {
        self.steps_taken = 0;
        self.target_actions = (0..self.num_envs)
            .map(|_| self.rng.gen_range(0..self.num_actions as i64))
            .collect();
    }

    fn step(&mut self, actions: Tensor<B, 2, Int>) -> EnvStep<B> {
        assert_eq!(
            actions.dims(),
            [self.num_envs, 2],
            "expected one action pair per instance"
        );

        self.steps_taken += 1;

        let actions_data = actions.to_data().convert::<i64>();
        let actions_slice = actions_data.to_vec::<i64>().expect("actions data");

        let rewards: Vec<f32> = (0..self.num_envs)
            .map(|env| {
                if actions_slice[env * 2] == self.target_actions[env] {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        // The first step after reset is the null step that produces the
        // initial observation, so an episode of length L terminates on
        // step call L + 1.
        let done = self.steps_taken > self.episode_len;
        let mut dones = vec![done; self.num_envs];
        if self.desync_first && self.steps_taken + 1 > self.episode_len {
            dones[0] = true;
        }

        EnvStep {
            observations0: self.random_observations(),
            observations1: self.random_observations(),
            rewards,
            dones,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::tensor::ElementConversion;

    type TestBackend = NdArray<f32>;

    fn null_actions(num_envs: usize) -> Tensor<TestBackend, 2, Int> {
        let device = NdArrayDevice::default();
        Tensor::zeros([num_envs, 2], &device)
    }

    #[test]
    fn test_observation_shape_and_range() {
        let device = NdArrayDevice::default();
        let mut env = SyntheticEnv::<TestBackend>::new(3, 5, 42, device).with_image_size(16);
        env.reset();

        let step = env.step(null_actions(3));

        assert_eq!(step.observations0.dims(), [3, 3, 16, 16]);
        assert_eq!(step.observations1.dims(), [3, 3, 16, 16]);

        let min = step.observations0.clone().min().into_scalar().elem::<f32>();
        let max = step.observations0.max().into_scalar().elem::<f32>();
        assert!(min >= 0.0);
        assert!(max <= 1.0);
    }

    #[test]
    fn test_lock_step_termination_after_episode_len() {
        let device = NdArrayDevice::default();
        let mut env = SyntheticEnv::<TestBackend>::new(4, 3, 1, device).with_image_size(16);
        env.reset();

        // The null step plus episode_len - 1 in-episode steps, none terminal.
        for _ in 0..3 {
            let step = env.step(null_actions(4));
            assert!(step.dones.iter().all(|&d| !d));
        }

        // The next step terminates every instance together.
        let step = env.step(null_actions(4));
        assert!(step.dones.iter().all(|&d| d));
    }

    #[test]
    fn test_desynchronized_termination_only_hits_first_instance() {
        let device = NdArrayDevice::default();
        let mut env = SyntheticEnv::<TestBackend>::new(4, 3, 1, device)
            .with_image_size(16)
            .with_desynchronized_termination();
        env.reset();

        for _ in 0..2 {
            let step = env.step(null_actions(4));
            assert!(step.dones.iter().all(|&d| !d));
        }

        // One step before the regular episode end only the first instance
        // terminates.
        let step = env.step(null_actions(4));
        assert!(step.dones[0]);
        assert!(step.dones[1..].iter().all(|&d| !d));
    }

    #[test]
    fn test_same_seed_reproduces_observations() {
        let device = NdArrayDevice::default();
        let mut env_a =
            SyntheticEnv::<TestBackend>::new(2, 4, 7, device.clone()).with_image_size(16);
        let mut env_b = SyntheticEnv::<TestBackend>::new(2, 4, 7, device).with_image_size(16);
        env_a.reset();
        env_b.reset();

        let obs_a = env_a.step(null_actions(2)).observations0.into_data();
        let obs_b = env_b.step(null_actions(2)).observations0.into_data();

        assert_eq!(
            obs_a.to_vec::<f32>().unwrap(),
            obs_b.to_vec::<f32>().unwrap()
        );
    }

    #[test]
    fn test_reward_follows_target_action() {
        let device = NdArrayDevice::default();
        let mut env =
            SyntheticEnv::<TestBackend>::new(1, 5, 3, device.clone()).with_image_size(16);
        env.reset();
        let target = env.target_actions[0];

        let actions = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![target, 0], [1, 2]),
            &device,
        );
        let step = env.step(actions);
        assert_eq!(step.rewards, vec![1.0]);

        let miss = (target + 1) % 7;
        let actions = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![miss, 0], [1, 2]),
            &device,
        );
        let step = env.step(actions);
        assert_eq!(step.rewards, vec![0.0]);
    }
}
