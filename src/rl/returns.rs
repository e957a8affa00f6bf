//! Lambda-return computation for advantage estimation

use burn::tensor::{Bool, Tensor, TensorData, backend::Backend};

/// Compute lambda-returns with a backward recursion over the time axis
///
/// For each environment row the recursion is:
///
/// ```text
/// R[T-1] = V[T-1]
/// R[t]   = r[t] + !end[t] * gamma * ((1 - lambda) * V[t+1] + lambda * R[t+1])
/// ```
///
/// The final slot only seeds the bootstrap and never becomes a training
/// target; callers slice it off before comparing returns against values.
///
/// The computation runs on the host over plain `f32` data, so the resulting
/// tensor is a constant: no gradient flows from the returns back into the
/// value estimates.
///
/// # Arguments
///
/// * `rewards` - `[num_envs, num_steps]` per-step rewards
/// * `values` - `[num_envs, num_steps]` value estimates
/// * `ends` - `[num_envs, num_steps]` termination flags
/// * `gamma` - discount factor
/// * `lambda` - mixing factor between TD and Monte Carlo targets
///
/// # Returns
///
/// A `[num_envs, num_steps]` tensor of return targets.
pub fn compute_lambda_returns<B: Backend>(
    rewards: &Tensor<B, 2>,
    values: &Tensor<B, 2>,
    ends: &Tensor<B, 2, Bool>,
    gamma: f32,
    lambda: f32,
) -> Tensor<B, 2> {
    let [num_envs, num_steps] = rewards.dims();
    assert_eq!(
        values.dims(),
        [num_envs, num_steps],
        "values shape must match rewards"
    );
    assert_eq!(
        ends.dims(),
        [num_envs, num_steps],
        "ends shape must match rewards"
    );
    assert!(num_steps >= 1, "need at least one step to compute returns");

    let device = rewards.device();

    let rewards_data = rewards.to_data().convert::<f32>();
    let rewards_slice = rewards_data.to_vec::<f32>().expect("rewards data");
    let values_data = values.to_data().convert::<f32>();
    let values_slice = values_data.to_vec::<f32>().expect("values data");
    let ends_data = ends.to_data();
    let ends_slice = ends_data.to_vec::<bool>().expect("ends data");

    let mut returns = vec![0.0f32; num_envs * num_steps];

    for env in 0..num_envs {
        let base = env * num_steps;
        returns[base + num_steps - 1] = values_slice[base + num_steps - 1];

        for step in (0..num_steps - 1).rev() {
            let idx = base + step;
            let bootstrap =
                (1.0 - lambda) * values_slice[idx + 1] + lambda * returns[idx + 1];
            returns[idx] = rewards_slice[idx]
                + if ends_slice[idx] { 0.0 } else { gamma * bootstrap };
        }
    }

    Tensor::from_data(TensorData::new(returns, [num_envs, num_steps]), &device)
}
