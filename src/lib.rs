//! Recurrent actor-critic training for a two-head visuomotor control task
//!
//! This library provides:
//! - RL training infrastructure (rl module): network, rollout collection,
//!   lambda-return estimation, loss composition, checkpointing
//! - Training metrics (metrics module): rolling statistics, persisted
//!   history, reward plotting
//! - Execution modes (modes module): the training driver

pub mod metrics;
pub mod modes;
pub mod rl;
