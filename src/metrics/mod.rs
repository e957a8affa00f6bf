pub mod history;
pub mod plot;
pub mod training_stats;

pub use history::TrainingHistory;
pub use plot::render_reward_curve;
pub use training_stats::TrainingStats;
