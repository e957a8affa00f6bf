//! Reward-curve rendering
//!
//! Renders the per-epoch mean-reward sequence to a PNG. Plotting is a
//! best-effort sink: the training driver logs a warning and keeps going if
//! rendering fails.

use anyhow::{Result, anyhow};
use plotters::prelude::*;
use std::path::Path;

/// Render the mean-reward history as a line plot at `path`
///
/// Does nothing when the history is empty. The chart is deliberately
/// text-free so rendering does not depend on system fonts.
pub fn render_reward_curve(rewards: &[f32], path: &Path) -> Result<()> {
    if rewards.is_empty() {
        return Ok(());
    }

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow!("failed to clear plot canvas: {e}"))?;

    let min = rewards.iter().copied().fold(f32::INFINITY, f32::min);
    let max = rewards.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    // Pad the value range so a flat curve still has a visible span.
    let span = (max - min).max(1e-3);
    let y_lo = min - 0.05 * span;
    let y_hi = max + 0.05 * span;
    let x_hi = (rewards.len() as f32).max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(0f32..x_hi, y_lo..y_hi)
        .map_err(|e| anyhow!("failed to build reward chart: {e}"))?;

    chart
        .draw_series(LineSeries::new(
            rewards
                .iter()
                .enumerate()
                .map(|(epoch, &reward)| (epoch as f32, reward)),
            &BLUE,
        ))
        .map_err(|e| anyhow!("failed to draw reward series: {e}"))?;

    root.present()
        .map_err(|e| anyhow!("failed to write plot to {path:?}: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_renders_png_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rewards.png");

        let rewards: Vec<f32> = (0..50).map(|i| (i as f32 * 0.3).sin()).collect();
        render_reward_curve(&rewards, &path).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_flat_curve_renders() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("flat.png");

        render_reward_curve(&[1.0; 10], &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_empty_history_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.png");

        render_reward_curve(&[], &path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_single_point_renders() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("single.png");

        render_reward_curve(&[0.5], &path).unwrap();
        assert!(path.exists());
    }
}
