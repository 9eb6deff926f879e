//! Time-driven motion
//!
//! Animation is a pure function of wall-clock time so it runs at the same
//! speed regardless of frame rate.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{SPHERE_AMPLITUDE, SPHERE_BASELINE, SPHERE_FREQUENCY};

/// Milliseconds since the Unix epoch
pub fn epoch_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Height of the animated sphere at `epoch_ms`
pub fn sphere_height(epoch_ms: f64) -> f32 {
    // Reduce the phase in f64 first; epoch milliseconds overflow f32 precision
    let phase = (epoch_ms * SPHERE_FREQUENCY) % std::f64::consts::TAU;
    SPHERE_BASELINE + SPHERE_AMPLITUDE * phase.sin() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_at_epoch_is_baseline() {
        assert_eq!(sphere_height(0.0), 2.0);
    }

    #[test]
    fn test_height_peaks_after_quarter_period() {
        let quarter = std::f64::consts::FRAC_PI_2 / SPHERE_FREQUENCY;
        assert!((sphere_height(quarter) - 4.0).abs() < 1e-5);
        assert!((sphere_height(3.0 * quarter) - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_height_stays_in_range() {
        let now = epoch_millis();
        for step in 0..10_000 {
            let y = sphere_height(now + step as f64 * 17.0);
            assert!((0.0..=4.0).contains(&y), "y = {y}");
        }
    }
}
