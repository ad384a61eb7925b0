//! Progress easing curves
//!
//! The story scroller maps elapsed time to scroll position through an
//! ease-in-out curve rather than linearly, to mimic natural reading
//! acceleration and deceleration.

use std::f32::consts::PI;

/// Ease-in-out (cosine S-curve): v(t) = 0.5 * (1 - cos(pi * t))
///
/// Input is normalized elapsed time, clamped to [0.0, 1.0]. Output is the
/// normalized progress position, also in [0.0, 1.0]. Monotone, with
/// v(0) = 0, v(0.5) = 0.5, v(1) = 1.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    0.5 * (1.0 - (PI * t).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_midpoint() {
        assert!((ease_in_out(0.0) - 0.0).abs() < 1e-6);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!((ease_in_out(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn clamps_out_of_range_input() {
        assert!((ease_in_out(-1.0) - 0.0).abs() < 1e-6);
        assert!((ease_in_out(2.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn monotonically_non_decreasing() {
        let mut last = 0.0f32;
        for i in 0..=100 {
            let v = ease_in_out(i as f32 / 100.0);
            assert!(v >= last - 1e-6, "decreased at t={}", i);
            last = v;
        }
    }

    #[test]
    fn slower_at_edges_than_linear() {
        // Eased progress lags linear early and leads it late
        assert!(ease_in_out(0.1) < 0.1);
        assert!(ease_in_out(0.9) > 0.9);
    }
}
