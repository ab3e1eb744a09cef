// Angle unwrapping: bounded twist readings -> incremental turn commands
//
// The sensor only reports the twist modulo 2π. Consecutive readings are
// assumed to be less than half a turn apart; faster rotation (or slower
// sampling) aliases to the wrong turn count without any error.

use std::f64::consts::{PI, TAU};

use super::twist::{extract_twist, RotationAxis};
use crate::messages::Orientation;

/// Shortest signed difference `angle - previous`, folded into `[-π, π)`.
///
/// A difference of exactly ±π always lands on `-π`.
pub fn wrap_delta(previous: f64, angle: f64) -> f64 {
    (angle - previous + 3.0 * PI).rem_euclid(TAU) - PI
}

/// Turns the commutator must make to follow `previous -> angle`.
///
/// The sign is inverted so the motor counter-rotates and unwinds the tether.
pub fn unwrap_delta(previous: f64, angle: f64) -> f64 {
    -wrap_delta(previous, angle) / TAU
}

/// Carries the previous twist reading of one session.
#[derive(Debug, Clone, Copy, Default)]
pub struct AngleUnwrapper {
    previous: Option<f64>,
}

impl AngleUnwrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incremental turns since the last reading.
    ///
    /// The first reading only sets the baseline and returns exactly `0.0`.
    /// A non-finite reading returns `NaN` and leaves the baseline untouched.
    pub fn unwrap(&mut self, angle: f64) -> f64 {
        if !angle.is_finite() {
            return f64::NAN;
        }
        let turns = match self.previous {
            Some(previous) => unwrap_delta(previous, angle),
            None => 0.0,
        };
        self.previous = Some(angle);
        turns
    }

    pub fn previous(&self) -> Option<f64> {
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// Orientation samples in, turn increments out, for one axis.
#[derive(Debug, Clone)]
pub struct TurnTracker {
    axis: RotationAxis,
    unwrapper: AngleUnwrapper,
    total_turns: f64,
}

impl TurnTracker {
    pub fn new(axis: RotationAxis) -> Self {
        Self {
            axis,
            unwrapper: AngleUnwrapper::new(),
            total_turns: 0.0,
        }
    }

    /// Turn increment for one sample. `NaN` marks a degenerate sample.
    pub fn update(&mut self, orientation: &Orientation) -> f64 {
        let angle = extract_twist(orientation, &self.axis);
        let turns = self.unwrapper.unwrap(angle);
        if turns.is_finite() {
            self.total_turns += turns;
        }
        turns
    }

    /// Sum of all finite increments since the session started
    pub fn total_turns(&self) -> f64 {
        self.total_turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // Choose among the three wrap candidates the one with the smallest magnitude
    fn candidate_delta(previous: f64, angle: f64) -> f64 {
        [angle - previous, angle + TAU - previous, angle - TAU - previous]
            .into_iter()
            .fold(f64::INFINITY, |best, d| if d.abs() < best.abs() { d } else { best })
    }

    // Fold an unbounded angle into (-π, π] like the sensor does
    fn bounded(angle: f64) -> f64 {
        let a = angle.rem_euclid(TAU);
        if a > PI { a - TAU } else { a }
    }

    #[test]
    fn test_first_sample_is_baseline() {
        let mut unwrapper = AngleUnwrapper::new();
        assert_eq!(unwrapper.unwrap(2.5), 0.0);
        assert_eq!(unwrapper.previous(), Some(2.5));
    }

    #[test]
    fn test_boundary_crossing_sequence() {
        let mut unwrapper = AngleUnwrapper::new();
        let turns: Vec<f64> = [3.0, 3.1, -3.1, -3.0]
            .iter()
            .map(|&a| unwrapper.unwrap(a))
            .collect();

        let expected = [
            0.0,
            -0.1 / TAU,
            -(TAU - 6.2) / TAU,
            -0.1 / TAU,
        ];
        for (got, want) in turns.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "got {}, want {}", got, want);
        }
        // Rotation keeps going the same way across the ±π seam
        assert!(turns[1..].iter().all(|t| *t < 0.0));
        assert!((turns[1] + 0.0159).abs() < 1e-4);
        assert!((turns[2] + 0.0132).abs() < 1e-4);
    }

    #[test]
    fn test_continuity_over_many_wraps() {
        let step = 0.9;
        let mut unwrapper = AngleUnwrapper::new();
        let mut sum = 0.0;
        let mut truth = -3.0;
        unwrapper.unwrap(bounded(truth));
        for _ in 0..60 {
            truth += step;
            sum += unwrapper.unwrap(bounded(truth));
        }
        // 60 * 0.9 rad is more than eight turns, so the seam was crossed repeatedly
        assert!((-sum * TAU - 60.0 * step).abs() < 1e-9, "sum {}", sum);
    }

    #[test]
    fn test_reverse_rotation_gives_positive_turns() {
        let mut unwrapper = AngleUnwrapper::new();
        unwrapper.unwrap(-3.0);
        let turns = unwrapper.unwrap(3.0);
        // -3.0 -> 3.0 is a short step backwards across the seam
        assert!(turns > 0.0);
        assert!((turns - (TAU - 6.0) / TAU).abs() < 1e-12);
    }

    #[test]
    fn test_half_turn_tie_break_is_stable() {
        let results: Vec<f64> = (0..10)
            .flat_map(|_| [unwrap_delta(0.0, PI), unwrap_delta(PI, 0.0), unwrap_delta(-PI / 2.0, PI / 2.0)])
            .collect();
        let first = results[0];
        for r in &results {
            assert_eq!(r.to_bits(), first.to_bits());
        }
        assert!((first - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_sample_keeps_baseline() {
        let mut unwrapper = AngleUnwrapper::new();
        unwrapper.unwrap(1.0);
        assert!(unwrapper.unwrap(f64::NAN).is_nan());
        assert!(unwrapper.unwrap(f64::INFINITY).is_nan());
        assert_eq!(unwrapper.previous(), Some(1.0));
        let turns = unwrapper.unwrap(1.1);
        assert!((turns + 0.1 / TAU).abs() < 1e-12);
    }

    #[test]
    fn test_reset_starts_new_baseline() {
        let mut unwrapper = AngleUnwrapper::new();
        unwrapper.unwrap(1.0);
        unwrapper.reset();
        assert_eq!(unwrapper.unwrap(-2.0), 0.0);
    }

    #[test]
    fn test_tracker_follows_spin_about_axis() {
        let mut tracker = TurnTracker::new(RotationAxis::UNIT_Z);
        let step = 0.25;
        for i in 0..80 {
            let q = Orientation::from_axis_angle([0.0, 0.0, 1.0], step * i as f64);
            let turns = tracker.update(&q);
            if i > 0 {
                assert!((turns + step / TAU).abs() < 1e-9, "sample {}: {}", i, turns);
            }
        }
        // 79 steps of 0.25 rad, compensated in the opposite direction
        assert!((tracker.total_turns() + 79.0 * step / TAU).abs() < 1e-9);
    }

    #[test]
    fn test_tracker_skips_degenerate_sample() {
        let mut tracker = TurnTracker::new(RotationAxis::UNIT_Z);
        tracker.update(&Orientation::from_axis_angle([0.0, 0.0, 1.0], 0.5));
        assert!(tracker.update(&Orientation::new(0.0, 1.0, 0.0, 0.0)).is_nan());
        let turns = tracker.update(&Orientation::from_axis_angle([0.0, 0.0, 1.0], 0.6));
        assert!((turns + 0.1 / TAU).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_matches_candidate_selection(previous in -PI..PI, angle in -PI..PI) {
            let raw = angle - previous;
            // Away from the ±π tie the two formulations agree
            prop_assume!((raw.abs() - PI).abs() > 1e-9);
            let modulo = wrap_delta(previous, angle);
            let candidates = candidate_delta(previous, angle);
            prop_assert!((modulo - candidates).abs() < 1e-9, "{} vs {}", modulo, candidates);
        }

        #[test]
        fn prop_increment_is_at_most_half_turn(previous in -PI..=PI, angle in -PI..=PI) {
            let turns = unwrap_delta(previous, angle);
            prop_assert!(turns > -0.5 - 1e-12 && turns <= 0.5 + 1e-12);
        }

        #[test]
        fn prop_sum_tracks_true_rotation(start in -PI..PI, step in -3.0f64..3.0) {
            let mut unwrapper = AngleUnwrapper::new();
            let mut truth = start;
            unwrapper.unwrap(bounded(truth));
            let mut sum = 0.0;
            for _ in 0..50 {
                truth += step;
                sum += unwrapper.unwrap(bounded(truth));
            }
            prop_assert!((-sum * TAU - 50.0 * step).abs() < 1e-7);
        }
    }
}
