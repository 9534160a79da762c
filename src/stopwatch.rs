use tdigest::TDigest;

use crate::io::UserId;

/// Scoring wall time per ranked user.
#[derive(Clone, Default)]
pub struct Stopwatch {
    scoring_durations: Vec<UserDurationMicros>,
}

pub type UserDurationMicros = (UserId, f64);

impl Stopwatch {
    pub fn new() -> Stopwatch {
        Stopwatch {
            scoring_durations: Vec::new(),
        }
    }

    pub fn record(&mut self, user: UserId, duration_as_micros: f64) {
        self.scoring_durations.push((user, duration_as_micros));
    }

    /// Appends the durations of another run, e.g. a later fold.
    pub fn merge(&mut self, other: &Stopwatch) {
        self.scoring_durations
            .extend_from_slice(&other.scoring_durations);
    }

    pub fn get_n(&self) -> usize {
        self.scoring_durations.len()
    }

    /// `q` is a fraction in [0, 1].
    pub fn get_percentile_in_micros(&self, q: f64) -> f64 {
        if self.scoring_durations.is_empty() {
            return 0.0;
        }
        let t_digest = TDigest::new_with_size(100);
        let durations = self
            .scoring_durations
            .iter()
            .map(|tuple| tuple.1)
            .collect();
        let sorted_digest = t_digest.merge_unsorted(durations);
        sorted_digest.estimate_quantile(q)
    }
}

#[cfg(test)]
mod stopwatch_test {
    use super::*;

    #[test]
    fn should_estimate_percentiles() {
        let mut stopwatch = Stopwatch::new();
        for user in 0..100 {
            stopwatch.record(user, user as f64 + 1.0);
        }
        assert_eq!(100, stopwatch.get_n());
        let p90 = stopwatch.get_percentile_in_micros(0.9);
        assert!(p90 > 85.0 && p90 < 95.0);
    }

    #[test]
    fn should_merge_and_handle_empty() {
        let mut stopwatch = Stopwatch::new();
        assert!((0.0 - stopwatch.get_percentile_in_micros(0.5)).abs() < f64::EPSILON);
        let mut other = Stopwatch::new();
        other.record(7, 12.0);
        stopwatch.merge(&other);
        assert_eq!(1, stopwatch.get_n());
        assert!((12.0 - stopwatch.get_percentile_in_micros(1.0)).abs() < 1e-9);
    }
}
