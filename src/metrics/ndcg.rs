use std::cmp;

use crate::metrics::{hits, top};

fn dcg(relevance: &[bool]) -> f64 {
    relevance
        .iter()
        .enumerate()
        .filter(|(_, relevant)| **relevant)
        .map(|(index, _)| 1_f64 / (index as f64 + 2_f64).log2())
        .sum()
}

/// Calculate Ndcg over the first `k` entries of a ranked list. The ideal
/// ordering front-loads every relevant item of the list, capped at `k`.
/// Lists without relevant items score zero.
pub fn ndcg_at_k(relevance: &[bool], k: usize) -> f64 {
    let ideal_hits = cmp::min(hits(relevance), k);
    let ideal = vec![true; ideal_hits];
    let dcg_max = dcg(&ideal);
    if dcg_max == 0.0 {
        return 0.0;
    }
    dcg(top(relevance, k)) / dcg_max
}

#[cfg(test)]
mod ndcg_test {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn should_calculate_ndcg() {
        let relevance = [false, true, false, true];
        let dcg = 1.0 / 3_f64.log2() + 1.0 / 5_f64.log2();
        let dcg_max = 1.0 + 1.0 / 3_f64.log2();
        assert!(approx_eq!(f64, dcg / dcg_max, ndcg_at_k(&relevance, 4), ulps = 2));
    }

    #[test]
    fn should_be_one_for_ideal_ranking() {
        let relevance = [true, true, true, false, false];
        for k in 1..=relevance.len() {
            assert!(approx_eq!(f64, 1.0, ndcg_at_k(&relevance, k), ulps = 2));
        }
    }

    #[test]
    fn should_cap_ideal_at_cutoff() {
        // one of two relevant items fits into k = 1
        let relevance = [true, false, true];
        assert!(approx_eq!(f64, 1.0, ndcg_at_k(&relevance, 1), ulps = 2));
        let relevance = [false, true, true];
        assert!((0.0 - ndcg_at_k(&relevance, 1)).abs() < f64::EPSILON);
    }

    #[test]
    fn should_handle_no_relevant_items() {
        assert!((0.0 - ndcg_at_k(&[false, false], 2)).abs() < f64::EPSILON);
        assert!((0.0 - ndcg_at_k(&[], 5)).abs() < f64::EPSILON);
    }
}
