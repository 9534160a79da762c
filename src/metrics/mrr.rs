use crate::metrics::{mean, top, RelevanceByUser};

/// Mean over users of the reciprocal rank of the first relevant item within
/// the first `k` positions, zero for users without a hit.
pub fn mrr_at_k(preds: &RelevanceByUser, k: usize) -> f64 {
    mean(preds.values().map(|relevance| {
        match top(relevance, k).iter().position(|relevant| *relevant) {
            Some(rank) => 1_f64 / (rank as f64 + 1_f64),
            None => 0_f64,
        }
    }))
}
