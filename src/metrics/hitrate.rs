use crate::io::GroundTruth;
use crate::metrics::{top, RelevanceByUser};

/// Fraction of ground-truth users with at least one relevant item among
/// their first `k` recommendations. Only set membership matters, not the
/// position.
pub fn hr_at_k(preds: &RelevanceByUser, ground_truth: &GroundTruth, k: usize) -> f64 {
    if ground_truth.is_empty() {
        return 0.0;
    }
    let qty_hits = preds
        .iter()
        .filter(|(user, _)| ground_truth.contains_key(*user))
        .filter(|(_, relevance)| top(relevance, k).iter().any(|relevant| *relevant))
        .count();
    qty_hits as f64 / ground_truth.len() as f64
}
