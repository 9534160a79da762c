use tracing::debug;

use crate::io::GroundTruth;
use crate::metrics::{hits, mean, top, RelevanceByUser};

/// Returns the mean Recall over users.
/// Recall quantifies the number of positive recommendations made out
/// of all interacted items.
///
/// Users whose ground truth is empty (or missing) have no defined recall
/// and are left out of the average rather than counted as zero.
///
/// # Arguments
///
/// * `preds` - relevance sequence per user.
/// * `ground_truth` - held-out items per user.
/// * `k` - the length aka 'k' that will be used for evaluation.
///
pub fn recall_at_k(preds: &RelevanceByUser, ground_truth: &GroundTruth, k: usize) -> f64 {
    let mut eligible = 0_usize;
    let recall = mean(preds.iter().filter_map(|(user, relevance)| {
        let next_items = ground_truth.get(user).map(|items| items.len()).unwrap_or(0);
        if next_items == 0 {
            return None;
        }
        eligible += 1;
        Some(hits(top(relevance, k)) as f64 / next_items as f64)
    }));
    if eligible == 0 {
        debug!("Recall@{} has no user with ground truth, reporting 0", k);
    }
    recall
}
