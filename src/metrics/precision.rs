use crate::metrics::{hits, top};

/// Precision quantifies the share of the first `k` recommendations that
/// the user actually interacted with.
///
/// # Arguments
///
/// * `relevance` - binary relevance of the ranked list, in rank order.
/// * `k` - the length aka 'k' that will be used for evaluation. Shorter
///   lists are not padded, but the denominator stays `k`.
///
pub fn precision_at_k(relevance: &[bool], k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    hits(top(relevance, k)) as f64 / k as f64
}
