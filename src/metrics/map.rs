use crate::metrics::precision::precision_at_k;
use crate::metrics::{mean, top};

/// Mean of the precisions at every relevant position of the first `k`
/// entries. Zero when nothing relevant was recommended.
pub fn average_precision(relevance: &[bool], k: usize) -> f64 {
    let relevance = top(relevance, k);
    mean(
        relevance
            .iter()
            .enumerate()
            .filter(|(_, relevant)| **relevant)
            .map(|(index, _)| precision_at_k(relevance, index + 1)),
    )
}

/// Mean average precision over users.
pub fn map_at_k<'a, I>(relevances: I, k: usize) -> f64
where
    I: IntoIterator<Item = &'a Vec<bool>>,
{
    mean(
        relevances
            .into_iter()
            .map(|relevance| average_precision(relevance, k)),
    )
}
