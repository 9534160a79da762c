use std::cmp;
use std::collections::BTreeMap;

use hashbrown::HashSet;

use crate::io::{ItemId, UserId};

pub mod evaluation_reporter;
pub mod hitrate;
pub mod map;
pub mod mrr;
pub mod ndcg;
pub mod precision;
pub mod recall;

/// Relevance sequence per user, aligned with the user's ranked list.
pub type RelevanceByUser = BTreeMap<UserId, Vec<bool>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Precision,
    Recall,
    HitRate,
    Map,
    Mrr,
    Ndcg,
}

impl Metric {
    /// Row order of the result table.
    pub const ALL: [Metric; 6] = [
        Metric::Precision,
        Metric::Recall,
        Metric::HitRate,
        Metric::Map,
        Metric::Mrr,
        Metric::Ndcg,
    ];

    pub fn short_name(&self) -> &'static str {
        match self {
            Metric::Precision => "pre",
            Metric::Recall => "rec",
            Metric::HitRate => "hr",
            Metric::Map => "map",
            Metric::Mrr => "mrr",
            Metric::Ndcg => "ndcg",
        }
    }

    pub fn get_name(&self, length: usize) -> String {
        let name = match self {
            Metric::Precision => "Precision",
            Metric::Recall => "Recall",
            Metric::HitRate => "HR",
            Metric::Map => "MAP",
            Metric::Mrr => "MRR",
            Metric::Ndcg => "NDCG",
        };
        format!("{}@{}", name, length)
    }
}

/// Marks each ranked item that the user actually interacted with.
pub fn relevance(ranked_items: &[ItemId], next_items: &HashSet<ItemId>) -> Vec<bool> {
    ranked_items
        .iter()
        .map(|item_id| next_items.contains(item_id))
        .collect()
}

/// The first `k` entries, or all of them for shorter lists.
pub(crate) fn top(relevance: &[bool], k: usize) -> &[bool] {
    &relevance[..cmp::min(relevance.len(), k)]
}

pub(crate) fn hits(relevance: &[bool]) -> usize {
    relevance.iter().filter(|relevant| **relevant).count()
}

pub(crate) fn mean<I: Iterator<Item = f64>>(scores: I) -> f64 {
    let (sum_of_scores, qty) = scores.fold((0_f64, 0_usize), |(sum, qty), score| {
        (sum + score, qty + 1)
    });
    if qty > 0 {
        sum_of_scores / qty as f64
    } else {
        0.0
    }
}
