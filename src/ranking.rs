use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::time::Instant;

use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::candidates::CandidatePool;
use crate::error::EvaluationError;
use crate::io::{ItemId, UserId};
use crate::stopwatch::Stopwatch;

/// Scores one (user, item) pair at a time.
pub trait PairScorer: Sync {
    fn predict(&self, user: UserId, item: ItemId) -> f64;
}

/// Scores all candidates of one user in a single call, returning one score
/// per item in the order given.
pub trait BatchScorer: Sync {
    fn predict_batch(&self, user: UserId, items: &[ItemId]) -> Vec<f64>;
}

impl<F> PairScorer for F
where
    F: Fn(UserId, ItemId) -> f64 + Sync,
{
    fn predict(&self, user: UserId, item: ItemId) -> f64 {
        self(user, item)
    }
}

/// The call shape the ranker uses for a model.
#[derive(Clone, Copy)]
pub enum Scorer<'a> {
    Pairwise(&'a dyn PairScorer),
    Batch(&'a dyn BatchScorer),
}

impl<'a> Scorer<'a> {
    fn score(&self, user: UserId, items: &[ItemId]) -> Result<Vec<f64>, EvaluationError> {
        match self {
            Scorer::Pairwise(model) => Ok(items
                .iter()
                .map(|item| model.predict(user, *item))
                .collect()),
            Scorer::Batch(model) => {
                let scores = model.predict_batch(user, items);
                if scores.len() != items.len() {
                    return Err(EvaluationError::ScoreCountMismatch {
                        user,
                        expected: items.len(),
                        actual: scores.len(),
                    });
                }
                Ok(scores)
            }
        }
    }
}

/// A trained model states which call shape it is scored through.
pub trait ScoringModel {
    fn scorer(&self) -> Scorer<'_>;
}

#[derive(PartialEq, Debug)]
pub struct ItemScore {
    pub id: ItemId,
    pub score: f64,
    position: usize,
}

impl ItemScore {
    fn new(id: ItemId, score: f64, position: usize) -> Self {
        // NaN ranks below every real score
        let score = if score.is_nan() { f64::NEG_INFINITY } else { score };
        ItemScore {
            id,
            score,
            position,
        }
    }
}

impl Eq for ItemScore {}

impl Ord for ItemScore {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse order by score, earlier pool position wins ties
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.position.cmp(&other.position))
    }
}

impl PartialOrd for ItemScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ranked top-K lists per user together with the time spent scoring them.
pub struct Rankings {
    pub lists: BTreeMap<UserId, Vec<ItemId>>,
    pub stopwatch: Stopwatch,
}

fn top_k_items(candidates: &[ItemId], scores: Vec<f64>, top_k: usize) -> Vec<ItemId> {
    let mut top_items: BinaryHeap<ItemScore> = BinaryHeap::with_capacity(top_k);
    for (position, (item_id, score)) in candidates.iter().zip(scores).enumerate() {
        let scored_item = ItemScore::new(*item_id, score, position);
        if top_items.len() < top_k {
            top_items.push(scored_item);
        } else if let Some(mut bottom) = top_items.peek_mut() {
            if scored_item < *bottom {
                *bottom = scored_item;
            }
        }
    }
    top_items
        .into_sorted_vec()
        .iter()
        .map(|scored| scored.id)
        .collect()
}

/// Scores every candidate of every user and keeps the `top_k` best, ordered
/// by descending score. Equal scores keep the pool order, so identical pools
/// always yield identical lists. Users are ranked in parallel.
pub fn rank(
    scorer: Scorer<'_>,
    pool: &CandidatePool,
    top_k: usize,
    progress: Option<&ProgressBar>,
) -> Result<Rankings, EvaluationError> {
    if let Some((user, candidates)) = pool.iter().find(|(_, candidates)| candidates.len() < top_k) {
        return Err(EvaluationError::TopKExceedsPool {
            user: *user,
            top_k,
            pool_size: candidates.len(),
        });
    }

    let ranked: Vec<(UserId, Vec<ItemId>, f64)> = pool
        .par_iter()
        .map(|(user, candidates)| -> Result<(UserId, Vec<ItemId>, f64), EvaluationError> {
            let start_time = Instant::now();
            let scores = scorer.score(*user, candidates)?;
            let duration_as_micros = start_time.elapsed().as_micros() as f64;
            if let Some(progress) = progress {
                progress.inc(1);
            }
            Ok((*user, top_k_items(candidates, scores, top_k), duration_as_micros))
        })
        .collect::<Result<_, _>>()?;

    let mut stopwatch = Stopwatch::new();
    let mut lists = BTreeMap::new();
    for (user, items, duration_as_micros) in ranked {
        stopwatch.record(user, duration_as_micros);
        lists.insert(user, items);
    }
    Ok(Rankings { lists, stopwatch })
}
