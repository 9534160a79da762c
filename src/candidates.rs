use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashSet;
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::EvaluationError;
use crate::io::{GroundTruth, ItemId, UserId};

/// Per-user candidate items, each list sorted ascending by item id.
pub type CandidatePool = BTreeMap<UserId, Vec<ItemId>>;

/// Builds a pool of `candidates_num` items per ground-truth user: all of the
/// user's ground-truth items plus negatives drawn uniformly without
/// replacement from the items the user neither holds out nor trained on.
///
/// Users are visited in ascending id order so that a seeded `rng` always
/// produces the same pools.
///
/// # Arguments
///
/// * `ground_truth` - held-out items per user.
/// * `training_items` - items per user seen during training; users missing here trained on nothing.
/// * `item_space` - every item that may be sampled.
/// * `candidates_num` - the pool size, must exceed every ground-truth set size.
/// * `rng` - source of the negative samples.
pub fn build_pool<R: Rng + ?Sized>(
    ground_truth: &GroundTruth,
    training_items: &GroundTruth,
    item_space: &BTreeSet<ItemId>,
    candidates_num: usize,
    rng: &mut R,
) -> Result<CandidatePool, EvaluationError> {
    let max_ground_truth = ground_truth.values().map(|items| items.len()).max().unwrap_or(0);
    if candidates_num <= max_ground_truth {
        return Err(EvaluationError::CandidatesTooSmall {
            candidates_num,
            max_ground_truth,
        });
    }

    let no_training_items = HashSet::new();
    let mut pool = CandidatePool::new();
    for user in ground_truth.keys().copied().sorted() {
        let held_out = &ground_truth[&user];
        let trained_on = training_items.get(&user).unwrap_or(&no_training_items);
        let sample_num = candidates_num - held_out.len();

        let unseen: Vec<ItemId> = item_space
            .iter()
            .filter(|item| !held_out.contains(*item) && !trained_on.contains(*item))
            .copied()
            .collect();
        if unseen.len() < sample_num {
            return Err(EvaluationError::InsufficientCandidates {
                user,
                available: unseen.len(),
                required: sample_num,
            });
        }

        let mut candidates: Vec<ItemId> = unseen
            .choose_multiple(rng, sample_num)
            .copied()
            .chain(held_out.iter().copied())
            .collect();
        candidates.sort_unstable();
        pool.insert(user, candidates);
    }
    Ok(pool)
}
