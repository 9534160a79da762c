//! Errors raised by the candidate, ranking and aggregation stages.

use thiserror::Error;

use crate::io::UserId;

/// All failures are deterministic given the input, so none of them is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// The pool cannot hold the largest ground-truth set plus one negative.
    #[error(
        "candidates_num {candidates_num} must exceed the largest ground truth ({max_ground_truth})"
    )]
    CandidatesTooSmall {
        candidates_num: usize,
        max_ground_truth: usize,
    },
    /// More items were requested than a user's pool contains.
    #[error("top_k {top_k} exceeds the {pool_size} candidates of user {user}")]
    TopKExceedsPool {
        user: UserId,
        top_k: usize,
        pool_size: usize,
    },
    /// Cutoffs must be positive.
    #[error("Invalid cutoff: {0}")]
    InvalidCutoff(usize),
    /// Not enough unseen items to fill a user's pool.
    #[error("Insufficient candidates for user {user}: {available} unseen items, {required} needed")]
    InsufficientCandidates {
        user: UserId,
        available: usize,
        required: usize,
    },
    /// A ground-truth user was never ranked.
    #[error("No ranked list for ground-truth user {user}")]
    MissingRankedList { user: UserId },
    /// A ranked list belongs to a user without ground truth.
    #[error("Ranked list for user {user} without ground truth")]
    UnknownRankedUser { user: UserId },
    /// A batch scorer returned a different number of scores than items.
    #[error("Scorer returned {actual} scores for {expected} candidates of user {user}")]
    ScoreCountMismatch {
        user: UserId,
        expected: usize,
        actual: usize,
    },
    /// Fold tables disagree on their cutoffs.
    #[error("Fold cutoffs differ: expected {expected:?}, got {actual:?}")]
    FoldMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("No fold results to average")]
    NoFolds,
}
