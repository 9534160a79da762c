use hashbrown::HashMap;
use itertools::Itertools;

use crate::io::{self, Interaction, ItemId, Rating, UserId};
use crate::ranking::{PairScorer, Scorer, ScoringModel};

/// Sparse linear item-similarity model. A user's score for item `i` is
/// `sum_j r_uj * W[j, i]` over the items `j` the user rated in training.
pub struct Slim {
    user_ratings: HashMap<UserId, Vec<(ItemId, Rating)>>,
    weights: HashMap<(ItemId, ItemId), f64>,
}

impl Slim {
    pub fn new(training: &[Interaction], weights: Vec<(ItemId, ItemId, f64)>) -> Slim {
        let user_ratings = training
            .iter()
            .map(|interaction| (interaction.user, (interaction.item, interaction.rating)))
            .into_group_map()
            .into_iter()
            .collect();
        let weights = weights
            .into_iter()
            .filter(|(_, _, weight)| *weight != 0.0)
            .map(|(source, target, weight)| ((source, target), weight))
            .collect();
        Slim {
            user_ratings,
            weights,
        }
    }

    pub fn from_file(training: &[Interaction], weights_path: &str) -> anyhow::Result<Slim> {
        Ok(Slim::new(training, io::read_weight_triplets(weights_path)?))
    }

    pub fn qty_weights(&self) -> usize {
        self.weights.len()
    }
}

impl PairScorer for Slim {
    fn predict(&self, user: UserId, item: ItemId) -> f64 {
        self.user_ratings
            .get(&user)
            .map(|ratings| {
                ratings
                    .iter()
                    .filter_map(|(rated_item, rating)| {
                        self.weights
                            .get(&(*rated_item, item))
                            .map(|weight| rating * weight)
                    })
                    .sum()
            })
            .unwrap_or(0.0)
    }
}

impl ScoringModel for Slim {
    fn scorer(&self) -> Scorer<'_> {
        Scorer::Pairwise(self)
    }
}
