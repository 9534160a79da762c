use anyhow::anyhow;

use crate::io::{self, ItemId, UserId};
use crate::ranking::{BatchScorer, Scorer, ScoringModel};

/// Pointwise matrix factorization: the score of a pair is the dot product
/// of the user and item factors.
pub struct PointMf {
    factors: usize,
    user_factors: Vec<Vec<f64>>,
    item_factors: Vec<Vec<f64>>,
}

impl PointMf {
    pub fn new(
        user_factors: Vec<Vec<f64>>,
        item_factors: Vec<Vec<f64>>,
    ) -> anyhow::Result<PointMf> {
        let factors = user_factors
            .first()
            .or_else(|| item_factors.first())
            .map(|row| row.len())
            .unwrap_or(0);
        if let Some(row) = user_factors
            .iter()
            .chain(item_factors.iter())
            .find(|row| row.len() != factors)
        {
            return Err(anyhow!(
                "factor rows must all have {} dimensions, found {}",
                factors,
                row.len()
            ));
        }
        Ok(PointMf {
            factors,
            user_factors,
            item_factors,
        })
    }

    pub fn from_files(
        user_factors_path: &str,
        item_factors_path: &str,
        user_count: usize,
        item_count: usize,
    ) -> anyhow::Result<PointMf> {
        let user_factors = io::read_factors(user_factors_path, user_count)?;
        let item_factors = io::read_factors(item_factors_path, item_count)?;
        PointMf::new(user_factors, item_factors)
    }

    pub fn factors(&self) -> usize {
        self.factors
    }
}

impl BatchScorer for PointMf {
    /// Unknown users or items score negative infinity.
    fn predict_batch(&self, user: UserId, items: &[ItemId]) -> Vec<f64> {
        let user_factors = match self.user_factors.get(user as usize) {
            Some(user_factors) => user_factors,
            None => return vec![f64::NEG_INFINITY; items.len()],
        };
        items
            .iter()
            .map(|item| match self.item_factors.get(*item as usize) {
                Some(item_factors) => user_factors
                    .iter()
                    .zip(item_factors.iter())
                    .map(|(p, q)| p * q)
                    .sum(),
                None => f64::NEG_INFINITY,
            })
            .collect()
    }
}

impl ScoringModel for PointMf {
    fn scorer(&self) -> Scorer<'_> {
        Scorer::Batch(self)
    }
}

#[cfg(test)]
mod point_mf_test {
    use super::*;

    #[test]
    fn should_score_dot_products() {
        let model = PointMf::new(
            vec![vec![1.0, 2.0]],
            vec![vec![0.5, 0.5], vec![1.0, -1.0], vec![0.0, 3.0]],
        )
        .unwrap();
        assert_eq!(2, model.factors());
        assert_eq!(vec![1.5, -1.0, 6.0], model.predict_batch(0, &[0, 1, 2]));
    }

    #[test]
    fn should_rank_unknown_ids_last() {
        let model = PointMf::new(vec![vec![1.0]], vec![vec![1.0]]).unwrap();
        assert_eq!(vec![1.0, f64::NEG_INFINITY], model.predict_batch(0, &[0, 7]));
        assert_eq!(vec![f64::NEG_INFINITY], model.predict_batch(3, &[0]));
    }

    #[test]
    fn should_reject_ragged_factors() {
        assert!(PointMf::new(vec![vec![1.0, 2.0]], vec![vec![1.0]]).is_err());
    }
}
