use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::warn;

use crate::error::EvaluationError;
use crate::io::{GroundTruth, ItemId, UserId};
use crate::metrics::hitrate::hr_at_k;
use crate::metrics::map::map_at_k;
use crate::metrics::mrr::mrr_at_k;
use crate::metrics::ndcg::ndcg_at_k;
use crate::metrics::precision::precision_at_k;
use crate::metrics::recall::recall_at_k;
use crate::metrics::{mean, relevance, Metric, RelevanceByUser};

/// All six metrics at one cutoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricVector {
    pub precision: f64,
    pub recall: f64,
    pub hit_rate: f64,
    pub map: f64,
    pub mrr: f64,
    pub ndcg: f64,
}

impl MetricVector {
    pub fn compute(preds: &RelevanceByUser, ground_truth: &GroundTruth, k: usize) -> MetricVector {
        MetricVector {
            precision: mean(preds.values().map(|relevance| precision_at_k(relevance, k))),
            recall: recall_at_k(preds, ground_truth, k),
            hit_rate: hr_at_k(preds, ground_truth, k),
            map: map_at_k(preds.values(), k),
            mrr: mrr_at_k(preds, k),
            ndcg: mean(preds.values().map(|relevance| ndcg_at_k(relevance, k))),
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Precision => self.precision,
            Metric::Recall => self.recall,
            Metric::HitRate => self.hit_rate,
            Metric::Map => self.map,
            Metric::Mrr => self.mrr,
            Metric::Ndcg => self.ndcg,
        }
    }

    /// Arithmetic mean, every vector weighs the same.
    pub fn average(vectors: &[MetricVector]) -> Option<MetricVector> {
        if vectors.is_empty() {
            return None;
        }
        let qty = vectors.len() as f64;
        let sum = |metric: Metric| {
            vectors.iter().map(|vector| vector.get(metric)).sum::<f64>() / qty
        };
        Some(MetricVector {
            precision: sum(Metric::Precision),
            recall: sum(Metric::Recall),
            hit_rate: sum(Metric::HitRate),
            map: sum(Metric::Map),
            mrr: sum(Metric::Mrr),
            ndcg: sum(Metric::Ndcg),
        })
    }

    pub fn get_name(&self, length: usize) -> String {
        Metric::ALL.iter().map(|metric| metric.get_name(length)).join(",")
    }

    pub fn result(&self) -> String {
        Metric::ALL
            .iter()
            .map(|metric| format!("{:.4}", self.get(*metric)))
            .join(",")
    }
}

/// Metric values keyed by (metric, cutoff), one column per cutoff in the
/// order the cutoffs were requested.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricTable {
    columns: Vec<(usize, MetricVector)>,
}

impl MetricTable {
    pub fn from_columns(columns: Vec<(usize, MetricVector)>) -> MetricTable {
        MetricTable { columns }
    }

    pub fn cutoffs(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns.iter().map(|(cutoff, _)| *cutoff)
    }

    pub fn column(&self, cutoff: usize) -> Option<&MetricVector> {
        self.columns
            .iter()
            .find(|(column_cutoff, _)| *column_cutoff == cutoff)
            .map(|(_, vector)| vector)
    }

    pub fn get(&self, metric: Metric, cutoff: usize) -> Option<f64> {
        self.column(cutoff).map(|vector| vector.get(metric))
    }

    /// Values of one metric across all cutoffs.
    pub fn row(&self, metric: Metric) -> impl Iterator<Item = f64> + '_ {
        self.columns.iter().map(move |(_, vector)| vector.get(metric))
    }
}

/// Turns ranked lists into relevance sequences against the ground truth.
/// Every ground-truth user needs a ranked list and every ranked list needs a
/// ground-truth entry.
pub fn relevance_by_user(
    ranked_lists: &BTreeMap<UserId, Vec<ItemId>>,
    ground_truth: &GroundTruth,
) -> Result<RelevanceByUser, EvaluationError> {
    if let Some(user) = ground_truth
        .keys()
        .copied()
        .sorted()
        .find(|user| !ranked_lists.contains_key(user))
    {
        return Err(EvaluationError::MissingRankedList { user });
    }

    ranked_lists
        .iter()
        .map(|(user, ranked_items)| match ground_truth.get(user) {
            Some(next_items) => Ok((*user, relevance(ranked_items, next_items))),
            None => Err(EvaluationError::UnknownRankedUser { user: *user }),
        })
        .collect()
}

/// Computes all metrics at each cutoff. Relevance is derived once and
/// reused for every cutoff.
pub fn evaluate(
    ranked_lists: &BTreeMap<UserId, Vec<ItemId>>,
    ground_truth: &GroundTruth,
    cutoffs: &[usize],
) -> Result<MetricTable, EvaluationError> {
    let preds = relevance_by_user(ranked_lists, ground_truth)?;
    metric_table(&preds, ground_truth, cutoffs)
}

/// Builds the table from relevance sequences that were already checked
/// against the ground truth.
pub fn metric_table(
    preds: &RelevanceByUser,
    ground_truth: &GroundTruth,
    cutoffs: &[usize],
) -> Result<MetricTable, EvaluationError> {
    if let Some(cutoff) = cutoffs.iter().find(|cutoff| **cutoff == 0) {
        return Err(EvaluationError::InvalidCutoff(*cutoff));
    }

    let longest_list = preds.values().map(|relevance| relevance.len()).max().unwrap_or(0);
    if let Some(cutoff) = cutoffs.iter().find(|cutoff| **cutoff > longest_list) {
        warn!(
            "Cutoff {} exceeds the longest ranked list ({}), using whole lists",
            cutoff, longest_list
        );
    }

    let columns = cutoffs
        .iter()
        .map(|cutoff| (*cutoff, MetricVector::compute(preds, ground_truth, *cutoff)))
        .collect();
    Ok(MetricTable::from_columns(columns))
}

/// Averages per-fold tables cell by cell. All folds must share the same
/// cutoffs.
pub fn average_folds(tables: &[MetricTable]) -> Result<MetricTable, EvaluationError> {
    let first = tables.first().ok_or(EvaluationError::NoFolds)?;
    let expected = first.cutoffs().collect_vec();
    if let Some(mismatch) = tables
        .iter()
        .find(|table| !table.cutoffs().eq(expected.iter().copied()))
    {
        return Err(EvaluationError::FoldMismatch {
            expected,
            actual: mismatch.cutoffs().collect(),
        });
    }

    let columns = first
        .columns
        .iter()
        .enumerate()
        .filter_map(|(index, (cutoff, _))| {
            let fold_vectors = tables.iter().map(|table| table.columns[index].1).collect_vec();
            MetricVector::average(&fold_vectors).map(|vector| (*cutoff, vector))
        })
        .collect();
    Ok(MetricTable::from_columns(columns))
}

#[cfg(test)]
mod evaluation_reporter_test {
    use super::*;
    use float_cmp::approx_eq;
    use hashbrown::HashSet;

    fn vector(values: [f64; 6]) -> MetricVector {
        MetricVector {
            precision: values[0],
            recall: values[1],
            hit_rate: values[2],
            map: values[3],
            mrr: values[4],
            ndcg: values[5],
        }
    }

    fn fixture() -> (BTreeMap<UserId, Vec<ItemId>>, GroundTruth) {
        let mut ranked_lists = BTreeMap::new();
        ranked_lists.insert(1, vec![5, 3]);
        ranked_lists.insert(2, vec![8, 9]);
        ranked_lists.insert(3, vec![4, 2]);

        let mut ground_truth = GroundTruth::new();
        ground_truth.insert(1, [5].iter().copied().collect());
        ground_truth.insert(2, [9, 10].iter().copied().collect());
        ground_truth.insert(3, HashSet::new());
        (ranked_lists, ground_truth)
    }

    #[test]
    fn should_evaluate_all_cutoffs() {
        let (ranked_lists, ground_truth) = fixture();
        let table = evaluate(&ranked_lists, &ground_truth, &[1, 2]).unwrap();
        assert_eq!(vec![1, 2], table.cutoffs().collect_vec());

        // users 1 and 2 are eligible for recall, user 3 is not
        let recall_at_2 = table.get(Metric::Recall, 2).unwrap();
        assert!(approx_eq!(f64, (1.0 + 0.5) / 2.0, recall_at_2, ulps = 2));
        let precision_at_2 = table.get(Metric::Precision, 2).unwrap();
        assert!(approx_eq!(f64, (0.5 + 0.5 + 0.0) / 3.0, precision_at_2, ulps = 2));
        let hr_at_1 = table.get(Metric::HitRate, 1).unwrap();
        assert!(approx_eq!(f64, 1.0 / 3.0, hr_at_1, ulps = 2));
        let mrr_at_2 = table.get(Metric::Mrr, 2).unwrap();
        assert!(approx_eq!(f64, (1.0 + 0.5) / 3.0, mrr_at_2, ulps = 2));
        assert_eq!(None, table.get(Metric::Map, 5));
    }

    #[test]
    fn should_fail_on_missing_ranked_list() {
        let (mut ranked_lists, ground_truth) = fixture();
        ranked_lists.remove(&2);
        assert_eq!(
            Err(EvaluationError::MissingRankedList { user: 2 }),
            evaluate(&ranked_lists, &ground_truth, &[1])
        );
    }

    #[test]
    fn should_fail_on_ranked_list_without_ground_truth() {
        let (mut ranked_lists, ground_truth) = fixture();
        ranked_lists.insert(9, vec![1, 2]);
        assert_eq!(
            Err(EvaluationError::UnknownRankedUser { user: 9 }),
            evaluate(&ranked_lists, &ground_truth, &[1])
        );
    }

    #[test]
    fn should_reject_zero_cutoff() {
        let (ranked_lists, ground_truth) = fixture();
        assert_eq!(
            Err(EvaluationError::InvalidCutoff(0)),
            evaluate(&ranked_lists, &ground_truth, &[1, 0])
        );
    }

    #[test]
    fn should_average_folds() {
        let first = MetricTable::from_columns(vec![
            (1, vector([0.2; 6])),
            (5, vector([0.4; 6])),
        ]);
        let second = MetricTable::from_columns(vec![
            (1, vector([0.4; 6])),
            (5, vector([0.6; 6])),
        ]);
        let averaged = average_folds(&[first, second]).unwrap();
        for metric in Metric::ALL.iter() {
            let row = averaged.row(*metric).collect_vec();
            assert!(approx_eq!(f64, 0.3, row[0], ulps = 2));
            assert!(approx_eq!(f64, 0.5, row[1], ulps = 2));
        }
    }

    #[test]
    fn should_reject_folds_with_different_cutoffs() {
        let first = MetricTable::from_columns(vec![(1, vector([0.2; 6]))]);
        let second = MetricTable::from_columns(vec![(5, vector([0.4; 6]))]);
        assert_eq!(
            Err(EvaluationError::FoldMismatch {
                expected: vec![1],
                actual: vec![5]
            }),
            average_folds(&[first, second])
        );
        assert_eq!(Err(EvaluationError::NoFolds), average_folds(&[]));
    }

    #[test]
    fn should_format_report_lines() {
        let vector = vector([0.5, 0.25, 1.0, 0.0, 0.125, 0.75]);
        assert_eq!(
            "Precision@10,Recall@10,HR@10,MAP@10,MRR@10,NDCG@10",
            vector.get_name(10)
        );
        assert_eq!("0.5000,0.2500,1.0000,0.0000,0.1250,0.7500", vector.result());
    }
}
