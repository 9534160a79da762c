//! Evaluation protocols: one held-out split, or k folds averaged.

use std::collections::BTreeSet;

use indicatif::ProgressBar;
use rand::Rng;
use tracing::{debug, info};

use crate::candidates::build_pool;
use crate::error::EvaluationError;
use crate::io::{get_ur, Interaction, ItemId};
use crate::metrics::evaluation_reporter::{
    average_folds, metric_table, relevance_by_user, MetricTable, MetricVector,
};
use crate::metrics::Metric;
use crate::ranking::{rank, Scorer, ScoringModel};
use crate::stopwatch::Stopwatch;

pub struct EvaluationSettings {
    pub candidates_num: usize,
    pub top_k: usize,
    pub cutoffs: Vec<usize>,
    pub show_progress: bool,
}

pub struct SplitResult {
    pub table: MetricTable,
    /// All metrics at `top_k`, computed whether or not it is a configured cutoff.
    pub summary: MetricVector,
    pub stopwatch: Stopwatch,
}

/// Pools, ranks and scores one split. `rng` is drawn from sequentially, so
/// callers thread one seeded generator through all splits of a run.
pub fn evaluate_split<R: Rng + ?Sized>(
    scorer: Scorer<'_>,
    train: &[Interaction],
    held_out: &[Interaction],
    item_space: &BTreeSet<ItemId>,
    settings: &EvaluationSettings,
    rng: &mut R,
) -> Result<SplitResult, EvaluationError> {
    let held_out_ur = get_ur(held_out);
    let train_ur = get_ur(train);

    debug!("Building candidate pools for {} users", held_out_ur.len());
    let pool = build_pool(&held_out_ur, &train_ur, item_space, settings.candidates_num, rng)?;

    debug!("Generate recommend list...");
    let progress = if settings.show_progress {
        ProgressBar::new(pool.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    let rankings = rank(scorer, &pool, settings.top_k, Some(&progress))?;
    progress.finish_and_clear();

    let preds = relevance_by_user(&rankings.lists, &held_out_ur)?;
    let table = metric_table(&preds, &held_out_ur, &settings.cutoffs)?;
    let summary = MetricVector::compute(&preds, &held_out_ur, settings.top_k);
    Ok(SplitResult {
        table,
        summary,
        stopwatch: rankings.stopwatch,
    })
}

/// Logs every metric at the ranked list length.
pub fn log_summary(summary: &MetricVector, top_k: usize) {
    for metric in Metric::ALL.iter() {
        info!("{}: {:.4}", metric.get_name(top_k), summary.get(*metric));
    }
}

/// One train/validation split with the model trained on its training part.
pub struct Fold<M> {
    pub train: Vec<Interaction>,
    pub validation: Vec<Interaction>,
    pub model: M,
}

/// Evaluates each fold with its own model and averages the tables. Folds
/// are loaded lazily so only one model is held in memory at a time.
pub fn cross_validate<R, M, F>(
    folds: F,
    item_space: &BTreeSet<ItemId>,
    settings: &EvaluationSettings,
    rng: &mut R,
) -> anyhow::Result<SplitResult>
where
    R: Rng + ?Sized,
    M: ScoringModel,
    F: IntoIterator<Item = anyhow::Result<Fold<M>>>,
{
    let mut tables = Vec::new();
    let mut summaries = Vec::new();
    let mut stopwatch = Stopwatch::new();
    for (index, fold) in folds.into_iter().enumerate() {
        let fold = fold?;
        info!("Start Validation [{}]......", index + 1);
        let result = evaluate_split(
            fold.model.scorer(),
            &fold.train,
            &fold.validation,
            item_space,
            settings,
            rng,
        )?;
        info!("{}", result.summary.get_name(settings.top_k));
        info!("{}", result.summary.result());
        stopwatch.merge(&result.stopwatch);
        tables.push(result.table);
        summaries.push(result.summary);
    }
    let table = average_folds(&tables)?;
    let summary = MetricVector::average(&summaries).ok_or(EvaluationError::NoFolds)?;
    Ok(SplitResult {
        table,
        summary,
        stopwatch,
    })
}

#[cfg(test)]
mod experiment_test {
    use super::*;
    use float_cmp::approx_eq;
    use itertools::Itertools;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use crate::io::UserId;
    use crate::ranking::PairScorer;

    fn interaction(user: UserId, item: ItemId) -> Interaction {
        Interaction {
            user,
            item,
            rating: 1.0,
        }
    }

    fn by_item_id(_user: UserId, item: ItemId) -> f64 {
        item as f64
    }

    #[test]
    fn should_summarize_top_k_outside_cutoffs() {
        let item_space: BTreeSet<ItemId> = (0..6).collect();
        let settings = EvaluationSettings {
            candidates_num: 3,
            top_k: 2,
            cutoffs: vec![1],
            show_progress: false,
        };
        let mut rng = Pcg64::seed_from_u64(5);
        let result = evaluate_split(
            Scorer::Pairwise(&by_item_id),
            &[interaction(0, 1)],
            &[interaction(0, 5)],
            &item_space,
            &settings,
            &mut rng,
        )
        .unwrap();

        assert_eq!(vec![1], result.table.cutoffs().collect_vec());
        assert_eq!(None, result.table.column(2));
        assert!(approx_eq!(f64, 0.5, result.summary.precision, ulps = 2));
        assert!(approx_eq!(f64, 1.0, result.summary.hit_rate, ulps = 2));
        assert!(approx_eq!(f64, 1.0, result.summary.mrr, ulps = 2));
        log_summary(&result.summary, settings.top_k);
    }

    #[test]
    fn should_average_fold_summaries() {
        let item_space: BTreeSet<ItemId> = (0..10).collect();
        let settings = EvaluationSettings {
            candidates_num: 3,
            top_k: 2,
            cutoffs: vec![1],
            show_progress: false,
        };
        // item 9 always ranks first, item 0 always ranks last of three
        let folds = vec![9, 0].into_iter().map(|held_out| -> anyhow::Result<Fold<ById>> {
            Ok(Fold {
                train: vec![interaction(0, 4)],
                validation: vec![interaction(0, held_out)],
                model: ById,
            })
        });
        let mut rng = Pcg64::seed_from_u64(5);
        let result = cross_validate(folds, &item_space, &settings, &mut rng).unwrap();
        assert!(approx_eq!(f64, 0.5, result.summary.hit_rate, ulps = 2));
        assert!(approx_eq!(f64, 0.5, result.table.get(Metric::HitRate, 1).unwrap(), ulps = 2));
        assert_eq!(2, result.stopwatch.get_n());
    }

    struct ById;

    impl PairScorer for ById {
        fn predict(&self, _user: UserId, item: ItemId) -> f64 {
            item as f64
        }
    }

    impl ScoringModel for ById {
        fn scorer(&self) -> Scorer<'_> {
            Scorer::Pairwise(self)
        }
    }
}
