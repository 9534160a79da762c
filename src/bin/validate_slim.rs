use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use indicatif::ProgressBar;
use num_format::{Locale, ToFormattedString};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::info;

use rankeval::config::{required, AppConfig};
use rankeval::experiment::{cross_validate, log_summary, EvaluationSettings, Fold};
use rankeval::io::{self, Interaction};
use rankeval::logging;
use rankeval::models::slim::Slim;

fn fold_file(folds_dir: &str, fold: usize, name: &str) -> String {
    Path::new(folds_dir)
        .join(format!("fold_{}_{}", fold, name))
        .to_string_lossy()
        .into_owned()
}

fn load_fold(
    folds_dir: &str,
    weights_file: &str,
    fold: usize,
    train: Vec<Interaction>,
    validation: Vec<Interaction>,
) -> anyhow::Result<Fold<Slim>> {
    let model = Slim::from_file(&train, &fold_file(folds_dir, fold, weights_file))?;
    info!("Fold {}: {} non-zero item weights", fold + 1, model.qty_weights());
    Ok(Fold {
        train,
        validation,
        model,
    })
}

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    let config = AppConfig::new(&config_path)?;
    logging::init(&config.log.level);

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.evaluation.num_workers)
        .build_global()
        .context("could not start worker pool")?;

    let folds_dir = required(&config.data.folds_dir, "data.folds_dir")?;
    let fold_num = config.data.fold_num;
    let delimiter = config.data.delimiter;
    let has_header = config.data.has_header;

    let mut splits: Vec<(Vec<Interaction>, Vec<Interaction>)> = Vec::with_capacity(fold_num);
    for fold in 0..fold_num {
        let train_path = fold_file(folds_dir, fold, "train.txt");
        let validation_path = fold_file(folds_dir, fold, "validation.txt");
        let train = io::read_interactions(&train_path, delimiter, has_header)?;
        let validation = io::read_interactions(&validation_path, delimiter, has_header)?;
        splits.push((train, validation));
    }
    let all_splits: Vec<&[Interaction]> = splits
        .iter()
        .flat_map(|(train, validation)| vec![train.as_slice(), validation.as_slice()])
        .collect();
    let (user_count, item_count) = io::id_counts(&all_splits);
    info!(
        "Loaded {} folds of {} ({}): {} users, {} items",
        fold_num,
        config.data.dataset,
        config.data.prepro,
        user_count.to_formatted_string(&Locale::en),
        item_count.to_formatted_string(&Locale::en)
    );

    let settings = EvaluationSettings {
        candidates_num: config.evaluation.candidates_num,
        top_k: config.evaluation.top_k,
        cutoffs: config.evaluation.cutoffs.clone(),
        show_progress: false,
    };
    let item_space: BTreeSet<u64> = (0..item_count as u64).collect();
    let mut rng = Pcg64::seed_from_u64(config.evaluation.seed);

    let pb = ProgressBar::new(fold_num as u64);
    let weights_file = config.model.slim_weights_file.clone();
    let folds = splits.into_iter().enumerate().map(|(fold, (train, validation))| {
        pb.inc(1);
        load_fold(folds_dir, &weights_file, fold, train, validation)
    });
    let result = cross_validate(folds, &item_space, &settings, &mut rng)?;
    pb.finish_and_clear();

    info!("==================== Metrics for All Validation ====================");
    log_summary(&result.summary, settings.top_k);
    info!("{}", result.summary.get_name(settings.top_k));
    info!("{}", result.summary.result());
    info!(
        "p95 scoring latency over {} users (microseconds): {}",
        result.stopwatch.get_n(),
        result.stopwatch.get_percentile_in_micros(0.95)
    );

    let path = io::result_path(&config.output.result_dir, &config.data.dataset, "slim_cv");
    io::write_metric_table(&path, &result.table)?;
    info!("Saved metric@k result to {}", path.display());
    Ok(())
}
