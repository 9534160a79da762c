use std::collections::BTreeSet;

use anyhow::Context;
use num_format::{Locale, ToFormattedString};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::info;

use rankeval::config::{required, AppConfig};
use rankeval::experiment::{evaluate_split, log_summary, EvaluationSettings};
use rankeval::io;
use rankeval::logging;
use rankeval::models::point_mf::PointMf;
use rankeval::ranking::ScoringModel;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    let config = AppConfig::new(&config_path)?;
    logging::init(&config.log.level);

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.evaluation.num_workers)
        .build_global()
        .context("could not start worker pool")?;

    let train_data_path = required(&config.data.train_data_path, "data.train_data_path")?;
    let test_data_path = required(&config.data.test_data_path, "data.test_data_path")?;
    let delimiter = config.data.delimiter;
    let has_header = config.data.has_header;
    let train = io::read_interactions(train_data_path, delimiter, has_header)?;
    let test = io::read_interactions(test_data_path, delimiter, has_header)?;
    let (user_count, item_count) = io::id_counts(&[train.as_slice(), test.as_slice()]);
    info!(
        "Loaded {} ({}): {} train / {} test interactions, {} users, {} items",
        config.data.dataset,
        config.data.prepro,
        train.len().to_formatted_string(&Locale::en),
        test.len().to_formatted_string(&Locale::en),
        user_count.to_formatted_string(&Locale::en),
        item_count.to_formatted_string(&Locale::en)
    );

    let model = PointMf::from_files(
        required(&config.model.user_factors_path, "model.user_factors_path")?,
        required(&config.model.item_factors_path, "model.item_factors_path")?,
        user_count,
        item_count,
    )?;
    info!("Loaded factorization model with {} factors", model.factors());

    let settings = EvaluationSettings {
        candidates_num: config.evaluation.candidates_num,
        top_k: config.evaluation.top_k,
        cutoffs: config.evaluation.cutoffs.clone(),
        show_progress: true,
    };
    let item_space: BTreeSet<u64> = (0..item_count as u64).collect();
    let mut rng = Pcg64::seed_from_u64(config.evaluation.seed);

    info!("Start Calculating Metrics......");
    let result = evaluate_split(
        model.scorer(),
        &train,
        &test,
        &item_space,
        &settings,
        &mut rng,
    )?;

    log_summary(&result.summary, settings.top_k);
    let stopwatch = &result.stopwatch;
    info!("Qty ranked users: {}", stopwatch.get_n());
    info!("Scoring latency");
    info!("p90 (microseconds): {}", stopwatch.get_percentile_in_micros(0.9));
    info!("p95 (microseconds): {}", stopwatch.get_percentile_in_micros(0.95));
    info!("p99.5 (microseconds): {}", stopwatch.get_percentile_in_micros(0.995));

    let model_tag = format!("pointmf_{}", config.model.loss_type);
    let path = io::result_path(&config.output.result_dir, &config.data.dataset, &model_tag);
    io::write_metric_table(&path, &result.table)?;
    info!("Saved metric@k result to {}", path.display());
    Ok(())
}
