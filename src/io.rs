use anyhow::{anyhow, Context};
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use std::fs::{self, File};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use crate::metrics::evaluation_reporter::MetricTable;
use crate::metrics::Metric;

pub type UserId = u32;
pub type ItemId = u64;
pub type Rating = f64;

/// Items each user interacted with in one split.
pub type GroundTruth = HashMap<UserId, HashSet<ItemId>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub user: UserId,
    pub item: ItemId,
    pub rating: Rating,
}

/// User and item counts of splits that share one id space: `max id + 1`
/// over every split, so the item space covers items only seen at test time.
pub fn id_counts(splits: &[&[Interaction]]) -> (usize, usize) {
    let user_count = splits
        .iter()
        .flat_map(|split| split.iter())
        .map(|interaction| interaction.user as usize + 1)
        .max()
        .unwrap_or(0);
    let item_count = splits
        .iter()
        .flat_map(|split| split.iter())
        .map(|interaction| interaction.item as usize + 1)
        .max()
        .unwrap_or(0);
    (user_count, item_count)
}

/// Reads `user item rating [...]` records. Trailing columns such as a
/// timestamp are ignored.
pub fn read_interactions(
    path: &str,
    delimiter: u8,
    has_header: bool,
) -> anyhow::Result<Vec<Interaction>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("could not open interaction file {}", path))?;

    let mut interactions = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("{}: malformed record {}", path, line))?;
        if record.len() < 3 {
            return Err(anyhow!("{}: record {} has {} columns", path, line, record.len()));
        }
        let interaction = Interaction {
            user: record[0]
                .parse()
                .with_context(|| format!("{}: invalid user id in record {}", path, line))?,
            item: record[1]
                .parse()
                .with_context(|| format!("{}: invalid item id in record {}", path, line))?,
            rating: record[2]
                .parse()
                .with_context(|| format!("{}: invalid rating in record {}", path, line))?,
        };
        interactions.push(interaction);
    }
    Ok(interactions)
}

/// Groups a split into the per-user item sets used as ground truth.
pub fn get_ur(interactions: &[Interaction]) -> GroundTruth {
    interactions
        .iter()
        .map(|interaction| (interaction.user, interaction.item))
        .into_group_map()
        .into_iter()
        .map(|(user, items)| (user, items.into_iter().collect::<HashSet<ItemId>>()))
        .collect()
}

fn create_buffered_line_reader<P>(filename: P) -> io::Result<io::Lines<io::BufReader<File>>>
where
    P: AsRef<Path>,
{
    let file = File::open(filename)?;
    Ok(io::BufReader::new(file).lines())
}

/// Reads a dense factor matrix stored as `id f_1 ... f_d` lines.
pub fn read_factors(path: &str, rows: usize) -> anyhow::Result<Vec<Vec<f64>>> {
    let line_iterator = create_buffered_line_reader(path)
        .with_context(|| format!("could not open factor file {}", path))?;

    let mut factors: Vec<Option<Vec<f64>>> = vec![None; rows];
    for (line_number, line) in line_iterator.enumerate() {
        let rawline = line.with_context(|| format!("{}:{} unreadable line", path, line_number))?;
        if rawline.trim().is_empty() {
            continue;
        }
        let mut parts = rawline.split_whitespace();
        let id = parts
            .next()
            .ok_or_else(|| anyhow!("{}:{} missing id", path, line_number))?
            .parse::<usize>()
            .with_context(|| format!("{}:{} invalid id", path, line_number))?;
        let values = parts
            .map(|value| value.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("{}:{} invalid factor", path, line_number))?;
        let slot = factors
            .get_mut(id)
            .ok_or_else(|| anyhow!("{}:{} id {} outside 0..{}", path, line_number, id, rows))?;
        *slot = Some(values);
    }

    factors
        .into_iter()
        .enumerate()
        .map(|(id, row)| row.ok_or_else(|| anyhow!("{}: no factors for id {}", path, id)))
        .collect()
}

/// Reads sparse `source target weight` triplets.
pub fn read_weight_triplets(path: &str) -> anyhow::Result<Vec<(ItemId, ItemId, f64)>> {
    let line_iterator = create_buffered_line_reader(path)
        .with_context(|| format!("could not open weight file {}", path))?;

    let mut triplets = Vec::new();
    for (line_number, line) in line_iterator.enumerate() {
        let rawline = line.with_context(|| format!("{}:{} unreadable line", path, line_number))?;
        let parts = rawline.split_whitespace().take(3).collect::<Vec<_>>();
        if parts.is_empty() {
            continue;
        }
        if parts.len() < 3 {
            return Err(anyhow!("{}:{} expected 3 columns", path, line_number));
        }
        let triplet = (
            parts[0]
                .parse::<ItemId>()
                .with_context(|| format!("{}:{} invalid source item", path, line_number))?,
            parts[1]
                .parse::<ItemId>()
                .with_context(|| format!("{}:{} invalid target item", path, line_number))?,
            parts[2]
                .parse::<f64>()
                .with_context(|| format!("{}:{} invalid weight", path, line_number))?,
        );
        triplets.push(triplet);
    }
    Ok(triplets)
}

pub fn result_path(result_dir: &str, dataset: &str, model_tag: &str) -> PathBuf {
    Path::new(result_dir)
        .join(dataset)
        .join(format!("metric_result_{}.csv", model_tag))
}

/// Writes one row per metric and one column per cutoff.
pub fn write_metric_table(path: &Path, table: &MetricTable) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("could not create {}", parent.display()))?;
    }
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["metric@K".to_string()];
    header.extend(table.cutoffs().map(|cutoff| cutoff.to_string()));
    wtr.write_record(&header)?;

    for metric in Metric::ALL.iter() {
        let mut row = vec![metric.short_name().to_string()];
        row.extend(table.row(*metric).map(|value| value.to_string()));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod io_test {
    use super::*;
    use tempfile::TempDir;

    use crate::metrics::evaluation_reporter::MetricVector;

    fn interaction(user: UserId, item: ItemId, rating: Rating) -> Interaction {
        Interaction { user, item, rating }
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn should_group_interactions_per_user() {
        let interactions = vec![
            interaction(1, 10, 4.0),
            interaction(1, 11, 3.0),
            interaction(2, 10, 5.0),
            interaction(1, 10, 2.0),
        ];
        let ground_truth = get_ur(&interactions);
        assert_eq!(2, ground_truth.len());
        assert_eq!(2, ground_truth[&1].len());
        assert!(ground_truth[&2].contains(&10));
    }

    #[test]
    fn should_count_ids_over_all_splits() {
        let train = vec![interaction(0, 7, 1.0)];
        let test = vec![interaction(3, 2, 1.0)];
        assert_eq!((4, 8), id_counts(&[train.as_slice(), test.as_slice()]));
    }

    #[test]
    fn should_derive_result_path() {
        let path = result_path("./res", "ml-100k", "pointmf_CL");
        assert_eq!(
            Path::new("./res/ml-100k/metric_result_pointmf_CL.csv"),
            path.as_path()
        );
    }

    #[test]
    fn should_read_interactions_and_ignore_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "train.txt", "0\t1\t4.0\t881250949\n3\t7\t2.5\t881250950\n");
        let interactions = read_interactions(&path, b'\t', false).unwrap();
        assert_eq!(
            vec![
                interaction(0, 1, 4.0),
                interaction(3, 7, 2.5),
            ],
            interactions
        );
    }

    #[test]
    fn should_skip_header_row() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "test.csv", "user,item,rating\n2, 5, 1.0\n");
        let interactions = read_interactions(&path, b',', true).unwrap();
        assert_eq!(vec![interaction(2, 5, 1.0)], interactions);
    }

    #[test]
    fn should_reject_records_with_too_few_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "short.txt", "0\t1\t4.0\n1\t2\n");
        let error = read_interactions(&path, b'\t', false).unwrap_err();
        assert!(error.to_string().contains("record 1 has 2 columns"));

        let path = write_file(&dir, "bad.txt", "0\tx\t4.0\n");
        let error = read_interactions(&path, b'\t', false).unwrap_err();
        assert!(error.to_string().contains("invalid item id in record 0"));
    }

    #[test]
    fn should_read_factor_rows_by_id() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "items.txt", "1 0.3 0.4\n\n0 0.1 0.2\n");
        let factors = read_factors(&path, 2).unwrap();
        assert_eq!(vec![vec![0.1, 0.2], vec![0.3, 0.4]], factors);
    }

    #[test]
    fn should_reject_out_of_range_and_missing_factor_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "users.txt", "0 0.1 0.2\n1 0.3 0.4\n");

        let error = read_factors(&path, 1).unwrap_err();
        assert!(error.to_string().contains("id 1 outside 0..1"));

        let error = read_factors(&path, 3).unwrap_err();
        assert!(error.to_string().contains("no factors for id 2"));
    }

    #[test]
    fn should_read_weight_triplets() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "weights.txt", "1 10 0.5\n\n2 20 1.5\n");
        assert_eq!(vec![(1, 10, 0.5), (2, 20, 1.5)], read_weight_triplets(&path).unwrap());

        let path = write_file(&dir, "broken.txt", "1 10 0.5\n2 x 1.5\n");
        let error = read_weight_triplets(&path).unwrap_err();
        assert!(error.to_string().ends_with(":1 invalid target item"));

        let path = write_file(&dir, "short.txt", "1 10\n");
        assert!(read_weight_triplets(&path).is_err());
    }

    #[test]
    fn should_write_one_row_per_metric() {
        let dir = TempDir::new().unwrap();
        let vector = |value: f64| MetricVector {
            precision: value,
            recall: value * 2.0,
            hit_rate: 1.0,
            map: 0.0,
            mrr: value,
            ndcg: 0.75,
        };
        let table = MetricTable::from_columns(vec![(1, vector(0.5)), (5, vector(0.25))]);
        let path = result_path(&dir.path().to_string_lossy(), "ml-100k", "slim_cv");

        write_metric_table(&path, &table).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            vec![
                "metric@K,1,5",
                "pre,0.5,0.25",
                "rec,1,0.5",
                "hr,1,1",
                "map,0,0",
                "mrr,0.5,0.25",
                "ndcg,0.75,0.75",
            ],
            written.lines().collect::<Vec<_>>()
        );
    }
}
