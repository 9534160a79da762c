use std::ffi::OsStr;
use std::fs::File;

use anyhow::{anyhow, Context};
use justconfig::item::ValueExtractor;
use justconfig::processors::Trim;
use justconfig::sources::env::Env;
use justconfig::sources::text::ConfigText;
use justconfig::ConfPath;
use justconfig::Config;

use crate::config_processors::Unquote;

// Set some default values
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DATASET: &str = "ml-100k";
const DEFAULT_PREPRO: &str = "origin";
const DEFAULT_FOLD_NUM: usize = 5;
const DEFAULT_CANDIDATES_NUM: usize = 1000;
const DEFAULT_TOP_K: usize = 50;
const DEFAULT_CUTOFFS: &str = "1,5,10,20,30,50";
const DEFAULT_SEED: u64 = 42;
const DEFAULT_LOSS_TYPE: &str = "CL";
const DEFAULT_SLIM_WEIGHTS_FILE: &str = "slim_weights.txt";
const DEFAULT_RESULT_DIR: &str = "./res";

pub struct AppConfig {
    pub log: LogConfig,
    pub data: DataConfig,
    pub evaluation: EvaluationConfig,
    pub model: ModelConfig,
    pub output: OutputConfig,
}

pub struct LogConfig {
    pub level: String,
}

pub struct DataConfig {
    pub dataset: String,
    pub prepro: String,
    pub delimiter: u8,
    pub has_header: bool,
    pub train_data_path: Option<String>,
    pub test_data_path: Option<String>,
    pub folds_dir: Option<String>,
    pub fold_num: usize,
}

pub struct EvaluationConfig {
    pub candidates_num: usize,
    pub top_k: usize,
    pub cutoffs: Vec<usize>,
    pub seed: u64,
    pub num_workers: usize,
}

pub struct ModelConfig {
    pub user_factors_path: Option<String>,
    pub item_factors_path: Option<String>,
    pub loss_type: String,
    pub slim_weights_file: String,
}

pub struct OutputConfig {
    pub result_dir: String,
}

impl AppConfig {
    pub fn new(config_path: &str) -> anyhow::Result<AppConfig> {
        // Initialize config object
        let mut conf = Config::default();

        // Check if there is a config file
        if let Ok(config_file) = File::open(config_path) {
            let config_text = ConfigText::new(config_file, config_path)
                .map_err(|e| anyhow!("Loading configuration file {} failed: {}", config_path, e))?;
            conf.add_source(config_text);
        }

        // Define config params from environment variables
        let config_env = Env::new(&[
            (ConfPath::from(&["log", "level"]), OsStr::new("LOG_LEVEL")),
            (ConfPath::from(&["data", "dataset"]), OsStr::new("DATASET")),
            (
                ConfPath::from(&["data", "train_data_path"]),
                OsStr::new("TRAINING_DATA"),
            ),
            (
                ConfPath::from(&["data", "test_data_path"]),
                OsStr::new("TEST_DATA"),
            ),
            (ConfPath::from(&["data", "folds_dir"]), OsStr::new("FOLDS_DIR")),
            (ConfPath::from(&["evaluation", "seed"]), OsStr::new("SEED")),
            (
                ConfPath::from(&["evaluation", "num_workers"]),
                OsStr::new("NUM_WORKERS"),
            ),
            (
                ConfPath::from(&["output", "result_dir"]),
                OsStr::new("RESULT_DIR"),
            ),
        ]);
        conf.add_source(config_env);

        // Parse into custom config struct
        AppConfig::parse(conf)
    }

    fn parse(conf: Config) -> anyhow::Result<AppConfig> {
        Ok(AppConfig {
            log: LogConfig::parse(&conf, ConfPath::from(&["log"])),
            data: DataConfig::parse(&conf, ConfPath::from(&["data"]))?,
            evaluation: EvaluationConfig::parse(&conf, ConfPath::from(&["evaluation"]))?,
            model: ModelConfig::parse(&conf, ConfPath::from(&["model"])),
            output: OutputConfig::parse(&conf, ConfPath::from(&["output"])),
        })
    }
}

/// Fetches a path that only some binaries need.
pub fn required<'a>(value: &'a Option<String>, key: &str) -> anyhow::Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| anyhow!("Configuration value {} is not set", key))
}

fn parse_delimiter(raw: &str) -> anyhow::Result<u8> {
    match raw {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "space" => Ok(b' '),
        other if other.len() == 1 => Ok(other.as_bytes()[0]),
        other => Err(anyhow!("Invalid delimiter: {:?}", other)),
    }
}

/// Parses a comma separated list of positive cutoffs such as `1,5,10`.
pub fn parse_cutoffs(raw: &str) -> anyhow::Result<Vec<usize>> {
    let cutoffs = raw
        .split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .with_context(|| format!("Invalid cutoff {:?}", part))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    if cutoffs.is_empty() {
        return Err(anyhow!("No cutoffs configured"));
    }
    if cutoffs.contains(&0) {
        return Err(anyhow!("Cutoffs must be positive: {}", raw));
    }
    Ok(cutoffs)
}

impl LogConfig {
    fn parse(conf: &Config, path: ConfPath) -> LogConfig {
        LogConfig {
            level: conf
                .get(path.push("level"))
                .unquote()
                .value()
                .unwrap_or_else(|_| String::from(DEFAULT_LOG_LEVEL)),
        }
    }
}

impl DataConfig {
    fn parse(conf: &Config, path: ConfPath) -> anyhow::Result<DataConfig> {
        let delimiter: String = conf
            .get(path.push("delimiter"))
            .unquote()
            .value()
            .unwrap_or_else(|_| String::from("tab"));
        Ok(DataConfig {
            dataset: conf
                .get(path.push("dataset"))
                .unquote()
                .value()
                .unwrap_or_else(|_| String::from(DEFAULT_DATASET)),
            prepro: conf
                .get(path.push("prepro"))
                .unquote()
                .value()
                .unwrap_or_else(|_| String::from(DEFAULT_PREPRO)),
            delimiter: parse_delimiter(&delimiter)?,
            has_header: conf
                .get(path.push("has_header"))
                .trim()
                .value()
                .unwrap_or(false),
            train_data_path: conf.get(path.push("train_data_path")).unquote().value().ok(),
            test_data_path: conf.get(path.push("test_data_path")).unquote().value().ok(),
            folds_dir: conf.get(path.push("folds_dir")).unquote().value().ok(),
            fold_num: conf
                .get(path.push("fold_num"))
                .trim()
                .value()
                .unwrap_or(DEFAULT_FOLD_NUM),
        })
    }
}

impl EvaluationConfig {
    fn parse(conf: &Config, path: ConfPath) -> anyhow::Result<EvaluationConfig> {
        let cutoffs: String = conf
            .get(path.push("cutoffs"))
            .unquote()
            .value()
            .unwrap_or_else(|_| String::from(DEFAULT_CUTOFFS));
        Ok(EvaluationConfig {
            candidates_num: conf
                .get(path.push("candidates_num"))
                .trim()
                .value()
                .unwrap_or(DEFAULT_CANDIDATES_NUM),
            top_k: conf
                .get(path.push("top_k"))
                .trim()
                .value()
                .unwrap_or(DEFAULT_TOP_K),
            cutoffs: parse_cutoffs(&cutoffs)?,
            seed: conf
                .get(path.push("seed"))
                .trim()
                .value()
                .unwrap_or(DEFAULT_SEED),
            num_workers: conf
                .get(path.push("num_workers"))
                .trim()
                .value()
                // Detect number of CPUs
                .unwrap_or_else(|_| sys_info::cpu_num().map(|cpus| cpus as usize).unwrap_or(1)),
        })
    }
}

impl ModelConfig {
    fn parse(conf: &Config, path: ConfPath) -> ModelConfig {
        ModelConfig {
            user_factors_path: conf.get(path.push("user_factors_path")).unquote().value().ok(),
            item_factors_path: conf.get(path.push("item_factors_path")).unquote().value().ok(),
            loss_type: conf
                .get(path.push("loss_type"))
                .unquote()
                .value()
                .unwrap_or_else(|_| String::from(DEFAULT_LOSS_TYPE)),
            slim_weights_file: conf
                .get(path.push("slim_weights_file"))
                .unquote()
                .value()
                .unwrap_or_else(|_| String::from(DEFAULT_SLIM_WEIGHTS_FILE)),
        }
    }
}

impl OutputConfig {
    fn parse(conf: &Config, path: ConfPath) -> OutputConfig {
        OutputConfig {
            result_dir: conf
                .get(path.push("result_dir"))
                .unquote()
                .value()
                .unwrap_or_else(|_| String::from(DEFAULT_RESULT_DIR)),
        }
    }
}
