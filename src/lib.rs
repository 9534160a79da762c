//! # rankeval
//!
//! Turns a trained recommender's scoring function into comparable top-K
//! ranking metrics. Every held-out user gets a fixed-size candidate pool
//! of their held-out items plus sampled unseen negatives. The model ranks
//! each pool and the ranked lists are scored with precision, recall,
//! hit-rate, MAP, MRR and NDCG at several cutoffs.
//!
//! ```no_run
//! use rand::SeedableRng;
//! use rankeval::experiment::{evaluate_split, EvaluationSettings};
//! use rankeval::io::Interaction;
//! use rankeval::ranking::Scorer;
//!
//! let train = vec![Interaction { user: 0, item: 1, rating: 1.0 }];
//! let test = vec![Interaction { user: 0, item: 2, rating: 1.0 }];
//! let item_space = (0..100).collect();
//! let settings = EvaluationSettings {
//!     candidates_num: 10,
//!     top_k: 5,
//!     cutoffs: vec![1, 5],
//!     show_progress: false,
//! };
//! let popularity = |_user: u32, item: u64| 1.0 / (item as f64 + 1.0);
//! let mut rng = rand_pcg::Pcg64::seed_from_u64(42);
//! let result = evaluate_split(
//!     Scorer::Pairwise(&popularity),
//!     &train,
//!     &test,
//!     &item_space,
//!     &settings,
//!     &mut rng,
//! )
//! .unwrap();
//! println!("{}", result.summary.result());
//! ```

pub mod candidates;
pub mod config;
pub mod config_processors;
pub mod error;
pub mod experiment;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod ranking;
pub mod stopwatch;
