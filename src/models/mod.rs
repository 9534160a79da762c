//! Scoring adapters for trained models.
//!
//! Training happens elsewhere; these types load the learned parameters and
//! expose them through the ranker's scoring traits.

pub mod point_mf;
pub mod slim;
