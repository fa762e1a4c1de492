//! Transaction classifiers

pub mod aggregator;
pub mod classifier;
pub mod heuristic;

pub use aggregator::ScoreAggregator;
pub use classifier::{classify_batch, Classifier};
pub use heuristic::HeuristicClassifier;
