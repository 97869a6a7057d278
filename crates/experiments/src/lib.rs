//! Statistical analysis of A/B conversion experiments.
//!
//! This crate combines a pooled two-proportion z-test, a Monte Carlo
//! comparison of Beta posteriors, and a sample-size planner into a single
//! ship / stop / continue recommendation.

pub mod analysis;
pub mod bayesian;
pub mod decision;
pub mod error;
pub mod frequentist;
pub mod sample_size;
pub mod types;

pub use analysis::{ExperimentAnalyzer, ExperimentReport};
pub use bayesian::{BayesianEngine, BayesianResult, BetaPosterior};
pub use decision::{determine_recommendation, DecisionInputs};
pub use error::ValidationError;
pub use frequentist::{z_test_proportions, FrequentistResult};
pub use sample_size::{required_sample_size, SampleSizePlan, SampleSizeRequest};
pub use types::{AnalysisRequest, Arm, ArmCounts, ExperimentObservation, Recommendation};
