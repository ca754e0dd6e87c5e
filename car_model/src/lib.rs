//! Training and inference core for the used-car price predictor.
//!
//! The trainer and the web service both go through [`PricePipeline`], so the
//! on-disk artifact format is defined in exactly one place.

pub mod dataset;
pub mod encoder;
pub mod error;
pub mod forest;
pub mod metrics;
pub mod pipeline;
pub mod schema;

pub use dataset::{load_listings, train_test_split, LoadReport};
pub use error::{ModelError, ModelResult};
pub use forest::{ForestParams, RandomForestRegressor};
pub use metrics::Metrics;
pub use pipeline::{PricePipeline, TrainingSummary};
pub use schema::{FeatureVector, ListingRecord};
