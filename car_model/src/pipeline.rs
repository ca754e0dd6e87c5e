//! The fitted preprocessing + forest pipeline and its on-disk artifact.

use std::{fs, path::Path, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::encoder::Preprocessor;
use crate::error::{ModelError, ModelResult};
use crate::forest::{ForestParams, RandomForestRegressor};
use crate::metrics::Metrics;
use crate::schema::{FeatureVector, ListingRecord, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};

/// Bumped whenever the artifact layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// What the trainer knew about the run that produced a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub n_train: usize,
    pub n_test: usize,
    pub metrics: Option<Metrics>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct ColumnSchema {
    categorical: Vec<String>,
    numeric: Vec<String>,
}

impl ColumnSchema {
    fn current() -> Self {
        Self {
            categorical: CATEGORICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
            numeric: NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Serialize)]
struct ArtifactRef<'a> {
    format_version: u32,
    schema: ColumnSchema,
    preprocessor: &'a Preprocessor,
    forest: &'a RandomForestRegressor,
    training: &'a TrainingSummary,
}

#[derive(Deserialize)]
struct Artifact {
    format_version: u32,
    schema: ColumnSchema,
    preprocessor: Preprocessor,
    forest: RandomForestRegressor,
    training: TrainingSummary,
}

/// One-hot preprocessing followed by a random forest, fit on listing records.
///
/// Nothing mutates a pipeline after fitting, so a loaded instance can be
/// shared freely between request handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePipeline {
    preprocessor: Preprocessor,
    forest: RandomForestRegressor,
    training: TrainingSummary,
}

impl PricePipeline {
    /// Fit the encoder and the forest on training records.
    pub fn fit(records: &[ListingRecord], params: ForestParams) -> ModelResult<Self> {
        if records.is_empty() {
            return Err(ModelError::invalid("no training records"));
        }
        let preprocessor = Preprocessor::fit(records.iter().map(|r| &r.features));
        let x: Vec<Vec<f64>> = records
            .iter()
            .map(|r| preprocessor.transform(&r.features))
            .collect();
        let y: Vec<f64> = records.iter().map(|r| r.price).collect();

        info!(
            rows = records.len(),
            features = preprocessor.n_features_out(),
            trees = params.n_trees,
            "fitting random forest"
        );
        debug!(names = ?preprocessor.feature_names(), "encoded feature columns");
        let started = Instant::now();
        let forest = RandomForestRegressor::fit(&x, &y, params)?;
        info!(elapsed_ms = started.elapsed().as_millis() as u64, "forest fitted");

        Ok(Self {
            preprocessor,
            forest,
            training: TrainingSummary {
                n_train: records.len(),
                ..TrainingSummary::default()
            },
        })
    }

    /// One prediction per input row.
    pub fn predict(&self, rows: &[FeatureVector]) -> ModelResult<Vec<f64>> {
        rows.iter()
            .map(|row| self.forest.predict(&self.preprocessor.transform(row)))
            .collect()
    }

    /// Score the pipeline on held-out records.
    pub fn evaluate(&self, records: &[ListingRecord]) -> ModelResult<Metrics> {
        let features: Vec<FeatureVector> = records.iter().map(|r| r.features.clone()).collect();
        let y_pred = self.predict(&features)?;
        let y_true: Vec<f64> = records.iter().map(|r| r.price).collect();
        Ok(Metrics::evaluate(&y_true, &y_pred))
    }

    /// Attach held-out results so they travel with the artifact.
    pub fn with_evaluation(mut self, n_test: usize, metrics: Metrics) -> Self {
        self.training.n_test = n_test;
        self.training.metrics = Some(metrics);
        self
    }

    pub fn training(&self) -> &TrainingSummary {
        &self.training
    }

    pub fn forest(&self) -> &RandomForestRegressor {
        &self.forest
    }

    /// Serialize the artifact to JSON bytes.
    pub fn to_bytes(&self) -> ModelResult<Vec<u8>> {
        let artifact = ArtifactRef {
            format_version: FORMAT_VERSION,
            schema: ColumnSchema::current(),
            preprocessor: &self.preprocessor,
            forest: &self.forest,
            training: &self.training,
        };
        Ok(serde_json::to_vec(&artifact)?)
    }

    /// Rebuild a pipeline from artifact bytes, checking version and schema.
    pub fn from_bytes(bytes: &[u8]) -> ModelResult<Self> {
        let artifact: Artifact = serde_json::from_slice(bytes)?;
        if artifact.format_version != FORMAT_VERSION {
            return Err(ModelError::IncompatibleArtifact(format!(
                "format version {} (expected {FORMAT_VERSION})",
                artifact.format_version
            )));
        }
        if artifact.schema != ColumnSchema::current() {
            return Err(ModelError::IncompatibleArtifact(format!(
                "columns {:?} + {:?} do not match this build",
                artifact.schema.categorical, artifact.schema.numeric
            )));
        }
        let expected = artifact.preprocessor.n_features_out();
        if artifact.forest.n_features() != expected {
            return Err(ModelError::IncompatibleArtifact(format!(
                "forest expects {} features, encoder produces {expected}",
                artifact.forest.n_features()
            )));
        }
        artifact.forest.validate()?;
        Ok(Self {
            preprocessor: artifact.preprocessor,
            forest: artifact.forest,
            training: artifact.training,
        })
    }

    /// Write the artifact, creating the parent directory and replacing any
    /// previous file. The bytes land in a sibling `.tmp` file first and are
    /// renamed into place.
    pub fn save(&self, path: &Path) -> ModelResult<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| ModelError::io(dir, e))?;
        }
        let bytes = self.to_bytes()?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = Path::new(&tmp);
        fs::write(tmp, &bytes).map_err(|e| ModelError::io(tmp, e))?;
        fs::rename(tmp, path).map_err(|e| ModelError::io(path, e))?;

        info!(path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(())
    }

    pub fn load(path: &Path) -> ModelResult<Self> {
        let bytes = fs::read(path).map_err(|e| ModelError::io(path, e))?;
        Self::from_bytes(&bytes)
    }
}
