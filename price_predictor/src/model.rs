use std::path::Path;

use anyhow::{bail, Context, Result};
use car_model::{FeatureVector, PricePipeline};

use crate::error::ServiceError;

/// Load the trained pipeline, refusing to continue when the artifact is absent.
pub fn load_pipeline(model_path: &Path) -> Result<PricePipeline> {
    if !model_path.exists() {
        bail!(
            "Model not found at {}. Run `cargo run --release -p car_trainer` first to create it.",
            model_path.display()
        );
    }
    PricePipeline::load(model_path)
        .with_context(|| format!("failed to load model artifact {}", model_path.display()))
}

/// Price a single car. The pipeline must answer with exactly one value.
pub fn predict_one(pipeline: &PricePipeline, features: FeatureVector) -> Result<f64, ServiceError> {
    let preds = pipeline.predict(&[features])?;
    match preds.as_slice() {
        [price] => Ok(*price),
        other => Err(ServiceError::PredictionCount(other.len())),
    }
}

/// Round to the nearest 1000 for display; exact halves go to the even thousand.
pub fn round_to_thousand(raw: f64) -> i64 {
    ((raw / 1000.0).round_ties_even() * 1000.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rounds_to_nearest_thousand() {
        assert_eq!(round_to_thousand(0.0), 0);
        assert_eq!(round_to_thousand(1_234_567.0), 1_235_000);
        assert_eq!(round_to_thousand(1_234_499.9), 1_234_000);
        assert_eq!(round_to_thousand(999.9), 1000);
    }

    #[test]
    fn ties_go_to_even() {
        assert_eq!(round_to_thousand(2_500.0), 2_000);
        assert_eq!(round_to_thousand(3_500.0), 4_000);
        assert_eq!(round_to_thousand(500.0), 0);
        assert_eq!(round_to_thousand(-500.0), 0);
        assert_eq!(round_to_thousand(-1_500.0), -2_000);
    }

    #[test]
    fn missing_artifact_names_path_and_remedy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models/car_price_pipeline.joblib");
        let err = load_pipeline(&path).unwrap_err().to_string();
        assert!(err.contains("car_price_pipeline.joblib"), "{err}");
        assert!(err.contains("car_trainer"), "{err}");
    }

    #[test]
    fn corrupt_artifact_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("car_price_pipeline.joblib");
        std::fs::write(&path, b"\x80\x04joblib pickle").unwrap();
        let err = load_pipeline(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load model artifact"));
    }

    proptest! {
        #[test]
        fn rounding_is_idempotent(raw in -1.0e9f64..1.0e9) {
            let once = round_to_thousand(raw);
            prop_assert_eq!(once % 1000, 0);
            prop_assert_eq!(round_to_thousand(once as f64), once);
        }
    }
}
