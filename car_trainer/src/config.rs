use std::path::PathBuf;

use car_model::ForestParams;

pub const DEFAULT_DATA_PATH: &str = "data/car_listings.csv";
pub const DEFAULT_MODEL_PATH: &str = "models/car_price_pipeline.joblib";

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub test_fraction: f64,
    pub split_seed: u64,
    pub forest: ForestParams,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            test_fraction: 0.2,
            split_seed: 42,
            forest: ForestParams::default(),
        }
    }
}

impl TrainerConfig {
    /// Fixed defaults, with the two paths overridable from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(p) = lookup("CAR_PRICE_DATA_PATH").filter(|s| !s.is_empty()) {
            cfg.data_path = PathBuf::from(p);
        }
        if let Some(p) = lookup("CAR_PRICE_MODEL_PATH").filter(|s| !s.is_empty()) {
            cfg.model_path = PathBuf::from(p);
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_training_contract() {
        let cfg = TrainerConfig::from_lookup(|_| None);
        assert_eq!(cfg.data_path, PathBuf::from("data/car_listings.csv"));
        assert_eq!(cfg.model_path, PathBuf::from("models/car_price_pipeline.joblib"));
        assert_eq!(cfg.test_fraction, 0.2);
        assert_eq!(cfg.split_seed, 42);
        assert_eq!(cfg.forest.n_trees, 300);
        assert_eq!(cfg.forest.max_depth, None);
        assert_eq!(cfg.forest.min_samples_split, 4);
        assert_eq!(cfg.forest.seed, 42);
    }

    #[test]
    fn env_overrides_paths() {
        let cfg = TrainerConfig::from_lookup(|key| match key {
            "CAR_PRICE_DATA_PATH" => Some("/tmp/cars.csv".into()),
            "CAR_PRICE_MODEL_PATH" => Some(String::new()),
            _ => None,
        });
        assert_eq!(cfg.data_path, PathBuf::from("/tmp/cars.csv"));
        assert_eq!(cfg.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }
}
