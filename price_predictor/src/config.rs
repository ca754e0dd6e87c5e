use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "models/car_price_pipeline.joblib";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub bind_addr: String,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let model_path = lookup("CAR_PRICE_MODEL_PATH")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string());
        let bind_addr = lookup("BIND_ADDR")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        Self {
            model_path: PathBuf::from(model_path),
            bind_addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ServiceConfig::from_lookup(|_| None);
        assert_eq!(cfg.model_path, PathBuf::from("models/car_price_pipeline.joblib"));
        assert_eq!(cfg.bind_addr, "127.0.0.1:5000");
    }

    #[test]
    fn overrides() {
        let cfg = ServiceConfig::from_lookup(|key| match key {
            "BIND_ADDR" => Some("0.0.0.0:8080".into()),
            _ => None,
        });
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }
}
