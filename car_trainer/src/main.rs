use anyhow::{Context, Result};
use car_model::{load_listings, train_test_split, PricePipeline};
use tracing_subscriber::EnvFilter;

mod config;

use config::TrainerConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = TrainerConfig::from_env();
    run(&cfg)
}

fn run(cfg: &TrainerConfig) -> Result<()> {
    // Load and clean
    let (records, report) = load_listings(&cfg.data_path)
        .with_context(|| format!("failed to load dataset {}", cfg.data_path.display()))?;
    if report.rows_dropped > 0 {
        tracing::info!("dropped {} incomplete rows", report.rows_dropped);
    }

    // Hold out a fixed-seed evaluation partition
    let (train, test) = train_test_split(&records, cfg.test_fraction, cfg.split_seed);
    tracing::info!("split {} rows: train={} test={}", records.len(), train.len(), test.len());

    let pipeline = PricePipeline::fit(&train, cfg.forest).context("failed to fit pipeline")?;
    let metrics = pipeline
        .evaluate(&test)
        .context("failed to evaluate pipeline")?;
    println!("{metrics}");

    let pipeline = pipeline.with_evaluation(test.len(), metrics);
    pipeline
        .save(&cfg.model_path)
        .with_context(|| format!("failed to save pipeline to {}", cfg.model_path.display()))?;
    println!("Saved trained pipeline to: {}", cfg.model_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use car_model::ForestParams;
    use std::fs;

    fn config_in(dir: &std::path::Path) -> TrainerConfig {
        TrainerConfig {
            data_path: dir.join("data/car_listings.csv"),
            model_path: dir.join("models/car_price_pipeline.joblib"),
            forest: ForestParams {
                n_trees: 10,
                ..ForestParams::default()
            },
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn trains_and_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        fs::create_dir_all(cfg.data_path.parent().unwrap()).unwrap();

        let mut csv = String::from(
            "make,model,year,mileage_km,fuel_type,transmission,owner_count,location_city,engine_cc,power_bhp,seats,price\n",
        );
        for i in 0..40 {
            let (make, base) = if i % 2 == 0 { ("Maruti", 400_000) } else { ("Honda", 900_000) };
            csv.push_str(&format!(
                "{make},M{},{},{},Petrol,Manual,1,Pune,1200,85,5,{}\n",
                i % 3,
                2012 + i % 8,
                20_000 + i * 1_000,
                base + (i % 8) * 30_000
            ));
        }
        fs::write(&cfg.data_path, csv).unwrap();

        run(&cfg).unwrap();
        let loaded = PricePipeline::load(&cfg.model_path).unwrap();
        assert_eq!(loaded.training().n_train, 32);
        assert_eq!(loaded.training().n_test, 8);
        assert!(loaded.training().metrics.is_some());
    }

    #[test]
    fn missing_dataset_fails_without_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let err = run(&cfg).unwrap_err();
        assert!(format!("{err:#}").contains("car_listings.csv"));
        assert!(!cfg.model_path.exists());
    }

    #[test]
    fn malformed_dataset_fails_without_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        fs::create_dir_all(cfg.data_path.parent().unwrap()).unwrap();
        fs::write(
            &cfg.data_path,
            "make,model,year,mileage_km,fuel_type,transmission,owner_count,location_city,engine_cc,power_bhp,seats,price\n\
             Honda,City,2019,30000,Petrol,Manual,1,Hyderabad,1497,119,5,950000\n\
             Honda,City,twenty,30000,Petrol,Manual,1,Hyderabad,1497,119,5,950000\n",
        )
        .unwrap();

        let err = run(&cfg).unwrap_err();
        assert!(format!("{err:#}").contains("year"));
        assert!(!cfg.model_path.exists());
        assert!(!dir.path().join("models/car_price_pipeline.joblib.tmp").exists());
    }
}
