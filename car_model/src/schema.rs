use serde::{Deserialize, Serialize};

/// Categorical columns, in the order the encoder is fit.
pub const CATEGORICAL_COLUMNS: [&str; 5] = ["make", "model", "fuel_type", "transmission", "location_city"];

/// Numeric columns, passed through untransformed after the encoded block.
pub const NUMERIC_COLUMNS: [&str; 6] = [
    "year",
    "mileage_km",
    "owner_count",
    "engine_cc",
    "power_bhp",
    "seats",
];

/// Regression target.
pub const TARGET_COLUMN: &str = "price";

/// Every column a training row must carry.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "make",
    "model",
    "year",
    "mileage_km",
    "fuel_type",
    "transmission",
    "owner_count",
    "location_city",
    "engine_cc",
    "power_bhp",
    "seats",
    "price",
];

/// One car described by the eleven model inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub make: String,
    pub model: String,
    pub fuel_type: String,
    pub transmission: String,
    pub location_city: String,
    pub year: i64,
    pub mileage_km: i64,
    pub owner_count: i64,
    pub engine_cc: i64,
    pub power_bhp: f64,
    pub seats: i64,
}

impl FeatureVector {
    /// Categorical values in `CATEGORICAL_COLUMNS` order.
    pub fn categorical(&self) -> [&str; 5] {
        [
            &self.make,
            &self.model,
            &self.fuel_type,
            &self.transmission,
            &self.location_city,
        ]
    }

    /// Numeric values in `NUMERIC_COLUMNS` order.
    pub fn numeric(&self) -> [f64; 6] {
        [
            self.year as f64,
            self.mileage_km as f64,
            self.owner_count as f64,
            self.engine_cc as f64,
            self.power_bhp,
            self.seats as f64,
        ]
    }
}

/// A historical listing: features plus the observed sale price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(flatten)]
    pub features: FeatureVector,
    pub price: f64,
}
