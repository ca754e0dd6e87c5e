use car_model::FeatureVector;
use thiserror::Error;

// Values used when a field is absent or blank.
pub const DEFAULT_YEAR: i64 = 2018;
pub const DEFAULT_MILEAGE_KM: i64 = 40_000;
pub const DEFAULT_FUEL_TYPE: &str = "Petrol";
pub const DEFAULT_TRANSMISSION: &str = "Manual";
pub const DEFAULT_OWNER_COUNT: i64 = 1;
pub const DEFAULT_LOCATION_CITY: &str = "Hyderabad";
pub const DEFAULT_ENGINE_CC: i64 = 1200;
pub const DEFAULT_POWER_BHP: f64 = 85.0;
pub const DEFAULT_SEATS: i64 = 5;

/// Raw `/predict` form submission; every field is optional.
#[derive(Debug, Default)]
pub struct PredictForm {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub mileage_km: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub owner_count: Option<String>,
    pub location_city: Option<String>,
    pub engine_cc: Option<String>,
    pub power_bhp: Option<String>,
    pub seats: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("field `{field}` is not a valid {kind}: {value:?}")]
    Parse {
        field: &'static str,
        kind: &'static str,
        value: String,
    },
}

// Trimmed value, or None when absent or blank.
fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn text(v: &Option<String>, default: &str) -> String {
    present(v).unwrap_or(default).to_string()
}

fn int(v: &Option<String>, field: &'static str, default: i64) -> Result<i64, FormError> {
    match present(v) {
        None => Ok(default),
        Some(s) => s.parse().map_err(|_| FormError::Parse {
            field,
            kind: "integer",
            value: s.to_string(),
        }),
    }
}

fn float(v: &Option<String>, field: &'static str, default: f64) -> Result<f64, FormError> {
    match present(v) {
        None => Ok(default),
        Some(s) => s
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .ok_or_else(|| FormError::Parse {
                field,
                kind: "number",
                value: s.to_string(),
            }),
    }
}

impl PredictForm {
    /// Collect urlencoded pairs. A repeated key keeps its first value and
    /// unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "make" => &mut form.make,
                "model" => &mut form.model,
                "year" => &mut form.year,
                "mileage_km" => &mut form.mileage_km,
                "fuel_type" => &mut form.fuel_type,
                "transmission" => &mut form.transmission,
                "owner_count" => &mut form.owner_count,
                "location_city" => &mut form.location_city,
                "engine_cc" => &mut form.engine_cc,
                "power_bhp" => &mut form.power_bhp,
                "seats" => &mut form.seats,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        form
    }

    /// Apply defaults and parse numeric fields into a feature vector.
    ///
    /// No range checks: any integer year or mileage is accepted.
    pub fn resolve(&self) -> Result<FeatureVector, FormError> {
        Ok(FeatureVector {
            make: text(&self.make, ""),
            model: text(&self.model, ""),
            fuel_type: text(&self.fuel_type, DEFAULT_FUEL_TYPE),
            transmission: text(&self.transmission, DEFAULT_TRANSMISSION),
            location_city: text(&self.location_city, DEFAULT_LOCATION_CITY),
            year: int(&self.year, "year", DEFAULT_YEAR)?,
            mileage_km: int(&self.mileage_km, "mileage_km", DEFAULT_MILEAGE_KM)?,
            owner_count: int(&self.owner_count, "owner_count", DEFAULT_OWNER_COUNT)?,
            engine_cc: int(&self.engine_cc, "engine_cc", DEFAULT_ENGINE_CC)?,
            power_bhp: float(&self.power_bhp, "power_bhp", DEFAULT_POWER_BHP)?,
            seats: int(&self.seats, "seats", DEFAULT_SEATS)?,
        })
    }
}
