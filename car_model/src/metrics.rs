//! Regression metrics reported by the trainer.

use std::fmt;

use serde::{Deserialize, Serialize};

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return 0.0;
    }
    let sum: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum();
    sum / y_true.len() as f64
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return 0.0;
    }
    let sum: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p) * (t - p)).sum();
    sum / y_true.len() as f64
}

pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    mean_squared_error(y_true, y_pred).sqrt()
}

/// Coefficient of determination.
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p) * (t - p)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean) * (t - mean)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Held-out evaluation of a fitted pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl Metrics {
    pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> Self {
        Self {
            mae: mean_absolute_error(y_true, y_pred),
            rmse: root_mean_squared_error(y_true, y_pred),
            r2: r2_score(y_true, y_pred),
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test MAE:  ₹{}", group_thousands(self.mae.round() as i64))?;
        writeln!(f, "Test RMSE: ₹{}", group_thousands(self.rmse.round() as i64))?;
        write!(f, "R² Score:  {:.3}", self.r2)
    }
}

/// Format an integer with comma thousands separators, e.g. `1,234,000`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let y = [1.0, 2.0, 3.0];
        let m = Metrics::evaluate(&y, &y);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.r2, 1.0);
    }

    #[test]
    fn known_values() {
        let t = [3.0, -0.5, 2.0, 7.0];
        let p = [2.5, 0.0, 2.0, 8.0];
        assert!((mean_absolute_error(&t, &p) - 0.5).abs() < 1e-12);
        assert!((mean_squared_error(&t, &p) - 0.375).abs() < 1e-12);
        assert!((root_mean_squared_error(&t, &p) - 0.375f64.sqrt()).abs() < 1e-12);
        assert!((r2_score(&t, &p) - 0.948_608_137_044_967_9).abs() < 1e-12);
    }

    #[test]
    fn constant_target_r2() {
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&[5.0, 5.0], &[4.0, 6.0]), 0.0);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-45000), "-45,000");
    }

    #[test]
    fn display_matches_console_layout() {
        let m = Metrics {
            mae: 51234.4,
            rmse: 80210.6,
            r2: 0.91234,
        };
        assert_eq!(
            m.to_string(),
            "Test MAE:  ₹51,234\nTest RMSE: ₹80,211\nR² Score:  0.912"
        );
    }
}
