//! One-hot encoding of the categorical block and the column transformer that
//! joins it with the numeric passthrough block.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::schema::{FeatureVector, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};

/// One-hot encoder that maps unseen categories to an all-zero block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Sorted distinct values per categorical column.
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    /// Learn the vocabulary of each column.
    ///
    /// # Arguments
    /// * `rows` - Iterator of rows, each holding one value per categorical column
    pub fn fit<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = [&'a str; CATEGORICAL_COLUMNS.len()]>,
    {
        let mut seen: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); CATEGORICAL_COLUMNS.len()];
        for row in rows {
            for (set, value) in seen.iter_mut().zip(row) {
                set.insert(value);
            }
        }
        Self {
            categories: seen
                .into_iter()
                .map(|s| s.into_iter().map(str::to_string).collect())
                .collect(),
        }
    }

    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Total number of indicator columns produced.
    pub fn n_features_out(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Append the indicator block for one row to `out`.
    pub fn transform_into(&self, row: &[&str], out: &mut Vec<f64>) {
        for (cats, value) in self.categories.iter().zip(row) {
            let start = out.len();
            out.resize(start + cats.len(), 0.0);
            if let Ok(pos) = cats.binary_search_by(|c| c.as_str().cmp(*value)) {
                out[start + pos] = 1.0;
            }
        }
    }
}

/// Encoded categoricals followed by the raw numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    encoder: OneHotEncoder,
}

impl Preprocessor {
    pub fn fit<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a FeatureVector>,
    {
        Self {
            encoder: OneHotEncoder::fit(rows.into_iter().map(FeatureVector::categorical)),
        }
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn n_features_out(&self) -> usize {
        self.encoder.n_features_out() + NUMERIC_COLUMNS.len()
    }

    pub fn transform(&self, row: &FeatureVector) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.n_features_out());
        self.encoder.transform_into(&row.categorical(), &mut out);
        out.extend_from_slice(&row.numeric());
        out
    }

    /// Column names of the transformed matrix, e.g. `make=Honda` then `year`.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_features_out());
        for (col, cats) in CATEGORICAL_COLUMNS.iter().zip(&self.encoder.categories) {
            names.extend(cats.iter().map(|c| format!("{col}={c}")));
        }
        names.extend(NUMERIC_COLUMNS.iter().map(|c| c.to_string()));
        names
    }
}
