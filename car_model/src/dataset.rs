//! Loading listing records from CSV and splitting them for evaluation.

use std::{fs::File, io::Read, path::Path};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, info};

use crate::error::{ModelError, ModelResult};
use crate::schema::{FeatureVector, ListingRecord, REQUIRED_COLUMNS};

/// Cell spellings treated as a missing value.
const NA_MARKERS: [&str; 7] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Row counts observed while loading a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Data rows present in the file (header excluded).
    pub rows_read: usize,
    /// Rows discarded because a required field was missing.
    pub rows_dropped: usize,
}

impl LoadReport {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.rows_dropped
    }
}

/// Load listings from a CSV file, discarding rows with a missing required field.
///
/// # Arguments
/// * `path` - CSV file with a header row naming at least the twelve required columns
///
/// # Returns
/// The complete records and a report of how many rows were dropped. Fails if the
/// file cannot be read, a required column is absent, a present value does not
/// parse, or nothing survives cleaning.
pub fn load_listings(path: &Path) -> ModelResult<(Vec<ListingRecord>, LoadReport)> {
    let file = File::open(path).map_err(|e| ModelError::io(path, e))?;
    let (records, report) = read_listings(file)?;
    info!(
        path = %path.display(),
        rows = report.rows_read,
        dropped = report.rows_dropped,
        "loaded listings"
    );
    Ok((records, report))
}

/// Same as [`load_listings`] over any reader.
pub fn read_listings<R: Read>(reader: R) -> ModelResult<(Vec<ListingRecord>, LoadReport)> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| ModelError::Csv(e.to_string()))?
        .clone();
    let width = headers.len();

    // Position of each required column in the file.
    let mut idx = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS.iter()) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == *name)
            .ok_or_else(|| ModelError::MissingColumn((*name).to_string()))?;
    }

    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for (row_no, row) in rdr.records().enumerate() {
        let row = row.map_err(|e| ModelError::Csv(e.to_string()))?;
        report.rows_read += 1;
        if row.len() > width {
            return Err(ModelError::Csv(format!(
                "row {} has {} fields, header has {}",
                row_no + 1,
                row.len(),
                width
            )));
        }

        let mut cells = [""; REQUIRED_COLUMNS.len()];
        for (cell, &i) in cells.iter_mut().zip(idx.iter()) {
            *cell = row.get(i).unwrap_or("").trim();
        }
        if cells.iter().any(|c| NA_MARKERS.contains(c)) {
            report.rows_dropped += 1;
            debug!(row = row_no + 1, "dropping incomplete row");
            continue;
        }

        records.push(parse_row(&cells, row_no + 1)?);
    }

    if records.is_empty() {
        return Err(ModelError::EmptyDataset);
    }
    Ok((records, report))
}

// Cells arrive in REQUIRED_COLUMNS order.
fn parse_row(cells: &[&str; 12], row_no: usize) -> ModelResult<ListingRecord> {
    let int = |i: usize| parse_int(cells[i], REQUIRED_COLUMNS[i], row_no);
    let float = |i: usize| parse_float(cells[i], REQUIRED_COLUMNS[i], row_no);

    Ok(ListingRecord {
        features: FeatureVector {
            make: cells[0].to_string(),
            model: cells[1].to_string(),
            year: int(2)?,
            mileage_km: int(3)?,
            fuel_type: cells[4].to_string(),
            transmission: cells[5].to_string(),
            owner_count: int(6)?,
            location_city: cells[7].to_string(),
            engine_cc: int(8)?,
            power_bhp: float(9)?,
            seats: int(10)?,
        },
        price: float(11)?,
    })
}

fn parse_float(cell: &str, column: &str, row_no: usize) -> ModelResult<f64> {
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ModelError::Csv(format!("row {row_no}: `{column}` is not a number: {cell:?}")))
}

// Accepts `2018` as well as `2018.0`.
fn parse_int(cell: &str, column: &str, row_no: usize) -> ModelResult<i64> {
    if let Ok(v) = cell.parse::<i64>() {
        return Ok(v);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(ModelError::Csv(format!(
            "row {row_no}: `{column}` is not an integer: {cell:?}"
        ))),
    }
}

/// Shuffle and split rows into (train, test) partitions.
///
/// # Arguments
/// * `rows` - Full dataset
/// * `test_fraction` - Share reserved for evaluation; the held-out size is rounded up
/// * `seed` - Shuffle seed; the same seed on the same rows gives the same split
pub fn train_test_split<T: Clone>(rows: &[T], test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let n = rows.len();
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.min(n);

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let test = order[..n_test].iter().map(|&i| rows[i].clone()).collect();
    let train = order[n_test..].iter().map(|&i| rows[i].clone()).collect();
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "make,model,year,mileage_km,fuel_type,transmission,owner_count,location_city,engine_cc,power_bhp,seats,price";

    fn read(body: &str) -> ModelResult<(Vec<ListingRecord>, LoadReport)> {
        read_listings(body.as_bytes())
    }

    #[test]
    fn drops_rows_with_missing_fields() {
        let csv = format!(
            "{HEADER}\n\
             Honda,City,2019,30000,Petrol,Manual,1,Hyderabad,1497,119,5,950000\n\
             Maruti,Swift,2017,,Petrol,Manual,1,Pune,1197,82,5,450000\n\
             Hyundai,Creta,2020,20000,Diesel,Automatic,1,Delhi,1493,113.4,5,NaN\n\
             Tata,Nexon,2021,15000,Petrol,Manual,1,Mumbai,1199,118.3,5,800000\n"
        );
        let (rows, report) = read(&csv).unwrap();
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.rows_dropped, 2);
        assert_eq!(report.rows_kept(), 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].features.make, "Honda");
        assert_eq!(rows[1].features.power_bhp, 118.3);
    }

    #[test]
    fn column_order_and_extra_columns_are_irrelevant() {
        let csv = "id,price,seats,power_bhp,engine_cc,location_city,owner_count,transmission,fuel_type,mileage_km,year,model,make\n\
                   7,500000,5,88.5,1197,Chennai,2,Manual,Petrol,52000,2016.0,i20,Hyundai\n";
        let (rows, _) = read(csv).unwrap();
        let f = &rows[0].features;
        assert_eq!(f.make, "Hyundai");
        assert_eq!(f.year, 2016);
        assert_eq!(f.owner_count, 2);
        assert_eq!(rows[0].price, 500000.0);
    }

    #[test]
    fn short_rows_count_as_incomplete() {
        let csv = format!(
            "{HEADER}\n\
             Honda,City,2019,30000,Petrol,Manual,1,Hyderabad,1497,119,5,950000\n\
             Honda,City,2019\n"
        );
        let (rows, report) = read(&csv).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(report.rows_dropped, 1);
    }

    #[test]
    fn missing_header_column_is_fatal() {
        let csv = "make,model,year\nHonda,City,2019\n";
        let err = read(csv).unwrap_err();
        assert!(matches!(err, ModelError::MissingColumn(ref c) if c == "mileage_km"));
    }

    #[test]
    fn unparsable_number_is_fatal() {
        let csv = format!("{HEADER}\nHonda,City,twenty,30000,Petrol,Manual,1,Hyderabad,1497,119,5,950000\n");
        let err = read(&csv).unwrap_err();
        assert!(matches!(err, ModelError::Csv(ref m) if m.contains("year")));
    }

    #[test]
    fn all_rows_dropped_is_empty_dataset() {
        let csv = format!("{HEADER}\nHonda,,2019,30000,Petrol,Manual,1,Hyderabad,1497,119,5,950000\n");
        assert!(matches!(read(&csv), Err(ModelError::EmptyDataset)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_listings(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn split_sizes_and_determinism() {
        let rows: Vec<u32> = (0..101).collect();
        let (train, test) = train_test_split(&rows, 0.2, 42);
        assert_eq!(test.len(), 21);
        assert_eq!(train.len(), 80);

        let (train2, test2) = train_test_split(&rows, 0.2, 42);
        assert_eq!(train, train2);
        assert_eq!(test, test2);

        let mut all: Vec<u32> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, rows);
    }
}
