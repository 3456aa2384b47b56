use std::path::{Path, PathBuf};

use csv::{Reader, Writer};

use crate::cleaner::{self, CleanError};
use crate::record::{RawVehicleRecord, VehicleRecord, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};

pub const ID_COLUMN: &str = "Vehicle_ID";

#[derive(Debug)]
pub struct LoadedDataset {
    pub path: PathBuf,
    pub records: Vec<VehicleRecord>,
}

/// Reads every row of a dataset file without validating values.
///
/// The header must name every base column; derived columns are optional.
pub fn read_raw<P: AsRef<Path>>(path: P) -> Result<Vec<RawVehicleRecord>, DatasetError> {
    let mut rdr = Reader::from_path(path).map_err(|e| DatasetError::CSVError(e.to_string()))?;

    let headers = rdr.headers().map_err(|e| DatasetError::CSVError(e.to_string()))?;
    let missing = std::iter::once(ID_COLUMN)
        .chain(NUMERIC_COLUMNS)
        .chain(CATEGORICAL_COLUMNS)
        .filter(|column| !headers.iter().any(|h| h.trim() == *column))
        .map(String::from)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        Err(DatasetError::MissingColumns(missing))?
    }

    rdr.deserialize::<RawVehicleRecord>()
        .map(|row| row.map_err(|e| DatasetError::CSVError(e.to_string())))
        .collect()
}

/// Fills the gaps of an already cleaned file so it can feed the model.
///
/// Unlike [`cleaner::clean`] no rows are dropped: missing numeric cells take
/// the column median and missing categorical cells the column mode.
pub fn prepare(mut raw: Vec<RawVehicleRecord>) -> Result<Vec<VehicleRecord>, DatasetError> {
    if raw.is_empty() {
        Err(DatasetError::Empty)?
    }

    let imputed = cleaner::impute(&mut raw)?;
    if imputed.total() > 0 {
        tracing::warn!("imputed {} missing cells while loading dataset", imputed.total());
    }

    raw.into_iter()
        .map(|row| {
            row.into_record()
                .map_err(|column| DatasetError::Clean(CleanError::Unimputable(column.to_string())))
        })
        .collect()
}

/// Loads the first candidate that parses.
///
/// Candidates that are not files are skipped, and so are files that fail to
/// read or prepare. When nothing loads, the error lists every candidate,
/// followed by the failure for those that existed.
pub fn load_first<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedDataset, DatasetError> {
    let mut attempts = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let path = candidate.as_ref();
        if !path.is_file() {
            tracing::debug!("dataset candidate {} not found", path.display());
            attempts.push(path.display().to_string());
            continue;
        }

        match read_raw(path).and_then(prepare) {
            Ok(records) => {
                tracing::info!("loaded {} records from {}", records.len(), path.display());

                return Ok(LoadedDataset {
                    path: path.to_path_buf(),
                    records,
                });
            }
            Err(e) => {
                tracing::warn!("skipping dataset candidate {}: {}", path.display(), e);
                attempts.push(format!("{} ({e})", path.display()));
            }
        }
    }

    Err(DatasetError::NotFound(attempts))
}

pub fn write_records<P: AsRef<Path>>(path: P, records: &[VehicleRecord]) -> Result<(), DatasetError> {
    let mut wtr = Writer::from_path(path).map_err(|e| DatasetError::CSVError(e.to_string()))?;
    for record in records {
        wtr.serialize(record).map_err(|e| DatasetError::CSVError(e.to_string()))?;
    }
    wtr.flush().map_err(|e| DatasetError::CSVError(e.to_string()))?;

    Ok(())
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("Could not find dataset. Checked: {}", .0.join(", "))]
    NotFound(Vec<String>),

    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Dataset contains no rows")]
    Empty,

    #[error(transparent)]
    Clean(#[from] CleanError),

    #[error("Internal csv related error: {0}")]
    CSVError(String),
}
