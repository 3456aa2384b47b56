use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::record::{CategoricalColumn, VehicleRecord};

/// Dense integer codes for the distinct values of one categorical column.
///
/// Codes follow the lexicographic order of the values seen at fit time, so
/// fitting the same set of values always yields the same mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let classes = values
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect();

        Self { classes }
    }

    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
    }

    pub fn inverse_transform(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// One [`LabelEncoder`] per encoded categorical column, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoding {
    columns: BTreeMap<String, LabelEncoder>,
}

impl CategoricalEncoding {
    pub fn fit(records: &[VehicleRecord]) -> Self {
        let columns = CategoricalColumn::ENCODED
            .iter()
            .map(|&column| {
                let encoder = LabelEncoder::fit(records.iter().map(|r| r.categorical(column)));
                (column.name().to_string(), encoder)
            })
            .collect();

        Self { columns }
    }

    pub fn encoder(&self, column: CategoricalColumn) -> Result<&LabelEncoder, EncodeError> {
        self.columns
            .get(column.name())
            .ok_or_else(|| EncodeError::MissingColumn(column.name().to_string()))
    }

    pub fn encode(&self, column: CategoricalColumn, value: &str) -> Result<usize, EncodeError> {
        self.encoder(column)?
            .transform(value)
            .ok_or_else(|| EncodeError::UnknownValue {
                column: column.name().to_string(),
                value: value.to_string(),
            })
    }

    pub fn decode(&self, column: CategoricalColumn, code: usize) -> Result<&str, EncodeError> {
        self.encoder(column)?
            .inverse_transform(code)
            .ok_or_else(|| EncodeError::UnknownCode {
                column: column.name().to_string(),
                code,
            })
    }

    /// Encodes the categorical features of a record in [`CategoricalColumn::ENCODED`] order.
    pub fn encode_record(&self, record: &VehicleRecord) -> Result<[f64; 4], EncodeError> {
        let mut codes = [0.0; 4];
        for (slot, &column) in codes.iter_mut().zip(CategoricalColumn::ENCODED.iter()) {
            *slot = self.encode(column, record.categorical(column))? as f64;
        }

        Ok(codes)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), EncodeError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| EncodeError::Artifact(e.to_string()))?;
        fs::write(path, json).map_err(|e| EncodeError::Artifact(e.to_string()))?;

        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EncodeError> {
        let json = fs::read_to_string(path).map_err(|e| EncodeError::Artifact(e.to_string()))?;
        let encoding: Self = serde_json::from_str(&json).map_err(|e| EncodeError::Artifact(e.to_string()))?;

        for column in CategoricalColumn::ENCODED {
            let classes = encoding.encoder(column)?.classes();
            if !classes.windows(2).all(|w| w[0] < w[1]) {
                Err(EncodeError::Artifact(format!(
                    "classes of column {} are not sorted and unique",
                    column.name()
                )))?
            }
        }

        Ok(encoding)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Encoding has no mapping for column {0}")]
    MissingColumn(String),

    #[error("Value {value:?} was not seen when fitting column {column}")]
    UnknownValue { column: String, value: String },

    #[error("Code {code} is out of range for column {column}")]
    UnknownCode { column: String, code: usize },

    #[error("Encoding artifact error: {0}")]
    Artifact(String),
}
