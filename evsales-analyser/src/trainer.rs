use std::num::NonZeroUsize;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::criterion::Mse;
use crate::encoder::{CategoricalEncoding, EncodeError};
use crate::features::DerivedFeatures;
use crate::random_forest::{RandomForest, RandomForestBuilder, Regressor};
use crate::record::VehicleRecord;
use crate::table::{Table, TableBuilder, TableError};

pub const FEATURE_NAMES: [&str; 14] = [
    "Year",
    "Battery_Capacity_kWh",
    "Range_km",
    "Charge_Time_hr",
    "Price_USD",
    "Safety_Rating",
    "Warranty_Years",
    "Battery_Efficiency_km_per_kWh",
    "Charging_Efficiency_km_per_hr",
    "Battery_Capacity_per_Hour",
    "Manufacturer",
    "Battery_Type",
    "Charging_Type",
    "Country_of_Manufacture",
];

/// Position of `Year` in a feature vector.
pub const YEAR_FEATURE: usize = 0;

pub const RANDOM_SEED: u64 = 42;
pub const MAX_DEPTH: usize = 12;
pub const TEST_RATE: f64 = 0.2;

/// Forest used by the offline report, fitted on the training split only.
pub fn holdout_forest() -> RandomForestBuilder {
    RandomForestBuilder {
        trees: NonZeroUsize::new(200).unwrap(),
        max_depth: NonZeroUsize::new(MAX_DEPTH),
        seed: Some(RANDOM_SEED),
        parallel: true,
        ..Default::default()
    }
}

/// Forest used when serving, fitted on every row.
pub fn serving_forest() -> RandomForestBuilder {
    RandomForestBuilder {
        trees: NonZeroUsize::new(100).unwrap(),
        ..holdout_forest()
    }
}

/// The numeric feature matrix and target built from a set of records.
///
/// Row `i` of the frame always corresponds to record `i`.
#[derive(Debug)]
pub struct FeatureFrame {
    builder: TableBuilder,
    fills: Vec<f64>,
}

impl FeatureFrame {
    pub fn build(records: &[VehicleRecord], encoding: &CategoricalEncoding) -> Result<Self, TrainError> {
        let mut builder = TableBuilder::new();
        for record in records {
            let features = feature_vector(record, encoding)?;
            builder.add_row(&features, record.units_sold as f64)?;
        }

        if builder.columns.is_empty() {
            Err(TableError::EmptyTable)?
        }

        let fills = builder.impute_undefined();

        Ok(Self { builder, fills })
    }

    pub fn rows_len(&self) -> usize {
        self.builder.columns.first().map_or(0, Vec::len)
    }

    pub fn row(&self, index: usize) -> Vec<f64> {
        self.builder.columns[..FEATURE_NAMES.len()]
            .iter()
            .map(|column| column[index])
            .collect()
    }

    pub fn target(&self, index: usize) -> f64 {
        self.builder.columns[FEATURE_NAMES.len()][index]
    }

    /// Values that replaced undefined features, one per feature column.
    pub fn fills(&self) -> &[f64] {
        &self.fills
    }

    pub fn table(&self) -> Result<Table, TrainError> {
        Ok(self.builder.build()?)
    }
}

/// Builds the fourteen model inputs of a record, in [`FEATURE_NAMES`] order.
pub fn feature_vector(record: &VehicleRecord, encoding: &CategoricalEncoding) -> Result<Vec<f64>, TrainError> {
    let derived = record.derived.unwrap_or_else(|| DerivedFeatures::compute(record));
    let codes = encoding.encode_record(record)?;

    let mut features = Vec::with_capacity(FEATURE_NAMES.len());
    features.extend([
        record.year as f64,
        record.battery_capacity_kwh,
        record.range_km,
        record.charge_time_hr,
        record.price_usd,
        record.safety_rating,
        record.warranty_years as f64,
    ]);
    features.extend(derived.values());
    features.extend(codes);

    Ok(features)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub mae: f64,
    pub r2: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Splits the frame, fits on the training part and scores the held-out part.
pub fn train_with_holdout(
    frame: &FeatureFrame,
    forest: &RandomForestBuilder,
    test_rate: f64,
    seed: u64,
) -> Result<(RandomForest, Evaluation), TrainError> {
    if frame.rows_len() < 2 {
        Err(TrainError::NotEnoughRows(frame.rows_len()))?
    }

    let table = frame.table()?;
    let (train, test) = table.train_test_split(&mut StdRng::seed_from_u64(seed), test_rate);
    let train_rows = train.rows_len();
    tracing::info!(train = train_rows, test = test.rows_len(), trees = forest.trees.get(), "fitting forest");

    let model = forest.fit(Mse, train);

    let actual = test.target().collect::<Vec<_>>();
    let predicted = test.rows().map(|xs| model.predict(&xs)).collect::<Vec<_>>();
    let evaluation = Evaluation {
        mae: mean_absolute_error(&actual, &predicted),
        r2: r2_score(&actual, &predicted),
        train_rows,
        test_rows: actual.len(),
    };
    tracing::info!(mae = evaluation.mae, r2 = evaluation.r2, "held-out evaluation");

    Ok((model, evaluation))
}

/// Fits on every row of the frame. Used where all data should inform the
/// deployed prediction and no quality estimate is reported.
pub fn train_full(frame: &FeatureFrame, forest: &RandomForestBuilder) -> Result<RandomForest, TrainError> {
    let table = frame.table()?;
    tracing::info!(rows = table.rows_len(), trees = forest.trees.get(), "fitting forest on full dataset");

    Ok(forest.fit(Mse, table))
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    crate::mean(actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()))
}

/// Coefficient of determination. A constant target scores 1.0 when predicted
/// exactly and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let mean = crate::mean(actual.iter().copied());
    let ss_res = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum::<f64>();
    let ss_tot = actual.iter().map(|a| (a - mean).powi(2)).sum::<f64>();

    if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrainError {
    #[error("Need at least 2 rows to hold out a test split, got {0}")]
    NotEnoughRows(usize),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Table(#[from] TableError),
}
