use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::random_forest::Regressor;
use crate::record::VehicleRecord;
use crate::trainer::{FeatureFrame, YEAR_FEATURE};

/// Years averaged for the historical baseline and the year being forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub history_start: i32,
    pub history_end: i32,
    pub target_year: i32,
}

impl ForecastWindow {
    pub fn contains(&self, year: i32) -> bool {
        (self.history_start..=self.history_end).contains(&year)
    }
}

impl Default for ForecastWindow {
    fn default() -> Self {
        Self {
            history_start: 2015,
            history_end: 2025,
            target_year: 2026,
        }
    }
}

/// Historical and forecast sales of one manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerMetric {
    #[serde(rename = "Manufacturer")]
    pub manufacturer: String,
    #[serde(rename = "Avg_2015_25")]
    pub historical_average: f64,
    #[serde(rename = "Predicted_2026")]
    pub predicted_average: f64,
    #[serde(rename = "Change")]
    pub change: f64,
    #[serde(rename = "Change_pct")]
    pub change_pct: f64,
}

impl ManufacturerMetric {
    pub fn new(manufacturer: String, historical_average: f64, predicted_average: f64) -> Self {
        let change = predicted_average - historical_average;
        let change_pct = if historical_average != 0.0 {
            change / historical_average * 100.0
        } else {
            0.0
        };

        Self {
            manufacturer,
            historical_average,
            predicted_average,
            change,
            change_pct,
        }
    }
}

/// Mean units sold per manufacturer over rows inside the history window.
pub fn historical_averages(records: &[VehicleRecord], window: &ForecastWindow) -> BTreeMap<String, f64> {
    group_mean(
        records
            .iter()
            .filter(|r| window.contains(r.year))
            .map(|r| (r.manufacturer.as_str(), r.units_sold as f64)),
    )
}

/// Mean prediction per manufacturer with every row's year moved to the
/// target year. Everything else about the row stays as observed.
pub fn forecast_averages<M: Regressor + ?Sized>(
    model: &M,
    frame: &FeatureFrame,
    records: &[VehicleRecord],
    window: &ForecastWindow,
) -> BTreeMap<String, f64> {
    group_mean(records.iter().enumerate().map(|(i, record)| {
        let mut xs = frame.row(i);
        xs[YEAR_FEATURE] = window.target_year as f64;
        (record.manufacturer.as_str(), model.predict(&xs))
    }))
}

/// One metric per manufacturer present in `records`, sorted by name.
///
/// Manufacturers without rows in the history window get a zero baseline.
pub fn forecast<M: Regressor + ?Sized>(
    model: &M,
    frame: &FeatureFrame,
    records: &[VehicleRecord],
    window: &ForecastWindow,
) -> Vec<ManufacturerMetric> {
    let historical = historical_averages(records, window);
    let predicted = forecast_averages(model, frame, records, window);

    let without_history = predicted.keys().filter(|m| !historical.contains_key(*m)).count();
    if without_history > 0 {
        tracing::debug!("{without_history} manufacturers have no sales in the history window");
    }

    predicted
        .into_iter()
        .map(|(manufacturer, predicted_average)| {
            let historical_average = historical.get(&manufacturer).copied().unwrap_or(0.0);
            ManufacturerMetric::new(manufacturer, historical_average, predicted_average)
        })
        .collect()
}

fn group_mean<'a>(pairs: impl Iterator<Item = (&'a str, f64)>) -> BTreeMap<String, f64> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (key, value) in pairs {
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(key, (sum, count))| (key.to_string(), sum / count as f64))
        .collect()
}
