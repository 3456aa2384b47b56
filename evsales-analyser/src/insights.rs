use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::VehicleRecord;
use crate::round_to;

const TOP_MANUFACTURERS: usize = 10;
const TOP_COUNTRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySeries {
    pub years: Vec<i32>,
    pub avg_units: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSeries<T> {
    pub labels: Vec<String>,
    pub values: Vec<T>,
}

impl<T> LabeledSeries<T> {
    fn from_pairs(pairs: Vec<(String, T)>) -> Self {
        let (labels, values) = pairs.into_iter().unzip();
        Self { labels, values }
    }
}

/// Aggregates shown on the dashboard charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub yearly_sales: YearlySeries,
    pub top_manufacturers: LabeledSeries<i64>,
    pub charging_type: LabeledSeries<i64>,
    pub country_sales: LabeledSeries<i64>,
    pub charging_time: LabeledSeries<f64>,
}

/// Year-sorted average units sold of one manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandSeries {
    pub years: Vec<i32>,
    pub units: Vec<i64>,
}

pub fn insights(records: &[VehicleRecord]) -> Result<Insights, InsightError> {
    if records.is_empty() {
        Err(InsightError::EmptyDataset)?
    }

    let yearly = yearly_average(records.iter());
    let yearly_sales = YearlySeries {
        years: yearly.keys().copied().collect(),
        avg_units: yearly.values().map(|v| round_units(*v)).collect(),
    };

    let mut totals = group_by(records, |r| &r.manufacturer, |r| r.units_sold as f64)
        .into_iter()
        .map(|(label, values)| (label, values.iter().sum::<f64>()))
        .collect::<Vec<_>>();
    sort_descending(&mut totals);
    totals.truncate(TOP_MANUFACTURERS);

    let mut charging = group_mean(records, |r| &r.charging_type, |r| r.units_sold as f64)
        .into_iter()
        .map(|(label, mean)| (label, round_units(mean) as f64))
        .collect::<Vec<_>>();
    sort_descending(&mut charging);

    let mut country = group_mean(records, |r| &r.country_of_manufacture, |r| r.units_sold as f64);
    sort_descending(&mut country);
    country.truncate(TOP_COUNTRIES);

    let mut charge_time = group_mean(records, |r| &r.charging_type, |r| r.charge_time_hr)
        .into_iter()
        .map(|(label, mean)| (label, round_to(mean, 2)))
        .collect::<Vec<_>>();
    sort_descending(&mut charge_time);

    Ok(Insights {
        yearly_sales,
        top_manufacturers: LabeledSeries::from_pairs(into_units(totals)),
        charging_type: LabeledSeries::from_pairs(into_units(charging)),
        country_sales: LabeledSeries::from_pairs(into_units(country)),
        charging_time: LabeledSeries::from_pairs(charge_time),
    })
}

/// `None` when the manufacturer has no rows.
pub fn brand_yearly(records: &[VehicleRecord], manufacturer: &str) -> Option<BrandSeries> {
    let yearly = yearly_average(records.iter().filter(|r| r.manufacturer == manufacturer));
    if yearly.is_empty() {
        return None;
    }

    Some(BrandSeries {
        years: yearly.keys().copied().collect(),
        units: yearly.values().map(|v| round_units(*v)).collect(),
    })
}

fn yearly_average<'a>(records: impl Iterator<Item = &'a VehicleRecord>) -> BTreeMap<i32, f64> {
    let mut groups: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for record in records {
        groups.entry(record.year).or_default().push(record.units_sold as f64);
    }

    groups
        .into_iter()
        .map(|(year, values)| (year, crate::mean(values.into_iter())))
        .collect()
}

fn group_by<K, V>(records: &[VehicleRecord], key: K, value: V) -> BTreeMap<String, Vec<f64>>
where
    K: Fn(&VehicleRecord) -> &String,
    V: Fn(&VehicleRecord) -> f64,
{
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record).clone()).or_default().push(value(record));
    }
    groups
}

fn group_mean<K, V>(records: &[VehicleRecord], key: K, value: V) -> Vec<(String, f64)>
where
    K: Fn(&VehicleRecord) -> &String,
    V: Fn(&VehicleRecord) -> f64,
{
    group_by(records, key, value)
        .into_iter()
        .map(|(label, values)| (label, crate::mean(values.into_iter())))
        .collect()
}

/// Descending by value; the input comes label-ascending from a `BTreeMap`
/// and the sort is stable, so ties stay label-ascending.
fn sort_descending(pairs: &mut [(String, f64)]) {
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
}

fn round_units(value: f64) -> i64 {
    value.round_ties_even() as i64
}

fn into_units(pairs: Vec<(String, f64)>) -> Vec<(String, i64)> {
    pairs
        .into_iter()
        .map(|(label, value)| (label, round_units(value)))
        .collect()
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InsightError {
    #[error("No records to aggregate")]
    EmptyDataset,
}
