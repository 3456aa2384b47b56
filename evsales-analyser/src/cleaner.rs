use std::collections::{BTreeMap, HashSet};

use crate::median;
use crate::record::{CategoricalColumn, NumericColumn, RawVehicleRecord, VehicleRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImputationCounts {
    pub numeric: BTreeMap<&'static str, usize>,
    pub categorical: BTreeMap<&'static str, usize>,
}

impl ImputationCounts {
    pub fn total(&self) -> usize {
        self.numeric.values().chain(self.categorical.values()).sum()
    }
}

/// What a cleaning pass did to the dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub imputed: ImputationCounts,
    pub invalid_removed: usize,
    pub emissions_clipped: usize,
    pub output_rows: usize,
}

/// Runs the full cleaning pass over raw rows.
///
/// The steps run in a fixed order: deduplicate, impute, cast, drop invalid
/// rows, clip emissions. Imputation statistics are taken after
/// deduplication and the validity filter sees imputed values.
pub fn clean(raw: Vec<RawVehicleRecord>) -> Result<(Vec<VehicleRecord>, CleaningReport), CleanError> {
    let mut report = CleaningReport {
        input_rows: raw.len(),
        ..Default::default()
    };

    let (mut rows, duplicates) = drop_duplicates(raw);
    report.duplicates_removed = duplicates;

    report.imputed = impute(&mut rows)?;

    let records = rows
        .into_iter()
        .map(|row| row.into_record().map_err(|column| CleanError::Unimputable(column.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    let before = records.len();
    let mut records = records.into_iter().filter(is_valid).collect::<Vec<_>>();
    report.invalid_removed = before - records.len();

    for record in records.iter_mut() {
        if record.co2_emissions_g_per_km < 0.0 {
            record.co2_emissions_g_per_km = 0.0;
            report.emissions_clipped += 1;
        }
    }

    report.output_rows = records.len();
    tracing::info!(
        input = report.input_rows,
        duplicates = report.duplicates_removed,
        imputed = report.imputed.total(),
        invalid = report.invalid_removed,
        output = report.output_rows,
        "dataset cleaned"
    );

    Ok((records, report))
}

/// Keeps the first row for each identifier. Rows without an identifier share
/// the same (missing) key.
pub fn drop_duplicates(raw: Vec<RawVehicleRecord>) -> (Vec<RawVehicleRecord>, usize) {
    let mut seen = HashSet::new();
    let total = raw.len();
    let kept = raw
        .into_iter()
        .filter(|row| seen.insert(row.vehicle_id.clone()))
        .collect::<Vec<_>>();
    let removed = total - kept.len();

    (kept, removed)
}

/// Replaces missing numeric cells with the column median and missing
/// categorical cells with the column mode.
pub fn impute(rows: &mut [RawVehicleRecord]) -> Result<ImputationCounts, CleanError> {
    let mut counts = ImputationCounts::default();

    for column in NumericColumn::ALL {
        let missing = rows.iter().filter(|r| r.numeric(column).is_none()).count();
        if missing == 0 {
            continue;
        }

        let fill = median(rows.iter().filter_map(|r| r.numeric(column)))
            .ok_or_else(|| CleanError::Unimputable(column.name().to_string()))?;
        for row in rows.iter_mut().filter(|r| r.numeric(column).is_none()) {
            *row.numeric_mut(column) = Some(fill);
        }
        tracing::debug!("filled {missing} missing {} with median {fill}", column.name());
        counts.numeric.insert(column.name(), missing);
    }

    for column in CategoricalColumn::ALL {
        let missing = rows.iter().filter(|r| r.categorical(column).is_none()).count();
        if missing == 0 {
            continue;
        }

        let fill = mode(rows.iter().filter_map(|r| r.categorical(column)))
            .map(String::from)
            .ok_or_else(|| CleanError::Unimputable(column.name().to_string()))?;
        for row in rows.iter_mut().filter(|r| r.categorical(column).is_none()) {
            *row.categorical_mut(column) = Some(fill.clone());
        }
        tracing::debug!("filled {missing} missing {} with mode {fill:?}", column.name());
        counts.categorical.insert(column.name(), missing);
    }

    Ok(counts)
}

/// Most frequent value; ties go to the lexicographically smallest one.
pub fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0usize) += 1;
    }

    counts
        .into_iter()
        .fold(None, |best: Option<(&'a str, usize)>, (value, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value)
}

pub fn is_valid(record: &VehicleRecord) -> bool {
    record.battery_capacity_kwh > 0.0
        && record.range_km > 0.0
        && record.charge_time_hr > 0.0
        && record.price_usd > 0.0
        && (0.0..=5.0).contains(&record.safety_rating)
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CleanError {
    #[error("Column {0} has no values to impute from")]
    Unimputable(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::error::Error;

    use crate::dataset::read_raw;

    use super::*;

    fn cleaned_fixture() -> Result<(Vec<VehicleRecord>, CleaningReport), Box<dyn Error>> {
        Ok(clean(read_raw("datasets/tests/ev_raw.csv")?)?)
    }

    #[test]
    fn test_clean_report() -> Result<(), Box<dyn Error>> {
        let (records, report) = cleaned_fixture()?;

        assert_eq!(report.input_rows, 12);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.invalid_removed, 2);
        assert_eq!(report.emissions_clipped, 1);
        assert_eq!(report.output_rows, 9);
        assert_eq!(records.len(), 9);
        assert_eq!(report.imputed.numeric.get("Range_km"), Some(&1));
        assert_eq!(report.imputed.numeric.get("Price_USD"), Some(&1));
        assert_eq!(report.imputed.categorical.get("Manufacturer"), Some(&1));

        Ok(())
    }

    #[test]
    fn test_cleaned_rows_hold_constraints() -> Result<(), Box<dyn Error>> {
        let (records, _) = cleaned_fixture()?;

        let mut ids = HashSet::new();
        for record in &records {
            assert!(record.battery_capacity_kwh > 0.0);
            assert!(record.range_km > 0.0);
            assert!(record.charge_time_hr > 0.0);
            assert!(record.price_usd > 0.0);
            assert!((0.0..=5.0).contains(&record.safety_rating));
            assert!(record.co2_emissions_g_per_km >= 0.0);
            assert!(ids.insert(record.vehicle_id.clone()), "duplicate id {}", record.vehicle_id);
        }

        Ok(())
    }

    #[test]
    fn test_duplicates_keep_first() -> Result<(), Box<dyn Error>> {
        let (records, _) = cleaned_fixture()?;
        let byd = records.iter().find(|r| r.vehicle_id == "2").unwrap();
        assert_eq!(byd.model, "Atto 3");

        Ok(())
    }

    #[test]
    fn test_median_taken_after_dedup() -> Result<(), Box<dyn Error>> {
        let (records, _) = cleaned_fixture()?;
        let kona = records.iter().find(|r| r.model == "Kona").unwrap();

        // 480 if the duplicate row were still counted
        assert_eq!(kona.range_km, 490.0);
        // median 7.5 is truncated on cast
        assert_eq!(kona.warranty_years, 7);
        assert_eq!(kona.charging_type, "DC Fast");

        let ev6 = records.iter().find(|r| r.model == "EV6").unwrap();
        assert_eq!(ev6.price_usd, 39500.0);
        assert_eq!(ev6.co2_emissions_g_per_km, 0.0);

        let id4 = records.iter().find(|r| r.model == "ID.4").unwrap();
        assert_eq!(id4.manufacturer, "Tesla");

        Ok(())
    }

    #[test]
    fn test_mode_tie_break() {
        assert_eq!(mode(["b", "a", "b", "a"].into_iter()), Some("a"));
        assert_eq!(mode(["c", "b", "c"].into_iter()), Some("c"));
        assert_eq!(mode(std::iter::empty()), None);
    }

    #[test]
    fn test_unimputable_column() {
        let mut rows = vec![RawVehicleRecord::default(), RawVehicleRecord::default()];
        assert_eq!(impute(&mut rows), Err(CleanError::Unimputable("Year".to_string())));
    }

    #[test]
    fn test_safety_bound_is_inclusive() -> Result<(), Box<dyn Error>> {
        let (records, _) = cleaned_fixture()?;
        assert!(records.iter().any(|r| r.safety_rating == 5.0));
        assert!(records.iter().all(|r| r.model != "Seal"));
        assert!(records.iter().all(|r| r.model != "Ariya"));

        Ok(())
    }
}
