use serde::{Deserialize, Serialize};

use crate::record::VehicleRecord;

pub const DERIVED_COLUMNS: [&str; 3] = [
    "Battery_Efficiency_km_per_kWh",
    "Charging_Efficiency_km_per_hr",
    "Battery_Capacity_per_Hour",
];

/// Ratios computed from a record's own battery, range and charging columns.
///
/// A ratio that does not evaluate to a finite number is stored as `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    /// Kilometres of range per kWh of capacity.
    pub battery_efficiency: f64,
    /// Kilometres of range gained per hour of charging.
    pub charging_efficiency: f64,
    /// kWh of capacity charged per hour.
    pub capacity_per_hour: f64,
}

impl DerivedFeatures {
    pub fn compute(record: &VehicleRecord) -> Self {
        Self {
            battery_efficiency: ratio(record.range_km, record.battery_capacity_kwh),
            charging_efficiency: ratio(record.range_km, record.charge_time_hr),
            capacity_per_hour: ratio(record.battery_capacity_kwh, record.charge_time_hr),
        }
    }

    pub fn values(&self) -> [f64; 3] {
        [self.battery_efficiency, self.charging_efficiency, self.capacity_per_hour]
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    let value = numerator / denominator;
    if value.is_finite() { value } else { f64::NAN }
}

/// Attaches derived features to every record that does not carry them yet.
///
/// Returns how many records were derived.
pub fn derive_features(records: &mut [VehicleRecord]) -> usize {
    let mut derived = 0;
    for record in records.iter_mut().filter(|r| r.derived.is_none()) {
        record.derived = Some(DerivedFeatures::compute(record));
        derived += 1;
    }

    if derived > 0 {
        let undefined = records
            .iter()
            .filter_map(|r| r.derived)
            .filter(|f| f.values().iter().any(|v| v.is_nan()))
            .count();
        if undefined > 0 {
            tracing::warn!("{undefined} records have undefined derived features");
        }
        tracing::debug!("derived features for {derived} records");
    }

    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(capacity: f64, range: f64, charge_time: f64) -> VehicleRecord {
        VehicleRecord {
            vehicle_id: "1".into(),
            manufacturer: "Acme".into(),
            model: "A1".into(),
            year: 2022,
            battery_capacity_kwh: capacity,
            range_km: range,
            charge_time_hr: charge_time,
            price_usd: 30000.0,
            co2_emissions_g_per_km: 0.0,
            safety_rating: 4.0,
            units_sold: 100,
            warranty_years: 8,
            battery_type: "Li-ion".into(),
            charging_type: "DC".into(),
            color: "Red".into(),
            country_of_manufacture: "USA".into(),
            autonomous_level: "2".into(),
            derived: None,
        }
    }

    #[test]
    fn test_compute_ratios() {
        let features = DerivedFeatures::compute(&record(50.0, 400.0, 8.0));
        assert_eq!(features.battery_efficiency, 8.0);
        assert_eq!(features.charging_efficiency, 50.0);
        assert_eq!(features.capacity_per_hour, 6.25);
    }

    #[test]
    fn test_zero_denominator_is_undefined() {
        let features = DerivedFeatures::compute(&record(0.0, 400.0, 0.0));
        assert!(features.battery_efficiency.is_nan());
        assert!(features.charging_efficiency.is_nan());
        assert!(features.capacity_per_hour.is_nan());
    }

    #[test]
    fn test_derive_is_idempotent() {
        let mut records = vec![record(50.0, 400.0, 8.0), record(80.0, 500.0, 10.0)];

        assert_eq!(derive_features(&mut records), 2);
        let first = records.iter().map(|r| r.derived).collect::<Vec<_>>();

        assert_eq!(derive_features(&mut records), 0);
        let second = records.iter().map(|r| r.derived).collect::<Vec<_>>();

        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_features_are_kept() {
        let existing = DerivedFeatures {
            battery_efficiency: 1.0,
            charging_efficiency: 2.0,
            capacity_per_hour: 3.0,
        };
        let mut records = vec![VehicleRecord {
            derived: Some(existing),
            ..record(50.0, 400.0, 8.0)
        }];

        derive_features(&mut records);
        assert_eq!(records[0].derived, Some(existing));
    }
}
