use serde::{Deserialize, Serialize};

use crate::features::DerivedFeatures;

pub const NUMERIC_COLUMNS: [&str; 9] = [
    "Year",
    "Battery_Capacity_kWh",
    "Range_km",
    "Charge_Time_hr",
    "Price_USD",
    "CO2_Emissions_g_per_km",
    "Safety_Rating",
    "Units_Sold_2024",
    "Warranty_Years",
];

pub const CATEGORICAL_COLUMNS: [&str; 7] = [
    "Manufacturer",
    "Model",
    "Battery_Type",
    "Charging_Type",
    "Color",
    "Country_of_Manufacture",
    "Autonomous_Level",
];

pub const TARGET_COLUMN: &str = "Units_Sold_2024";

/// A vehicle row as it appears in a dataset file, before any validation.
///
/// Numeric cells that fail to parse are read as missing. The derived columns
/// are only present in files that already went through feature derivation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVehicleRecord {
    #[serde(rename = "Vehicle_ID")]
    pub vehicle_id: Option<String>,
    #[serde(rename = "Manufacturer")]
    pub manufacturer: Option<String>,
    #[serde(rename = "Model")]
    pub model: Option<String>,
    #[serde(rename = "Year", deserialize_with = "csv::invalid_option")]
    pub year: Option<f64>,
    #[serde(rename = "Battery_Capacity_kWh", deserialize_with = "csv::invalid_option")]
    pub battery_capacity_kwh: Option<f64>,
    #[serde(rename = "Range_km", deserialize_with = "csv::invalid_option")]
    pub range_km: Option<f64>,
    #[serde(rename = "Charge_Time_hr", deserialize_with = "csv::invalid_option")]
    pub charge_time_hr: Option<f64>,
    #[serde(rename = "Price_USD", deserialize_with = "csv::invalid_option")]
    pub price_usd: Option<f64>,
    #[serde(rename = "CO2_Emissions_g_per_km", deserialize_with = "csv::invalid_option")]
    pub co2_emissions_g_per_km: Option<f64>,
    #[serde(rename = "Safety_Rating", deserialize_with = "csv::invalid_option")]
    pub safety_rating: Option<f64>,
    #[serde(rename = "Units_Sold_2024", deserialize_with = "csv::invalid_option")]
    pub units_sold: Option<f64>,
    #[serde(rename = "Warranty_Years", deserialize_with = "csv::invalid_option")]
    pub warranty_years: Option<f64>,
    #[serde(rename = "Battery_Type")]
    pub battery_type: Option<String>,
    #[serde(rename = "Charging_Type")]
    pub charging_type: Option<String>,
    #[serde(rename = "Color")]
    pub color: Option<String>,
    #[serde(rename = "Country_of_Manufacture")]
    pub country_of_manufacture: Option<String>,
    #[serde(rename = "Autonomous_Level")]
    pub autonomous_level: Option<String>,
    #[serde(
        rename = "Battery_Efficiency_km_per_kWh",
        default,
        deserialize_with = "csv::invalid_option",
        skip_serializing
    )]
    pub battery_efficiency: Option<f64>,
    #[serde(
        rename = "Charging_Efficiency_km_per_hr",
        default,
        deserialize_with = "csv::invalid_option",
        skip_serializing
    )]
    pub charging_efficiency: Option<f64>,
    #[serde(
        rename = "Battery_Capacity_per_Hour",
        default,
        deserialize_with = "csv::invalid_option",
        skip_serializing
    )]
    pub capacity_per_hour: Option<f64>,
}

impl RawVehicleRecord {
    pub fn numeric(&self, column: NumericColumn) -> Option<f64> {
        match column {
            NumericColumn::Year => self.year,
            NumericColumn::BatteryCapacity => self.battery_capacity_kwh,
            NumericColumn::Range => self.range_km,
            NumericColumn::ChargeTime => self.charge_time_hr,
            NumericColumn::Price => self.price_usd,
            NumericColumn::Co2Emissions => self.co2_emissions_g_per_km,
            NumericColumn::SafetyRating => self.safety_rating,
            NumericColumn::UnitsSold => self.units_sold,
            NumericColumn::WarrantyYears => self.warranty_years,
        }
        .filter(|value| !value.is_nan())
    }

    pub fn numeric_mut(&mut self, column: NumericColumn) -> &mut Option<f64> {
        match column {
            NumericColumn::Year => &mut self.year,
            NumericColumn::BatteryCapacity => &mut self.battery_capacity_kwh,
            NumericColumn::Range => &mut self.range_km,
            NumericColumn::ChargeTime => &mut self.charge_time_hr,
            NumericColumn::Price => &mut self.price_usd,
            NumericColumn::Co2Emissions => &mut self.co2_emissions_g_per_km,
            NumericColumn::SafetyRating => &mut self.safety_rating,
            NumericColumn::UnitsSold => &mut self.units_sold,
            NumericColumn::WarrantyYears => &mut self.warranty_years,
        }
    }

    pub fn categorical(&self, column: CategoricalColumn) -> Option<&str> {
        match column {
            CategoricalColumn::Manufacturer => self.manufacturer.as_deref(),
            CategoricalColumn::Model => self.model.as_deref(),
            CategoricalColumn::BatteryType => self.battery_type.as_deref(),
            CategoricalColumn::ChargingType => self.charging_type.as_deref(),
            CategoricalColumn::Color => self.color.as_deref(),
            CategoricalColumn::CountryOfManufacture => self.country_of_manufacture.as_deref(),
            CategoricalColumn::AutonomousLevel => self.autonomous_level.as_deref(),
        }
    }

    pub fn categorical_mut(&mut self, column: CategoricalColumn) -> &mut Option<String> {
        match column {
            CategoricalColumn::Manufacturer => &mut self.manufacturer,
            CategoricalColumn::Model => &mut self.model,
            CategoricalColumn::BatteryType => &mut self.battery_type,
            CategoricalColumn::ChargingType => &mut self.charging_type,
            CategoricalColumn::Color => &mut self.color,
            CategoricalColumn::CountryOfManufacture => &mut self.country_of_manufacture,
            CategoricalColumn::AutonomousLevel => &mut self.autonomous_level,
        }
    }

    fn derived(&self) -> Option<DerivedFeatures> {
        Some(DerivedFeatures {
            battery_efficiency: self.battery_efficiency?,
            charging_efficiency: self.charging_efficiency?,
            capacity_per_hour: self.capacity_per_hour?,
        })
    }

    /// Converts a fully populated raw row into a typed record.
    ///
    /// Returns the first column that is still missing otherwise.
    pub fn into_record(self) -> Result<VehicleRecord, &'static str> {
        fn required<T>(value: Option<T>, column: &'static str) -> Result<T, &'static str> {
            value.ok_or(column)
        }

        let derived = self.derived();
        let year = required(self.numeric(NumericColumn::Year), "Year")?;
        let units_sold = required(self.numeric(NumericColumn::UnitsSold), "Units_Sold_2024")?;
        let warranty_years = required(self.numeric(NumericColumn::WarrantyYears), "Warranty_Years")?;

        Ok(VehicleRecord {
            battery_capacity_kwh: required(self.numeric(NumericColumn::BatteryCapacity), "Battery_Capacity_kWh")?,
            range_km: required(self.numeric(NumericColumn::Range), "Range_km")?,
            charge_time_hr: required(self.numeric(NumericColumn::ChargeTime), "Charge_Time_hr")?,
            price_usd: required(self.numeric(NumericColumn::Price), "Price_USD")?,
            co2_emissions_g_per_km: required(self.numeric(NumericColumn::Co2Emissions), "CO2_Emissions_g_per_km")?,
            safety_rating: required(self.numeric(NumericColumn::SafetyRating), "Safety_Rating")?,
            vehicle_id: self.vehicle_id.unwrap_or_default(),
            manufacturer: required(self.manufacturer, "Manufacturer")?,
            model: required(self.model, "Model")?,
            year: year as i32,
            units_sold: units_sold as i64,
            warranty_years: warranty_years as i32,
            battery_type: required(self.battery_type, "Battery_Type")?,
            charging_type: required(self.charging_type, "Charging_Type")?,
            color: required(self.color, "Color")?,
            country_of_manufacture: required(self.country_of_manufacture, "Country_of_Manufacture")?,
            autonomous_level: required(self.autonomous_level, "Autonomous_Level")?,
            derived,
        })
    }
}

/// A validated vehicle row. Every column the pipeline consumes is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    #[serde(rename = "Vehicle_ID")]
    pub vehicle_id: String,
    #[serde(rename = "Manufacturer")]
    pub manufacturer: String,
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Battery_Capacity_kWh")]
    pub battery_capacity_kwh: f64,
    #[serde(rename = "Range_km")]
    pub range_km: f64,
    #[serde(rename = "Charge_Time_hr")]
    pub charge_time_hr: f64,
    #[serde(rename = "Price_USD")]
    pub price_usd: f64,
    #[serde(rename = "CO2_Emissions_g_per_km")]
    pub co2_emissions_g_per_km: f64,
    #[serde(rename = "Safety_Rating")]
    pub safety_rating: f64,
    #[serde(rename = "Units_Sold_2024")]
    pub units_sold: i64,
    #[serde(rename = "Warranty_Years")]
    pub warranty_years: i32,
    #[serde(rename = "Battery_Type")]
    pub battery_type: String,
    #[serde(rename = "Charging_Type")]
    pub charging_type: String,
    #[serde(rename = "Color")]
    pub color: String,
    #[serde(rename = "Country_of_Manufacture")]
    pub country_of_manufacture: String,
    #[serde(rename = "Autonomous_Level")]
    pub autonomous_level: String,
    #[serde(skip)]
    pub derived: Option<DerivedFeatures>,
}

impl VehicleRecord {
    pub fn numeric(&self, column: NumericColumn) -> f64 {
        match column {
            NumericColumn::Year => self.year as f64,
            NumericColumn::BatteryCapacity => self.battery_capacity_kwh,
            NumericColumn::Range => self.range_km,
            NumericColumn::ChargeTime => self.charge_time_hr,
            NumericColumn::Price => self.price_usd,
            NumericColumn::Co2Emissions => self.co2_emissions_g_per_km,
            NumericColumn::SafetyRating => self.safety_rating,
            NumericColumn::UnitsSold => self.units_sold as f64,
            NumericColumn::WarrantyYears => self.warranty_years as f64,
        }
    }

    pub fn categorical(&self, column: CategoricalColumn) -> &str {
        match column {
            CategoricalColumn::Manufacturer => &self.manufacturer,
            CategoricalColumn::Model => &self.model,
            CategoricalColumn::BatteryType => &self.battery_type,
            CategoricalColumn::ChargingType => &self.charging_type,
            CategoricalColumn::Color => &self.color,
            CategoricalColumn::CountryOfManufacture => &self.country_of_manufacture,
            CategoricalColumn::AutonomousLevel => &self.autonomous_level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericColumn {
    Year,
    BatteryCapacity,
    Range,
    ChargeTime,
    Price,
    Co2Emissions,
    SafetyRating,
    UnitsSold,
    WarrantyYears,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 9] = [
        NumericColumn::Year,
        NumericColumn::BatteryCapacity,
        NumericColumn::Range,
        NumericColumn::ChargeTime,
        NumericColumn::Price,
        NumericColumn::Co2Emissions,
        NumericColumn::SafetyRating,
        NumericColumn::UnitsSold,
        NumericColumn::WarrantyYears,
    ];

    pub fn name(&self) -> &'static str {
        NUMERIC_COLUMNS[*self as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoricalColumn {
    Manufacturer,
    Model,
    BatteryType,
    ChargingType,
    Color,
    CountryOfManufacture,
    AutonomousLevel,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 7] = [
        CategoricalColumn::Manufacturer,
        CategoricalColumn::Model,
        CategoricalColumn::BatteryType,
        CategoricalColumn::ChargingType,
        CategoricalColumn::Color,
        CategoricalColumn::CountryOfManufacture,
        CategoricalColumn::AutonomousLevel,
    ];

    /// Columns that feed the regressor as label-encoded features.
    pub const ENCODED: [CategoricalColumn; 4] = [
        CategoricalColumn::Manufacturer,
        CategoricalColumn::BatteryType,
        CategoricalColumn::ChargingType,
        CategoricalColumn::CountryOfManufacture,
    ];

    pub fn name(&self) -> &'static str {
        CATEGORICAL_COLUMNS[*self as usize]
    }
}
