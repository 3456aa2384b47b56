use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::record::{CategoricalColumn, NumericColumn, VehicleRecord};
use crate::{mean, quantile};

const TOP_VALUES: usize = 5;

/// Distribution of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: &'static str,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    pub fn from_values(column: &'static str, values: impl Iterator<Item = f64>) -> Self {
        let mut sorted = values.filter(|v| !v.is_nan()).collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = mean(sorted.iter().copied());
        let std = if count > 1 {
            (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        Self {
            column,
            count,
            mean,
            std,
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q25: quantile(&sorted, 0.25),
            q50: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }
}

/// Most frequent values of one categorical column, most frequent first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCounts {
    pub column: &'static str,
    pub counts: Vec<(String, usize)>,
}

impl ValueCounts {
    pub fn from_values<'a>(column: &'static str, values: impl Iterator<Item = &'a str>, top: usize) -> Self {
        let mut tally: BTreeMap<&str, usize> = BTreeMap::new();
        for value in values {
            *tally.entry(value).or_default() += 1;
        }

        let mut counts = tally
            .into_iter()
            .map(|(value, count)| (value.to_string(), count))
            .collect::<Vec<_>>();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(top);

        Self { column, counts }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub numeric: Vec<ColumnSummary>,
    pub categorical: Vec<ValueCounts>,
}

pub fn describe(records: &[VehicleRecord]) -> DatasetSummary {
    let mut numeric = NumericColumn::ALL
        .iter()
        .map(|&column| ColumnSummary::from_values(column.name(), records.iter().map(|r| r.numeric(column))))
        .collect::<Vec<_>>();

    if records.iter().any(|r| r.derived.is_some()) {
        for (i, &name) in crate::features::DERIVED_COLUMNS.iter().enumerate() {
            let values = records.iter().filter_map(|r| r.derived).map(|d| d.values()[i]);
            numeric.push(ColumnSummary::from_values(name, values));
        }
    }

    let categorical = CategoricalColumn::ALL
        .iter()
        .map(|&column| ValueCounts::from_values(column.name(), records.iter().map(|r| r.categorical(column)), TOP_VALUES))
        .collect();

    DatasetSummary {
        rows: records.len(),
        numeric,
        categorical,
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {}", self.rows)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<32} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for s in &self.numeric {
            writeln!(
                f,
                "{:<32} {:>6} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
                s.column, s.count, s.mean, s.std, s.min, s.q25, s.q50, s.q75, s.max
            )?;
        }

        for values in &self.categorical {
            writeln!(f)?;
            writeln!(f, "Top values in {}:", values.column)?;
            for (value, count) in &values.counts {
                writeln!(f, "  {value:<30} {count:>6}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use crate::cleaner::clean;
    use crate::dataset::read_raw;

    use super::*;

    #[test]
    fn test_column_summary() {
        let summary = ColumnSummary::from_values("x", [4.0, 1.0, 3.0, 2.0].into_iter());
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, 2.5);
        assert!((summary.std - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.q25, 1.75);
        assert_eq!(summary.q50, 2.5);
        assert_eq!(summary.q75, 3.25);
        assert_eq!(summary.max, 4.0);
    }

    #[test]
    fn test_single_value_has_no_spread() {
        let summary = ColumnSummary::from_values("x", [7.0].into_iter());
        assert_eq!(summary.count, 1);
        assert!(summary.std.is_nan());
        assert_eq!(summary.q75, 7.0);
    }

    #[test]
    fn test_value_counts_order() {
        let counts = ValueCounts::from_values("c", ["b", "a", "b", "c", "a", "d"].into_iter(), 3);
        assert_eq!(counts.counts, vec![("a".to_string(), 2), ("b".to_string(), 2), ("c".to_string(), 1)]);
    }

    #[test]
    fn test_describe_fixture() -> Result<(), Box<dyn Error>> {
        let (records, _) = clean(read_raw("datasets/tests/ev_raw.csv")?)?;
        let summary = describe(&records);

        assert_eq!(summary.rows, records.len());
        assert_eq!(summary.numeric.len(), NumericColumn::ALL.len());
        assert!(summary.numeric.iter().all(|s| s.count == records.len()));
        assert_eq!(summary.categorical.len(), CategoricalColumn::ALL.len());
        assert!(summary.categorical.iter().all(|c| c.counts.len() <= TOP_VALUES));

        let rendered = summary.to_string();
        assert!(rendered.contains("Units_Sold_2024"));
        assert!(rendered.contains("Top values in Manufacturer:"));

        Ok(())
    }
}
