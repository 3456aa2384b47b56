use std::iter::once;
use std::ops::Range;

use ordered_float::OrderedFloat;
use rand::prelude::SliceRandom;
use rand::Rng;

use crate::median;

/// A view over column-major data. The last column is the target.
///
/// Rows are addressed through `row_index[row_range]`, so splitting and
/// resampling only shuffle indices and never copy the columns.
#[derive(Debug, Clone)]
pub struct Table<'a> {
    pub row_index: Vec<usize>,
    pub row_range: Range<usize>,
    pub columns: &'a [Vec<f64>],
}

impl<'a> Table<'a> {
    /// Feature values of each row, without the target.
    pub fn rows<'b>(&'b self) -> impl 'b + Iterator<Item = Vec<f64>> + Clone {
        self.row_indices().map(move |i| {
            (0..self.features_len()).map(|j| self.columns[j][i]).collect()
        })
    }

    pub fn train_test_split<R: Rng + ?Sized>(
        mut self,
        rng: &mut R,
        test_rate: f64,
    ) -> (Self, Self) {
        (&mut self.row_index[self.row_range.start..self.row_range.end]).shuffle(rng);
        let test_num = (self.rows_len() as f64 * test_rate).ceil() as usize;
        let test_num = test_num.min(self.rows_len());

        let mut train = self.clone();
        let mut test = self;
        test.row_range.end = test.row_range.start + test_num;
        train.row_range.start = test.row_range.end;

        (train, test)
    }

    pub fn target<'b>(&'b self) -> impl 'b + Iterator<Item = f64> + Clone {
        self.column(self.columns.len() - 1)
    }

    pub fn column<'b>(&'b self, column_index: usize) -> impl 'b + Iterator<Item = f64> + Clone {
        self.row_indices().map(move |i| self.columns[column_index][i])
    }

    pub fn features_len(&self) -> usize {
        self.columns.len() - 1
    }

    pub fn rows_len(&self) -> usize {
        self.row_range.end - self.row_range.start
    }

    fn row_indices<'b>(&'b self) -> impl 'b + Iterator<Item = usize> + Clone {
        self.row_index[self.row_range.start..self.row_range.end].iter().copied()
    }

    pub fn sort_rows_by_column(&mut self, column: usize) {
        let columns = &self.columns;
        (&mut self.row_index[self.row_range.start..self.row_range.end])
            .sort_by_key(|&x| OrderedFloat(columns[column][x]))
    }

    pub fn bootstrap_sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        max_samples: usize,
    ) -> Self {
        let samples = std::cmp::min(max_samples, self.rows_len());
        let row_index = (0..samples)
            .map(|_| self.row_index[rng.gen_range(self.row_range.start..self.row_range.end)])
            .collect::<Vec<_>>();
        let row_range = Range { start: 0, end: samples };

        Self {
            row_index,
            row_range,
            columns: self.columns,
        }
    }

    /// Candidate splits of a column as `(left_rows, threshold)` pairs.
    ///
    /// `left_rows` counts the rows that fall at or below `threshold`, which
    /// sits halfway between two consecutive distinct values. Rows must be
    /// sorted by `column_index` first.
    pub fn split_points<'b>(
        &'b self,
        column_index: usize,
    ) -> impl 'b + Iterator<Item = (usize, f64)> {
        let column = &self.columns[column_index];
        self.row_indices()
            .map(move |i| column[i])
            .enumerate()
            .scan(None, move |prev: &mut Option<f64>, (i, x)| {
                let split = match *prev {
                    Some(y) if (x - y).abs() > f64::EPSILON => Some((i, (x + y) / 2.0)),
                    _ => None,
                };
                *prev = Some(x);
                Some(split)
            })
            .flatten()
    }

    pub fn with_split<F, T>(&mut self, row: usize, mut f: F) -> (T, T)
        where
            F: FnMut(&mut Self) -> T,
    {
        let row = row + self.row_range.start;
        let original = self.row_range.clone();

        self.row_range.end = row;
        let left = f(self);
        self.row_range.end = original.end;

        self.row_range.start = row;
        let right = f(self);
        self.row_range.start = original.start;

        (left, right)
    }
}

#[derive(Debug, Default)]
pub struct TableBuilder {
    pub columns: Vec<Vec<f64>>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    pub fn add_row(&mut self, features: &[f64], target: f64) -> Result<(), TableError> {
        if self.columns.is_empty() {
            self.columns = vec![Vec::new(); features.len() + 1];
        }

        if self.columns.len() != features.len() + 1 {
            Err(TableError::ColumnSizeMismatch)?
        }

        if !target.is_finite() {
            Err(TableError::NonFiniteTarget)?
        }

        let column_data = self.columns
            .iter_mut()
            .zip(features.iter().copied().chain(once(target)));

        for (column, value) in column_data {
            column.push(value);
        }

        Ok(())
    }

    /// Replaces non-finite feature values with the median of the finite
    /// values in the same column (0 when the column has none).
    ///
    /// Returns the fill value of every feature column.
    pub fn impute_undefined(&mut self) -> Vec<f64> {
        let features = self.columns.len().saturating_sub(1);
        self.columns[..features]
            .iter_mut()
            .map(|column| {
                let fill = median(column.iter().copied().filter(|v| v.is_finite())).unwrap_or(0.0);
                for value in column.iter_mut().filter(|v| !v.is_finite()) {
                    *value = fill;
                }
                fill
            })
            .collect()
    }

    pub fn build(&self) -> Result<Table, TableError> {
        if self.columns.is_empty() || self.columns[0].is_empty() {
            Err(TableError::EmptyTable)?
        }

        let rows_len = self.columns[0].len();

        Ok(Table {
            row_index: (0..rows_len).collect(),
            row_range: Range { start: 0, end: rows_len, },
            columns: &self.columns,
        })
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Table must have at least one column and one row")]
    EmptyTable,

    #[error("Some of rows have a different column count from others")]
    ColumnSizeMismatch,

    #[error("Target column contains non finite numbers")]
    NonFiniteTarget,
}
