use rand::Rng;
use rand::seq::SliceRandom;

use crate::criterion::{Criterion, TargetStats};
use crate::table::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct SplitPoint {
    pub column: usize,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(f64),
    Children {
        split: SplitPoint,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn predict(&self, xs: &[f64]) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Children { split, left, right } => {
                if xs[split.column] <= split.threshold {
                    left.predict(xs)
                } else {
                    right.predict(xs)
                }
            },
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Children { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

#[derive(Debug)]
pub struct NodeBuilder<R, T> {
    pub rng: R,
    pub max_features: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub criterion: T,
}

impl<R: Rng, T: Criterion> NodeBuilder<R, T> {
    pub fn build(&mut self, table: &mut Table, depth: usize) -> Node {
        let stats = TargetStats::from_values(table.target());
        let impurity = self.criterion.calculate(&stats);
        if table.rows_len() < self.min_samples_split || depth > self.max_depth || impurity <= 0.0 {
            return Node::Leaf(stats.mean());
        }

        let valid_columns = (0..table.features_len())
            .filter(|&i| !table.column(i).any(|f| f.is_nan()))
            .collect::<Vec<_>>();
        let max_features = std::cmp::min(valid_columns.len(), self.max_features);
        let candidates = valid_columns
            .choose_multiple(&mut self.rng, max_features)
            .copied()
            .collect::<Vec<_>>();

        let n = table.rows_len() as f64;
        let mut best_split: Option<SplitPoint> = None;
        let mut best_information_gain = f64::MIN;
        for column in candidates {
            table.sort_rows_by_column(column);
            let targets = table.target().collect::<Vec<_>>();

            let mut left = TargetStats::default();
            for (left_rows, threshold) in table.split_points(column) {
                while left.count < left_rows {
                    left.push(targets[left.count]);
                }
                let right = stats.minus(&left);

                let impurity_l = self.criterion.calculate(&left);
                let impurity_r = self.criterion.calculate(&right);
                let ratio_l = left.count as f64 / n;
                let ratio_r = 1.0 - ratio_l;

                let information_gain = impurity - (ratio_l * impurity_l + ratio_r * impurity_r);
                if best_information_gain < information_gain {
                    best_information_gain = information_gain;
                    best_split = Some(SplitPoint { column, threshold });
                }
            }
        }

        if let Some(split) = best_split {
            table.sort_rows_by_column(split.column);
            let split_row = table.column(split.column).take_while(|&f| f <= split.threshold).count();
            let (left, right) = table.with_split(split_row, |table| {
                Box::new(self.build(table, depth + 1))
            });

            Node::Children { split, left, right }
        } else {
            Node::Leaf(stats.mean())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::criterion::Mse;
    use crate::table::TableBuilder;

    use super::*;

    #[test]
    fn test_single_split() -> Result<(), Box<dyn Error>> {
        let mut table_builder = TableBuilder::new();
        for (x, y) in [(1.0, 10.0), (2.0, 10.0), (3.0, 30.0), (4.0, 30.0)] {
            table_builder.add_row(&[x], y)?;
        }
        let mut table = table_builder.build()?;

        let mut builder = NodeBuilder {
            rng: StdRng::seed_from_u64(0),
            max_features: 1,
            max_depth: 8,
            min_samples_split: 2,
            criterion: Mse,
        };
        let node = builder.build(&mut table, 1);

        assert_eq!(
            node,
            Node::Children {
                split: SplitPoint { column: 0, threshold: 2.5 },
                left: Box::new(Node::Leaf(10.0)),
                right: Box::new(Node::Leaf(30.0)),
            }
        );
        assert_eq!(node.predict(&[2.5]), 10.0);
        assert_eq!(node.predict(&[2.6]), 30.0);

        Ok(())
    }

    #[test]
    fn test_depth_limit() -> Result<(), Box<dyn Error>> {
        let mut table_builder = TableBuilder::new();
        for x in 0..64 {
            table_builder.add_row(&[x as f64], x as f64)?;
        }
        let mut table = table_builder.build()?;

        let mut builder = NodeBuilder {
            rng: StdRng::seed_from_u64(0),
            max_features: 1,
            max_depth: 3,
            min_samples_split: 2,
            criterion: Mse,
        };
        let node = builder.build(&mut table, 1);

        assert_eq!(node.depth(), 3);

        Ok(())
    }
}
