use rand::Rng;

use crate::criterion::Criterion;
use crate::node::{Node, NodeBuilder};
use crate::random_forest::Regressor;
use crate::table::Table;

#[derive(Debug, Clone)]
pub struct DecisionTreeOptions {
    pub max_features: Option<usize>,
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for DecisionTreeOptions {
    fn default() -> Self {
        Self {
            max_features: None,
            max_depth: 64,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    pub fn fit<R: Rng + ?Sized, T: Criterion>(
        rng: &mut R,
        criterion: T,
        mut table: Table,
        options: DecisionTreeOptions,
    ) -> Self {
        let max_features = options.max_features.unwrap_or_else(|| table.features_len());
        let mut builder = NodeBuilder {
            rng,
            max_features,
            max_depth: options.max_depth,
            min_samples_split: options.min_samples_split,
            criterion,
        };
        let root = builder.build(&mut table, 1);

        Self { root }
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}

impl Regressor for DecisionTree {
    fn predict(&self, xs: &[f64]) -> f64 {
        self.root.predict(xs)
    }
}
