use std::num::NonZeroUsize;

use rand::{random, Rng, SeedableRng};
use rand::rngs::StdRng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::criterion::Criterion;
use crate::decision_tree::{DecisionTree, DecisionTreeOptions};
use crate::mean;
use crate::table::Table;

/// Anything that maps a feature vector to a predicted target.
pub trait Regressor: Send + Sync {
    fn predict(&self, xs: &[f64]) -> f64;
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    pub forest: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn predict_individuals<'a>(
        &'a self,
        xs: &'a [f64],
    ) -> impl 'a + Iterator<Item = f64> {
        self.forest.iter().map(move |tree| tree.predict(xs))
    }

    pub fn trees(&self) -> usize {
        self.forest.len()
    }
}

impl Regressor for RandomForest {
    fn predict(&self, xs: &[f64]) -> f64 {
        mean(self.predict_individuals(xs))
    }
}

/// Bagged regression trees.
///
/// Every tree gets its own RNG derived from `seed`, so a parallel fit
/// produces the same forest as a sequential one.
#[derive(Debug, Clone)]
pub struct RandomForestBuilder {
    pub trees: NonZeroUsize,
    pub max_depth: Option<NonZeroUsize>,
    /// Features tried at each split; all of them when unset.
    pub max_features: Option<NonZeroUsize>,
    pub max_samples: Option<NonZeroUsize>,
    pub seed: Option<u64>,
    pub parallel: bool,
}

impl RandomForestBuilder {
    pub fn fit<T: Criterion>(
        &self,
        criterion: T,
        table: Table,
    ) -> RandomForest {
        let forest = if self.parallel {
            self.tree_rngs()
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|mut rng| self.tree_fit(&mut rng, criterion.clone(), &table))
                .collect::<Vec<_>>()
        } else {
            self.tree_rngs()
                .map(|mut rng| self.tree_fit(&mut rng, criterion.clone(), &table))
                .collect::<Vec<_>>()
        };

        tracing::debug!("fitted {} trees on {} rows", forest.len(), table.rows_len());

        RandomForest { forest }
    }

    fn tree_fit<R: Rng + ?Sized, T: Criterion>(
        &self,
        rng: &mut R,
        criterion: T,
        table: &Table,
    ) -> DecisionTree {
        let max_samples = self.max_samples.map_or(table.rows_len(), |n| n.get());
        let table = table.bootstrap_sample(rng, max_samples);
        let defaults = DecisionTreeOptions::default();
        DecisionTree::fit(rng, criterion, table, DecisionTreeOptions {
            max_features: self.max_features.map(|n| n.get()),
            max_depth: self.max_depth.map_or(defaults.max_depth, |n| n.get()),
            ..defaults
        })
    }

    fn tree_rngs(&self) -> impl Iterator<Item = StdRng> {
        let seed_u64 = self.seed.unwrap_or_else(random);
        let mut seed = [0u8; 32];
        (&mut seed[0..8]).copy_from_slice(&seed_u64.to_be_bytes()[..]);
        let mut rng = StdRng::from_seed(seed);
        (0..self.trees.get()).map(move |_| {
            let mut seed = [0u8; 32];
            rng.fill(&mut seed);
            StdRng::from_seed(seed)
        })
    }
}

impl Default for RandomForestBuilder {
    fn default() -> Self {
        Self {
            trees: NonZeroUsize::new(100).unwrap(),
            max_depth: None,
            max_features: None,
            max_samples: None,
            seed: None,
            parallel: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use crate::criterion::Mse;
    use crate::table::TableBuilder;

    use super::*;

    fn linear_table() -> Result<TableBuilder, Box<dyn Error>> {
        let mut table_builder = TableBuilder::new();
        for x in 0..200 {
            let x = x as f64;
            table_builder.add_row(&[x, (x * 0.37).sin()], 3.0 * x + 5.0)?;
        }
        Ok(table_builder)
    }

    #[test]
    fn test_random_forest_regressor() -> Result<(), Box<dyn Error>> {
        let table_builder = linear_table()?;
        let table = table_builder.build()?;

        let regressor = RandomForestBuilder {
            trees: NonZeroUsize::new(30).unwrap(),
            seed: Some(0),
            parallel: true,
            ..Default::default()
        }
            .fit(Mse, table);

        assert_eq!(regressor.trees(), 30);
        let prediction = regressor.predict(&[100.0, (100.0f64 * 0.37).sin()]);
        assert!((prediction - 305.0).abs() < 15.0, "prediction {prediction}");

        Ok(())
    }

    #[test]
    fn test_parallel_matches_sequential() -> Result<(), Box<dyn Error>> {
        let table_builder = linear_table()?;
        let builder = RandomForestBuilder {
            trees: NonZeroUsize::new(10).unwrap(),
            max_depth: NonZeroUsize::new(12),
            seed: Some(42),
            ..Default::default()
        };

        let sequential = builder.fit(Mse, table_builder.build()?);
        let parallel = RandomForestBuilder { parallel: true, ..builder.clone() }.fit(Mse, table_builder.build()?);

        for x in [0.0, 17.0, 123.0, 199.0] {
            assert_eq!(sequential.predict(&[x, 0.0]), parallel.predict(&[x, 0.0]));
        }

        Ok(())
    }

    #[test]
    fn test_max_depth_is_applied() -> Result<(), Box<dyn Error>> {
        let table_builder = linear_table()?;
        let regressor = RandomForestBuilder {
            trees: NonZeroUsize::new(5).unwrap(),
            max_depth: NonZeroUsize::new(2),
            seed: Some(1),
            ..Default::default()
        }
            .fit(Mse, table_builder.build()?);

        assert!(regressor.forest.iter().all(|tree| tree.depth() <= 2));

        Ok(())
    }
}
