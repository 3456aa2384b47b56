/// Running sums of a set of target values.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TargetStats {
    pub count: usize,
    pub sum: f64,
    pub sum_sq: f64,
}

impl TargetStats {
    pub fn from_values(ys: impl Iterator<Item = f64>) -> Self {
        let mut stats = Self::default();
        for y in ys {
            stats.push(y);
        }
        stats
    }

    pub fn push(&mut self, y: f64) {
        self.count += 1;
        self.sum += y;
        self.sum_sq += y * y;
    }

    /// Stats of the values in `self` that are not in `part`.
    pub fn minus(&self, part: &TargetStats) -> Self {
        Self {
            count: self.count - part.count,
            sum: self.sum - part.sum,
            sum_sq: self.sum_sq - part.sum_sq,
        }
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Node impurity measure used to score candidate splits.
pub trait Criterion: Send + Sync + Clone {
    fn calculate(&self, stats: &TargetStats) -> f64;
}

/// Mean squared error around the node mean, i.e. the target variance.
#[derive(Debug, Clone)]
pub struct Mse;

impl Criterion for Mse {
    fn calculate(&self, stats: &TargetStats) -> f64 {
        if stats.count == 0 {
            return 0.0;
        }
        let n = stats.count as f64;
        let mean = stats.sum / n;
        (stats.sum_sq / n - mean * mean).max(0.0)
    }
}
