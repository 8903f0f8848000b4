//! Principal component analysis of the observation matrix.
//! Offline aid for picking `--n-features`, never used when recommending.

use itertools::Itertools;
use nalgebra::DMatrix;

use crate::dataset::{self, Dataset};
use crate::error::Error;
use crate::opts::ExplainVarianceOpts;
use crate::prelude::*;

pub fn run(opts: ExplainVarianceOpts) -> Result {
    let repositories = dataset::load(&opts.dataset.path)?;
    let dataset = Dataset::build(&repositories, &opts.dataset.matrix)?;
    let ratios = explained_variance(&dataset.matrix.values)?;

    let mut cumulative = 0.0;
    for (index, ratio) in ratios.iter().enumerate() {
        cumulative += ratio;
        println!("{}\t{:.6}\t{:.6}", index + 1, ratio, cumulative);
    }
    info!(
        threshold = opts.threshold,
        n_features = suggest_n_features(&ratios, opts.threshold),
        "suggested",
    );
    Ok(())
}

/// Explained variance ratio of each principal component, in the descending order.
#[instrument(skip_all, fields(n_rows = values.nrows(), n_columns = values.ncols()))]
pub fn explained_variance(values: &DMatrix<f64>) -> Result<Vec<f64>> {
    if values.nrows() < 2 || values.ncols() == 0 {
        return Err(Error::InsufficientData("at least two rows and one column are needed").into());
    }

    let means = values.row_mean();
    let centered = DMatrix::from_fn(values.nrows(), values.ncols(), |i, j| values[(i, j)] - means[j]);
    let variances = centered.singular_values().map(|sigma| sigma * sigma);
    let total = variances.sum();
    if total <= f64::EPSILON {
        return Err(Error::InsufficientData("the observation matrix has no variance").into());
    }

    Ok(variances
        .iter()
        .map(|variance| variance / total)
        .sorted_by(|lhs, rhs| rhs.total_cmp(lhs))
        .collect())
}

/// Smallest number of components which explain at least the threshold share of the variance.
#[must_use]
pub fn suggest_n_features(ratios: &[f64], threshold: f64) -> usize {
    const TOLERANCE: f64 = 1e-12;

    let mut cumulative = 0.0;
    for (index, ratio) in ratios.iter().enumerate() {
        cumulative += ratio;
        if cumulative + TOLERANCE >= threshold {
            return index + 1;
        }
    }
    ratios.len()
}
