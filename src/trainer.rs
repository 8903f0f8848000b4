//! Fits the repository and language latent factors to the observation matrix.
//! Implements a masked, regularized low-rank matrix factorization trained by
//! a nonlinear conjugate gradient.
//!
//! https://www.coursera.org/learn/machine-learning, «Recommender Systems».

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dataset::matrix::observed_mask;
use crate::error::Error;
use crate::helpers::tracing::format_elapsed;
use crate::opts::FactorizationOpts;
use crate::prelude::*;
use crate::trainer::factors::Factors;
use crate::trainer::optimizer::{ConjugateGradient, Summary};
use crate::trainer::problem::Problem;

pub mod factors;
pub mod optimizer;
pub mod problem;
pub mod reconstruction;

#[derive(Debug)]
pub struct Fit {
    pub factors: Factors,
    pub summary: Summary,
}

/// Fits the factors from scratch, starting with a fresh random initialization.
///
/// Not converging is not an error: the best factors found are returned along with the status.
#[instrument(
    skip_all,
    fields(n_rows = values.nrows(), n_columns = values.ncols(), n_features = opts.n_features),
)]
pub fn fit(values: &DMatrix<f64>, opts: &FactorizationOpts) -> Result<Fit> {
    opts.validate()?;
    if values.is_empty() {
        return Err(Error::InsufficientData("the observation matrix is empty").into());
    }
    let mask = observed_mask(values);
    if mask.iter().all(|indicator| *indicator == 0.0) {
        return Err(Error::InsufficientData("the observation matrix has no observed entries").into());
    }

    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let initial = Factors::random(
        values.nrows(),
        values.ncols(),
        opts.n_features,
        opts.init_scale,
        &mut rng,
    );
    let problem = Problem::new(values.clone(), mask, opts.n_features, opts.reg_param);

    let start_instant = Instant::now();
    let outcome = ConjugateGradient::new(opts.max_iterations, opts.gradient_tolerance).minimize(
        initial.pack(),
        |parameters| problem.loss(parameters),
        |parameters| problem.gradient(parameters),
    );
    let factors = problem.unpack(&outcome.parameters);
    let summary = outcome.summary;

    let error = problem.reconstruction_error(&factors);
    let elapsed = format_elapsed(start_instant);
    if summary.status.is_converged() {
        info!(
            loss = summary.loss,
            rmse = error.rmse(),
            max_residual = error.max_absolute(),
            n_iterations = summary.n_iterations,
            elapsed = elapsed.as_str(),
            "fitted",
        );
    } else {
        warn!(
            status = %summary.status,
            loss = summary.loss,
            rmse = error.rmse(),
            max_residual = error.max_absolute(),
            n_iterations = summary.n_iterations,
            n_evaluations = summary.n_evaluations,
            elapsed = elapsed.as_str(),
            "not converged, using the best factors found",
        );
    }

    Ok(Fit { factors, summary })
}
