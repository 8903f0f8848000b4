//! Nonlinear conjugate gradient (Polak–Ribière+) with a backtracking Armijo line search.
//!
//! See: <https://en.wikipedia.org/wiki/Nonlinear_conjugate_gradient_method>.

use std::fmt::{Display, Formatter};

use nalgebra::DVector;
use serde::Serialize;

use crate::prelude::*;

/// Sufficient decrease constant of the Armijo condition.
const ARMIJO: f64 = 1e-4;

/// Backtracking shrinks the step by this factor.
const BACKTRACKING: f64 = 0.5;

/// Relative loss decrease at which the minimization is considered stalled.
const LOSS_TOLERANCE: f64 = 1e-12;

/// Loss evaluation budget per iteration.
const EVALUATIONS_PER_ITERATION: usize = 20;

#[derive(Serialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Converged,
    MaxIterations,
    MaxEvaluations,

    /// The line search could not decrease the loss any further.
    PrecisionLoss,
}

impl Status {
    #[must_use]
    pub const fn is_converged(self) -> bool {
        matches!(self, Self::Converged)
    }
}

impl Display for Status {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            Self::Converged => "converged",
            Self::MaxIterations => "maximum number of iterations exceeded",
            Self::MaxEvaluations => "maximum number of loss evaluations exceeded",
            Self::PrecisionLoss => "desired error not necessarily achieved due to precision loss",
        })
    }
}

#[derive(Serialize, Copy, Clone, Debug)]
pub struct Summary {
    pub status: Status,
    pub loss: f64,
    pub n_iterations: usize,
    pub n_evaluations: usize,
}

pub struct Outcome {
    /// Best parameters found, regardless of the status.
    pub parameters: DVector<f64>,

    pub summary: Summary,
}

pub struct ConjugateGradient {
    pub max_iterations: usize,
    pub max_evaluations: usize,

    /// Infinity norm of the gradient to stop at.
    pub gradient_tolerance: f64,
}

impl ConjugateGradient {
    #[must_use]
    pub fn new(max_iterations: usize, gradient_tolerance: f64) -> Self {
        Self {
            max_iterations,
            max_evaluations: max_iterations.saturating_mul(EVALUATIONS_PER_ITERATION),
            gradient_tolerance,
        }
    }

    /// Minimizes the loss starting from the initial parameters.
    ///
    /// Never fails: whatever the status, the best parameters found are returned.
    #[instrument(level = "debug", skip_all, fields(n_parameters = initial.len()))]
    pub fn minimize(
        &self,
        initial: DVector<f64>,
        loss: impl Fn(&DVector<f64>) -> f64,
        gradient: impl Fn(&DVector<f64>) -> DVector<f64>,
    ) -> Outcome {
        let mut parameters = initial;
        let mut value = loss(&parameters);
        let mut n_evaluations = 1;
        let mut current_gradient = gradient(&parameters);
        let mut direction = -&current_gradient;
        let mut n_iterations = 0;

        // Step length times the directional derivative, used to guess the next step.
        let mut previous_decrease: Option<f64> = None;

        let status = 'minimize: loop {
            if !value.is_finite() || current_gradient.iter().any(|gi| !gi.is_finite()) {
                break Status::PrecisionLoss;
            }
            if current_gradient.amax() <= self.gradient_tolerance {
                break Status::Converged;
            }
            if n_iterations >= self.max_iterations {
                break Status::MaxIterations;
            }

            let mut slope = current_gradient.dot(&direction);
            if slope >= 0.0 {
                // Not a descent direction, restart along the steepest descent.
                direction = -&current_gradient;
                slope = -current_gradient.norm_squared();
            }

            let mut step = match previous_decrease {
                Some(decrease) => decrease / slope,
                None => 1.0 / current_gradient.norm().max(1.0),
            };
            if !step.is_finite() || step <= 0.0 {
                step = 1.0;
            }

            let (candidate, candidate_value) = loop {
                if n_evaluations >= self.max_evaluations {
                    break 'minimize Status::MaxEvaluations;
                }
                let candidate = &parameters + &direction * step;
                let candidate_value = loss(&candidate);
                n_evaluations += 1;
                if candidate_value <= value + ARMIJO * step * slope {
                    break (candidate, candidate_value);
                }
                step *= BACKTRACKING;
                if step * direction.amax() <= f64::EPSILON * parameters.amax().max(1.0) {
                    break 'minimize Status::PrecisionLoss;
                }
            };

            let next_gradient = gradient(&candidate);
            let beta = (next_gradient.dot(&(&next_gradient - &current_gradient))
                / current_gradient.norm_squared())
            .max(0.0);
            direction = -&next_gradient + &direction * beta;
            previous_decrease = Some(step * slope);

            let decrease = value - candidate_value;
            let scale = value.abs().max(candidate_value.abs()).max(1.0);
            parameters = candidate;
            value = candidate_value;
            current_gradient = next_gradient;
            n_iterations += 1;

            if decrease <= LOSS_TOLERANCE * scale {
                break Status::Converged;
            }
        };

        debug!(%status, loss = value, n_iterations, n_evaluations, "finished");
        Outcome {
            parameters,
            summary: Summary {
                status,
                loss: value,
                n_iterations,
                n_evaluations,
            },
        }
    }
}
