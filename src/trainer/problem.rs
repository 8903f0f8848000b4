use nalgebra::{DMatrix, DVector};

use crate::trainer::factors::Factors;
use crate::trainer::reconstruction::ReconstructionError;

/// Everything the loss and its gradient depend on, besides the factors themselves.
///
/// Loss: `½ Σ r (θᵢ·xⱼ − yᵢⱼ)² + ½ λ (‖θ‖² + ‖x‖²)`. Unobserved cells contribute nothing
/// to the loss and to the gradient.
pub struct Problem {
    values: DMatrix<f64>,
    mask: DMatrix<f64>,
    n_features: usize,
    reg_param: f64,
}

impl Problem {
    pub fn new(values: DMatrix<f64>, mask: DMatrix<f64>, n_features: usize, reg_param: f64) -> Self {
        assert_eq!(values.shape(), mask.shape());
        Self {
            values,
            mask,
            n_features,
            reg_param,
        }
    }

    #[must_use]
    pub fn unpack(&self, parameters: &DVector<f64>) -> Factors {
        Factors::unpack(parameters, self.values.nrows(), self.values.ncols(), self.n_features)
    }

    #[must_use]
    pub fn loss(&self, parameters: &DVector<f64>) -> f64 {
        let factors = self.unpack(parameters);
        let residuals = self.masked_residuals(&factors);
        0.5 * residuals.norm_squared()
            + 0.5 * self.reg_param * (factors.theta.norm_squared() + factors.x.norm_squared())
    }

    /// Gradient with respect to the packed factors, in the same layout.
    #[must_use]
    pub fn gradient(&self, parameters: &DVector<f64>) -> DVector<f64> {
        let factors = self.unpack(parameters);
        let residuals = self.masked_residuals(&factors);
        Factors {
            theta: &residuals * &factors.x + &factors.theta * self.reg_param,
            x: residuals.transpose() * &factors.theta + &factors.x * self.reg_param,
        }
        .pack()
    }

    /// Reconstruction error over the observed cells.
    #[must_use]
    pub fn reconstruction_error(&self, factors: &Factors) -> ReconstructionError {
        let mut error = ReconstructionError::default();
        let predictions = factors.predict();
        let cells = predictions.iter().zip(self.values.iter()).zip(self.mask.iter());
        for ((prediction, value), indicator) in cells {
            if *indicator != 0.0 {
                error.push(*prediction, *value);
            }
        }
        error
    }

    /// `r ⊙ (θ·xᵀ − y)`.
    fn masked_residuals(&self, factors: &Factors) -> DMatrix<f64> {
        (factors.predict() - &self.values).component_mul(&self.mask)
    }
}
