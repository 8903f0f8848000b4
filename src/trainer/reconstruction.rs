//! Reconstruction error of the observed repository × language cells.

/// Error of the predicted ratings against the observed ones.
///
/// Only observed cells are pushed: an unobserved cell has no rating to reconstruct.
#[derive(Default)]
pub struct ReconstructionError {
    sum_squared: f64,
    max_absolute: f64,
    n_cells: usize,
}

impl ReconstructionError {
    pub fn push(&mut self, prediction: f64, value: f64) {
        let residual = prediction - value;
        self.sum_squared += residual * residual;
        self.max_absolute = self.max_absolute.max(residual.abs());
        self.n_cells += 1;
    }

    #[must_use]
    pub fn rmse(&self) -> f64 {
        (self.sum_squared / self.n_cells.max(1) as f64).sqrt()
    }

    /// Worst reconstructed cell.
    #[must_use]
    pub const fn max_absolute(&self) -> f64 {
        self.max_absolute
    }

    #[must_use]
    pub const fn n_cells(&self) -> usize {
        self.n_cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rmse_and_max_absolute_ok() {
        let mut error = ReconstructionError::default();
        error.push(0.8, 0.5);
        error.push(0.1, 0.5);
        assert_eq!(error.n_cells(), 2);
        assert!((error.rmse() - 0.125_f64.sqrt()).abs() < 1e-12);
        assert!((error.max_absolute() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn no_observed_cells_is_zero() {
        let error = ReconstructionError::default();
        assert_eq!(error.n_cells(), 0);
        assert_eq!(error.rmse(), 0.0);
        assert_eq!(error.max_absolute(), 0.0);
    }
}
