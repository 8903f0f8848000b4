use nalgebra::{DMatrix, DVector, RowDVector};
use rand::distributions::Uniform;
use rand::Rng;

/// Latent factors of the matrix rows (repositories) and columns (languages).
///
/// The optimizer sees them as a single flat vector:
/// `theta` in the row-major order followed by `x` in the row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Factors {
    /// Row preference vectors, `n_rows × n_features`.
    pub theta: DMatrix<f64>,

    /// Column feature loadings, `n_columns × n_features`.
    pub x: DMatrix<f64>,
}

impl Factors {
    /// Generates the factors uniformly from `[0, scale)`.
    pub fn random(
        n_rows: usize,
        n_columns: usize,
        n_features: usize,
        scale: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let distribution = Uniform::new(0.0, scale);
        let theta = DMatrix::from_fn(n_rows, n_features, |_, _| rng.sample(distribution));
        let x = DMatrix::from_fn(n_columns, n_features, |_, _| rng.sample(distribution));
        Self { theta, x }
    }

    #[must_use]
    pub fn n_parameters(&self) -> usize {
        self.theta.len() + self.x.len()
    }

    #[must_use]
    pub fn pack(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.n_parameters(),
            self.theta
                .transpose()
                .iter()
                .chain(self.x.transpose().iter())
                .copied(),
        )
    }

    /// Reverses [`Factors::pack`].
    #[must_use]
    pub fn unpack(
        parameters: &DVector<f64>,
        n_rows: usize,
        n_columns: usize,
        n_features: usize,
    ) -> Self {
        let (theta, x) = parameters.as_slice().split_at(n_rows * n_features);
        assert_eq!(x.len(), n_columns * n_features);
        Self {
            theta: DMatrix::from_row_slice(n_rows, n_features, theta),
            x: DMatrix::from_row_slice(n_columns, n_features, x),
        }
    }

    /// Full predicted rating matrix `theta · xᵀ`.
    #[must_use]
    pub fn predict(&self) -> DMatrix<f64> {
        &self.theta * self.x.transpose()
    }

    /// Predicted ratings of the single row.
    #[must_use]
    pub fn predict_row(&self, row: usize) -> RowDVector<f64> {
        self.theta.row(row) * self.x.transpose()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn pack_layout_ok() {
        let factors = Factors {
            theta: DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]),
            x: DMatrix::from_row_slice(1, 2, &[5.0, 6.0]),
        };
        assert_eq!(factors.pack().as_slice(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn unpack_pack_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);
        let factors = Factors::random(4, 3, 2, 1.0, &mut rng);
        assert_eq!(factors.n_parameters(), 14);
        assert_eq!(Factors::unpack(&factors.pack(), 4, 3, 2), factors);
    }

    #[test]
    fn random_is_non_negative_and_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        let factors = Factors::random(5, 7, 3, 0.1, &mut rng);
        assert!(factors.pack().iter().all(|value| (0.0..0.1).contains(value)));
    }

    #[test]
    fn predict_row_matches_predict() {
        let mut rng = StdRng::seed_from_u64(7);
        let factors = Factors::random(3, 4, 2, 1.0, &mut rng);
        let predictions = factors.predict();
        for row in 0..3 {
            let row_predictions = factors.predict_row(row);
            for column in 0..4 {
                assert!((row_predictions[column] - predictions[(row, column)]).abs() < 1e-12);
            }
        }
    }
}
