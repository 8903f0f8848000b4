use nalgebra::DMatrix;

use crate::dataset::catalog::LanguageCatalog;
use crate::dataset::transform::ValueTransform;
use crate::dataset::Repository;
use crate::prelude::*;

/// Repository × language matrix of implicit ratings.
///
/// Zero means «unobserved», not a zero rating.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationMatrix {
    pub values: DMatrix<f64>,

    /// Names of the repositories behind the rows.
    pub repositories: Vec<String>,
}

impl ObservationMatrix {
    /// Builds the matrix, dropping the repositories which rows end up all zeros.
    #[instrument(skip_all, fields(n_repositories = repositories.len(), transform = ?transform))]
    pub fn build(
        repositories: &[Repository],
        catalog: &LanguageCatalog,
        transform: ValueTransform,
    ) -> Self {
        let n_columns = catalog.len();
        let mut data = Vec::with_capacity(repositories.len() * n_columns);
        let mut names = Vec::with_capacity(repositories.len());

        for repository in repositories {
            let mut row = vec![0.0; n_columns];
            for (name, value) in transform.apply(&repository.languages) {
                if let Some(index) = catalog.index_of(name) {
                    row[index] = value;
                }
            }
            if row.iter().any(|value| *value != 0.0) {
                data.extend(row);
                names.push(repository.name.clone());
            } else {
                debug!(repository.name, "dropped");
            }
        }

        Self {
            values: DMatrix::from_row_slice(names.len(), n_columns, &data),
            repositories: names,
        }
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.values.ncols()
    }

    #[must_use]
    pub fn n_observed(&self) -> usize {
        self.values.iter().filter(|value| **value > 0.0).count()
    }

    /// Share of the observed cells.
    #[must_use]
    pub fn density(&self) -> f64 {
        self.n_observed() as f64 / self.values.len().max(1) as f64
    }
}

/// Indicator matrix of the observed cells: `1` where the value is positive, `0` otherwise.
#[must_use]
pub fn observed_mask(values: &DMatrix<f64>) -> DMatrix<f64> {
    values.map(|value| if value > 0.0 { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository(name: &str, languages: &[(&str, u64)]) -> Repository {
        Repository {
            name: name.to_string(),
            languages: languages
                .iter()
                .map(|(name, n_bytes)| (name.to_string(), *n_bytes))
                .collect(),
        }
    }

    fn corpus() -> Vec<Repository> {
        vec![
            repository("a", &[("Rust", 300), ("Shell", 100)]),
            repository("b", &[("Rust", 50), ("Haskell", 50)]),
            repository("c", &[("Haskell", 10)]),
            repository("d", &[("Shell", 10), ("Rust", 0)]),
        ]
    }

    #[test]
    fn build_ok() {
        let catalog = LanguageCatalog::from_names(["Rust".to_string(), "Shell".to_string()]);
        let matrix = ObservationMatrix::build(&corpus(), &catalog, ValueTransform::Fraction);
        assert_eq!(matrix.repositories, ["a", "b", "d"]);
        assert_eq!(
            matrix.values,
            DMatrix::from_row_slice(3, 2, &[0.75, 0.25, 0.5, 0.0, 0.0, 1.0]),
        );
        assert_eq!(matrix.n_observed(), 4);
        assert!((matrix.density() - 4.0 / 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn build_is_idempotent() {
        let catalog = LanguageCatalog::build(&corpus(), 1, None);
        for transform in [
            ValueTransform::Fraction,
            ValueTransform::LogFraction,
            ValueTransform::LogBytes,
        ] {
            assert_eq!(
                ObservationMatrix::build(&corpus(), &catalog, transform),
                ObservationMatrix::build(&corpus(), &catalog, transform),
            );
        }
    }

    #[test]
    fn build_empty_catalog_ok() {
        let catalog = LanguageCatalog::from_names(Vec::new());
        let matrix = ObservationMatrix::build(&corpus(), &catalog, ValueTransform::Fraction);
        assert_eq!(matrix.n_rows(), 0);
        assert_eq!(matrix.n_columns(), 0);
        assert_eq!(matrix.density(), 0.0);
    }

    #[test]
    fn observed_mask_ok() {
        let values = DMatrix::from_row_slice(2, 3, &[0.5, 0.0, 2.0, 0.0, 1e-9, 0.0]);
        let mask = observed_mask(&values);
        assert_eq!(mask, DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 1.0, 0.0, 1.0, 0.0]));
        for (value, indicator) in values.iter().zip(mask.iter()) {
            assert_eq!(*indicator == 1.0, *value > 0.0);
        }
    }
}
