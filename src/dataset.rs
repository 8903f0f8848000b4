//! Repository language usage records and the observation matrix built from them.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::catalog::LanguageCatalog;
use crate::dataset::matrix::ObservationMatrix;
use crate::opts::MatrixOpts;
use crate::prelude::*;

pub mod catalog;
pub mod matrix;
pub mod transform;

/// Single repository as returned by the data source.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub name: String,

    /// Language name to the number of bytes of code.
    #[serde(default)]
    pub languages: BTreeMap<String, u64>,
}

impl Repository {
    /// Languages with a positive byte count.
    pub fn used_languages(&self) -> impl Iterator<Item = &str> {
        self.languages
            .iter()
            .filter(|(_, n_bytes)| **n_bytes != 0)
            .map(|(name, _)| name.as_str())
    }
}

#[instrument(skip_all, fields(path = ?path))]
pub fn load(path: impl AsRef<Path> + Debug) -> Result<Vec<Repository>> {
    let file = File::open(path).context("failed to open the dataset")?;
    let repositories: Vec<Repository> =
        serde_json::from_reader(BufReader::new(file)).context("failed to parse the dataset")?;
    info!(n_repositories = repositories.len(), "loaded");
    Ok(repositories)
}

pub struct Dataset {
    pub catalog: LanguageCatalog,
    pub matrix: ObservationMatrix,
}

impl Dataset {
    #[instrument(skip_all, fields(n_repositories = repositories.len()))]
    pub fn build(repositories: &[Repository], opts: &MatrixOpts) -> Result<Self> {
        opts.validate()?;
        let catalog = LanguageCatalog::build(
            repositories,
            opts.min_language_occurrence,
            opts.column_filter_size,
        );
        debug!(languages = ?catalog.names());
        let matrix = ObservationMatrix::build(repositories, &catalog, opts.value_transform);
        info!(
            n_rows = matrix.n_rows(),
            n_columns = matrix.n_columns(),
            n_dropped = repositories.len() - matrix.n_rows(),
            density = format!("{:.4}", matrix.density()).as_str(),
            "built",
        );
        Ok(Self { catalog, matrix })
    }
}
