use std::collections::hash_map::Entry;

use itertools::Itertools;

use crate::dataset::Repository;
use crate::prelude::*;

/// Languages which become the observation matrix columns.
///
/// Column indices follow the discovery order: repositories in the input order,
/// and languages in the name order within a repository.
pub struct LanguageCatalog {
    names: Vec<String>,
    lowercase_names: Vec<String>,
    indices: AHashMap<String, usize>,
}

impl LanguageCatalog {
    /// Builds the catalog of languages used in at least `min_occurrence` repositories.
    ///
    /// With `max_size`, only the most frequent languages are kept,
    /// ties are broken by the discovery order.
    #[instrument(
        skip_all,
        fields(n_repositories = repositories.len(), min_occurrence = min_occurrence, max_size = ?max_size),
    )]
    pub fn build(
        repositories: &[Repository],
        min_occurrence: usize,
        max_size: Option<usize>,
    ) -> Self {
        let mut occurrences: Vec<(&str, usize)> = Vec::new();
        let mut positions: AHashMap<&str, usize> = AHashMap::default();
        for name in repositories.iter().flat_map(Repository::used_languages) {
            match positions.entry(name) {
                Entry::Occupied(entry) => occurrences[*entry.get()].1 += 1,
                Entry::Vacant(entry) => {
                    entry.insert(occurrences.len());
                    occurrences.push((name, 1));
                }
            }
        }
        let n_discovered = occurrences.len();

        let mut retained: Vec<(usize, &str, usize)> = occurrences
            .into_iter()
            .enumerate()
            .filter(|(_, (_, n_repositories))| *n_repositories >= min_occurrence)
            .map(|(position, (name, n_repositories))| (position, name, n_repositories))
            .collect();
        if let Some(max_size) = max_size {
            retained = retained
                .into_iter()
                .sorted_by(|lhs, rhs| rhs.2.cmp(&lhs.2).then(lhs.0.cmp(&rhs.0)))
                .take(max_size)
                .sorted_by_key(|(position, ..)| *position)
                .collect();
        }

        info!(n_discovered, n_retained = retained.len());
        Self::from_names(retained.into_iter().map(|(_, name, _)| name.to_string()))
    }

    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        let names: Vec<String> = names.into_iter().unique().collect();
        let lowercase_names = names.iter().map(|name| name.to_lowercase()).collect();
        let indices = names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
        Self {
            names,
            lowercase_names,
            indices,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    /// Column indices of the languages matching the token case-insensitively.
    pub fn matching<'a>(&'a self, token: &str) -> impl Iterator<Item = usize> + 'a {
        let token = token.to_lowercase();
        self.lowercase_names
            .iter()
            .positions(move |name| *name == token)
    }
}
