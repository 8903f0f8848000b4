//! Recommends languages for a query user appended to the observation matrix.
//!
//! Every request refits the whole factorization with a fresh random initialization:
//! the query row takes part in the joint fit, and nothing is kept between requests.

use std::collections::BTreeSet;

use itertools::Itertools;
use nalgebra::RowDVector;
use serde::Serialize;

use crate::dataset::{self, Dataset};
use crate::error::Error;
use crate::opts::{FactorizationOpts, RecommendOpts};
use crate::prelude::*;
use crate::trainer;
use crate::trainer::optimizer::Summary;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub language: String,
    pub score: f64,
}

#[derive(Serialize, Debug)]
pub struct Recommendations {
    /// Optimizer diagnostics, non-convergence is reported here.
    pub summary: Summary,

    pub recommendations: Vec<Recommendation>,
}

pub fn run(opts: RecommendOpts) -> Result {
    let repositories = dataset::load(&opts.dataset.path)?;
    let dataset = Dataset::build(&repositories, &opts.dataset.matrix)?;
    let response = recommend(&dataset, &opts.tokens(), &opts.factorization, opts.top_n)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        for recommendation in &response.recommendations {
            println!("{}\t{:.6}", recommendation.language, recommendation.score);
        }
    }
    Ok(())
}

/// Ranks the languages, which are not already known, by the predicted rating of the query user.
///
/// Unknown tokens are ignored. The dataset itself is left untouched:
/// the query row only exists in the augmented copy being fitted.
#[instrument(skip_all, fields(tokens = ?tokens, top_n = top_n))]
pub fn recommend(
    dataset: &Dataset,
    tokens: &[&str],
    opts: &FactorizationOpts,
    top_n: usize,
) -> Result<Recommendations> {
    opts.validate()?;
    if top_n == 0 {
        return Err(Error::invalid("top_n", "must be positive").into());
    }
    let Dataset { catalog, matrix } = dataset;
    if catalog.is_empty() || matrix.n_observed() == 0 {
        return Err(Error::InsufficientData("no languages are observed in the dataset").into());
    }

    let known: BTreeSet<usize> = tokens
        .iter()
        .flat_map(|token| catalog.matching(token))
        .collect();
    debug!(known = ?known.iter().map(|index| catalog.name(*index)).collect_vec());

    let query_index = matrix.n_rows();
    let mut values = matrix.values.clone().insert_row(query_index, 0.0);
    for index in &known {
        values[(query_index, *index)] = 1.0;
    }

    let fit = trainer::fit(&values, opts)?;
    let predictions = fit.factors.predict_row(query_index);
    let recommendations = rank(&predictions, &known, top_n)
        .into_iter()
        .map(|(index, score)| Recommendation {
            language: catalog.name(index).to_string(),
            score,
        })
        .collect_vec();
    info!(n_recommendations = recommendations.len(), status = %fit.summary.status, "done");

    Ok(Recommendations {
        summary: fit.summary,
        recommendations,
    })
}

/// Top columns by the absolute predicted rating, excluding the known ones.
/// Ties go to the lower column index.
fn rank(predictions: &RowDVector<f64>, known: &BTreeSet<usize>, top_n: usize) -> Vec<(usize, f64)> {
    predictions
        .iter()
        .copied()
        .enumerate()
        .filter(|(index, _)| !known.contains(index))
        .sorted_by(|(lhs_index, lhs), (rhs_index, rhs)| {
            rhs.abs().total_cmp(&lhs.abs()).then(lhs_index.cmp(rhs_index))
        })
        .take(top_n)
        .collect()
}
