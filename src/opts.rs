//! CLI options.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand as ClapSubcommand};

use crate::dataset::transform::ValueTransform;
use crate::error::Error;
use crate::prelude::*;

pub mod parsers;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Opts {
    /// Sentry DSN
    #[arg(long, env = "LANGREC_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Performance traces sample rate for Sentry
    #[arg(long, default_value = "0", env = "LANGREC_TRACES_SAMPLE_RATE")]
    pub traces_sample_rate: f32,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(ClapSubcommand)]
pub enum Subcommand {
    Recommend(RecommendOpts),
    ExplainVariance(ExplainVarianceOpts),
}

/// Recommends languages for the ones you already know
#[derive(Args)]
pub struct RecommendOpts {
    #[command(flatten)]
    pub dataset: DatasetOpts,

    #[command(flatten)]
    pub factorization: FactorizationOpts,

    /// Number of recommendations to return
    #[arg(
        long,
        default_value_t = DEFAULT_TOP_N,
        value_parser = parsers::non_zero_usize,
        env = "LANGREC_TOP_N",
    )]
    pub top_n: usize,

    /// Print the recommendations as JSON
    #[arg(long)]
    pub json: bool,

    /// Languages you already know, case-insensitive
    pub languages: Vec<String>,
}

pub const DEFAULT_TOP_N: usize = 5;

impl RecommendOpts {
    /// Query tokens: positional arguments split on whitespace.
    pub fn tokens(&self) -> Vec<&str> {
        self.languages
            .iter()
            .flat_map(|argument| argument.split_whitespace())
            .collect()
    }
}

/// Reports the explained variance per component to help choose `--n-features`
#[derive(Args)]
pub struct ExplainVarianceOpts {
    #[command(flatten)]
    pub dataset: DatasetOpts,

    /// Cumulative explained variance ratio to suggest the feature count for
    #[arg(long, default_value = "0.9", value_parser = parsers::ratio)]
    pub threshold: f64,
}

#[derive(Args)]
pub struct DatasetOpts {
    /// JSON file with repositories and their language byte counts
    #[arg(short = 'd', long = "dataset", env = "LANGREC_DATASET")]
    pub path: PathBuf,

    #[command(flatten)]
    pub matrix: MatrixOpts,
}

/// Observation matrix options.
#[derive(Args, Clone, Copy, Debug)]
pub struct MatrixOpts {
    /// How byte counts turn into matrix values
    #[arg(long, value_enum, default_value_t, env = "LANGREC_VALUE_TRANSFORM")]
    pub value_transform: ValueTransform,

    /// Minimum number of repositories a language must appear in
    #[arg(
        long,
        default_value_t = DEFAULT_MIN_LANGUAGE_OCCURRENCE,
        value_parser = parsers::non_zero_usize,
        env = "LANGREC_MIN_LANGUAGE_OCCURRENCE",
    )]
    pub min_language_occurrence: usize,

    /// Keep only this many most frequent languages
    #[arg(long, value_parser = parsers::non_zero_usize, env = "LANGREC_COLUMN_FILTER_SIZE")]
    pub column_filter_size: Option<usize>,
}

pub const DEFAULT_MIN_LANGUAGE_OCCURRENCE: usize = 2;

impl Default for MatrixOpts {
    fn default() -> Self {
        Self {
            value_transform: ValueTransform::default(),
            min_language_occurrence: DEFAULT_MIN_LANGUAGE_OCCURRENCE,
            column_filter_size: None,
        }
    }
}

impl MatrixOpts {
    pub fn validate(&self) -> Result {
        if self.min_language_occurrence == 0 {
            return Err(Error::invalid("min_language_occurrence", "must be positive").into());
        }
        if self.column_filter_size == Some(0) {
            return Err(Error::invalid("column_filter_size", "must be positive").into());
        }
        Ok(())
    }
}

/// Matrix factorization (machine learning) options.
#[derive(Args, Clone, Copy, Debug)]
pub struct FactorizationOpts {
    /// Latent feature count
    #[arg(
        long,
        default_value_t = DEFAULT_N_FEATURES,
        value_parser = parsers::non_zero_usize,
        env = "LANGREC_N_FEATURES",
    )]
    pub n_features: usize,

    /// Regularization parameter
    #[arg(
        long,
        default_value_t = DEFAULT_REG_PARAM,
        value_parser = parsers::non_negative_f64,
        env = "LANGREC_REG_PARAM",
    )]
    pub reg_param: f64,

    /// Conjugate gradient iteration budget
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_ITERATIONS,
        value_parser = parsers::non_zero_usize,
        env = "LANGREC_MAX_ITERATIONS",
    )]
    pub max_iterations: usize,

    /// Stop when the gradient infinity norm drops below this value
    #[arg(
        long,
        default_value_t = DEFAULT_GRADIENT_TOLERANCE,
        value_parser = parsers::non_negative_f64,
        env = "LANGREC_GRADIENT_TOLERANCE",
    )]
    pub gradient_tolerance: f64,

    /// Latent factors are initialized uniformly from `[0, init_scale)`
    #[arg(
        long,
        default_value_t = DEFAULT_INIT_SCALE,
        value_parser = parsers::positive_f64,
        env = "LANGREC_INIT_SCALE",
    )]
    pub init_scale: f64,

    /// Random seed for the factor initialization
    #[arg(long, env = "LANGREC_SEED")]
    pub seed: Option<u64>,
}

pub const DEFAULT_N_FEATURES: usize = 10;
pub const DEFAULT_REG_PARAM: f64 = 1e-5;
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
pub const DEFAULT_GRADIENT_TOLERANCE: f64 = 1e-5;
pub const DEFAULT_INIT_SCALE: f64 = 0.1;

impl Default for FactorizationOpts {
    fn default() -> Self {
        Self {
            n_features: DEFAULT_N_FEATURES,
            reg_param: DEFAULT_REG_PARAM,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            gradient_tolerance: DEFAULT_GRADIENT_TOLERANCE,
            init_scale: DEFAULT_INIT_SCALE,
            seed: None,
        }
    }
}

impl FactorizationOpts {
    pub fn validate(&self) -> Result {
        if self.n_features == 0 {
            return Err(Error::invalid("n_features", "must be positive").into());
        }
        if !(self.reg_param.is_finite() && self.reg_param >= 0.0) {
            return Err(Error::invalid("reg_param", "must be a finite non-negative number").into());
        }
        if self.max_iterations == 0 {
            return Err(Error::invalid("max_iterations", "must be positive").into());
        }
        if !(self.gradient_tolerance.is_finite() && self.gradient_tolerance >= 0.0) {
            return Err(
                Error::invalid("gradient_tolerance", "must be a finite non-negative number").into()
            );
        }
        if !(self.init_scale.is_finite() && self.init_scale > 0.0) {
            return Err(Error::invalid("init_scale", "must be a finite positive number").into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_factorization_opts_ok() -> crate::Result {
        FactorizationOpts::default().validate()
    }

    #[test]
    fn negative_reg_param_rejected() {
        let opts = FactorizationOpts {
            reg_param: -1.0,
            ..Default::default()
        };
        let error = opts.validate().unwrap_err();
        assert_eq!(
            error.downcast_ref::<Error>(),
            Some(&Error::invalid("reg_param", "must be a finite non-negative number")),
        );
    }

    #[test]
    fn infinite_gradient_tolerance_rejected() {
        for gradient_tolerance in [f64::INFINITY, f64::NAN, -1e-5] {
            let opts = FactorizationOpts {
                gradient_tolerance,
                ..Default::default()
            };
            let error = opts.validate().unwrap_err();
            assert_eq!(
                error.downcast_ref::<Error>(),
                Some(&Error::invalid(
                    "gradient_tolerance",
                    "must be a finite non-negative number",
                )),
            );
        }
    }

    #[test]
    fn zero_features_rejected() {
        let opts = FactorizationOpts {
            n_features: 0,
            ..Default::default()
        };
        assert!(matches!(
            opts.validate().unwrap_err().downcast_ref::<Error>(),
            Some(Error::InvalidConfiguration { name: "n_features", .. }),
        ));
    }

    #[test]
    fn zero_column_filter_size_rejected() {
        let opts = MatrixOpts {
            column_filter_size: Some(0),
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn parse_recommend_ok() {
        let opts = Opts::try_parse_from([
            "langrec",
            "recommend",
            "--dataset",
            "repos.json",
            "--value-transform",
            "log-fraction",
            "--n-features",
            "3",
            "--seed",
            "42",
            "Python",
            "rust go",
        ])
        .unwrap();
        match opts.subcommand {
            Subcommand::Recommend(opts) => {
                assert_eq!(opts.dataset.matrix.value_transform, ValueTransform::LogFraction);
                assert_eq!(opts.factorization.n_features, 3);
                assert_eq!(opts.factorization.seed, Some(42));
                assert_eq!(opts.top_n, DEFAULT_TOP_N);
                assert_eq!(opts.tokens(), ["Python", "rust", "go"]);
            }
            Subcommand::ExplainVariance(_) => unreachable!(),
        }
    }

    #[test]
    fn parse_zero_top_n_fails() {
        let result = Opts::try_parse_from([
            "langrec",
            "recommend",
            "--dataset",
            "repos.json",
            "--top-n",
            "0",
        ]);
        assert!(result.is_err());
    }
}
