use clap::Parser;

use crate::opts::{Opts, Subcommand};
use crate::prelude::*;

mod dataset;
mod diagnostics;
mod error;
mod helpers;
mod opts;
mod prelude;
mod recommender;
mod trainer;

fn main() -> Result {
    let opts = Opts::parse();
    let _sentry_guard = helpers::tracing::init(opts.sentry_dsn, opts.traces_sample_rate)?;

    let result = match opts.subcommand {
        Subcommand::Recommend(opts) => recommender::run(opts),
        Subcommand::ExplainVariance(opts) => diagnostics::run(opts),
    };
    if let Err(error) = &result {
        sentry::integrations::anyhow::capture_anyhow(error);
    }
    result
}
