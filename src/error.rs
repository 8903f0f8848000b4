//! Domain failure conditions.
//!
//! These travel inside [`anyhow::Error`] and can be recovered with
//! `error.downcast_ref::<Error>()`.

use thiserror::Error as ThisError;

#[derive(ThisError, Debug, PartialEq, Eq)]
pub enum Error {
    /// There is nothing to factorize.
    #[error("insufficient data: {0}")]
    InsufficientData(&'static str),

    #[error("invalid configuration: `{name}` {reason}")]
    InvalidConfiguration {
        name: &'static str,
        reason: &'static str,
    },
}

impl Error {
    pub const fn invalid(name: &'static str, reason: &'static str) -> Self {
        Self::InvalidConfiguration { name, reason }
    }
}
