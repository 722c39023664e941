//! Errors that stop the binary before a request is answered.

use thiserror::Error;

use residence_core::ports::CatalogError;
use residence_core::{ImputeError, PolicyError};

#[derive(Error, Debug)]
pub enum CliError {
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Imputer could not be assembled
    #[error("configuration error: {0}")]
    Config(#[from] ImputeError),
}

pub type CliResult<T> = std::result::Result<T, CliError>;
