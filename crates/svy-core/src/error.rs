use polars::prelude::PolarsError;
use thiserror::Error;

use svy_model::ModelError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("identifier column {column} was dropped by the transformation")]
    IdentifiersNotPreserved { column: String },
    #[error("transformation failed: {0}")]
    Transformation(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
