use thiserror::Error;

/// Batch encoding failures.
///
/// Insufficient prediction data is deliberately *not* represented here: the
/// similarity predictor signals it by value (`DataPrediction::Insufficient`)
/// because falling back to the static algorithm is a normal code path, not
/// exceptional handling. Individual bad samples are skipped with a warning;
/// only a batch with zero usable samples is a hard stop, since no training
/// signal exists at all.
#[derive(Debug, Error, Clone)]
pub enum EncodingError {
    #[error("no usable samples in batch ({skipped} skipped)")]
    EmptyBatch { skipped: usize },
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("empty material table")]
    EmptyMaterialTable,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
