//! Error taxonomy.
//!
//! Only structural input problems are errors: bad block geometry, a
//! nonsensical schedule, malformed JSON. Search-quality shortfalls
//! (not converging, not fitting the outline) are reported through the
//! result's `feasible` flag, and a `find` miss is an ordinary `None`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FloorplanError {
    #[error("block {index} has invalid dimensions {width}x{height}")]
    InvalidBlock {
        index: usize,
        width: f64,
        height: f64,
    },

    #[error("invalid parameters: {0}")]
    BadParams(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FloorplanError>;
