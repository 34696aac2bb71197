use thiserror::Error;

/// Caller-side faults at the JSON boundary.
///
/// These never describe a certificate's compliance; a certificate that fails
/// a check is reported as an [`Issue`](crate::Issue) instead.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a whole-dollar amount: {0:?}")]
    InvalidAmount(String),

    #[error("negative amount: {0}")]
    NegativeAmount(i64),
}
