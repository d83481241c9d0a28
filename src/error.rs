//! src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    // ========== Accumulator Errors ==========
    /// A proof was requested for a leaf that was never inserted.
    #[error("leaf index {index} out of range (size {size})")]
    IndexOutOfRange { index: u64, size: u64 },

    /// Padding beyond the bound, malformed sibling arrays, bad arity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A recomputed root disagrees with the stored one. Never recoverable.
    #[error("root mismatch: expected {expected}, computed {computed}")]
    RootMismatch { expected: String, computed: String },

    // ========== Codec Errors ==========
    /// Value handed to an encoder/decoder is not below its field modulus.
    #[error("field element out of range: {0}")]
    FieldElementOutOfRange(String),

    // ========== Withdrawal Errors ==========
    /// Over-spend or mismatched leaf; the caller must re-derive its inputs.
    #[error("invalid withdrawal: {0}")]
    InvalidWithdrawal(String),

    /// The proving engine rejected the witness or could not run.
    #[error("proving failed: {0}")]
    ProvingFailed(String),

    // ========== Adapter Errors ==========
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, PoolError>;

impl PoolError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        PoolError::InvalidArgument(msg.into())
    }

    pub(crate) fn withdrawal(msg: impl Into<String>) -> Self {
        PoolError::InvalidWithdrawal(msg.into())
    }

    /// Fatal errors point at a bug upstream; only `InvalidWithdrawal` and
    /// `ProvingFailed` are worth handing back to a caller for a fresh attempt.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PoolError::InvalidWithdrawal(_) | PoolError::ProvingFailed(_)
        )
    }
}
