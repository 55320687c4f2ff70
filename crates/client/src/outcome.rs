//! Result of a best-effort read
//!
//! Profile and catalog reads never fail the caller: errors are logged and the
//! previously cached value stays in place. `FetchOutcome` reports which of
//! those paths was taken.

use crate::error::ClientError;

#[derive(Debug)]
#[must_use]
pub enum FetchOutcome {
    /// The response was stored in the cache
    Updated,
    /// Nothing was requested (no session to read with)
    Skipped,
    /// The response arrived after the session changed and was dropped
    Stale,
    /// The request failed; the cache kept its previous value
    Failed(ClientError),
}

impl FetchOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated)
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Convert into a `Result`, surfacing the soft failure as an error
    pub fn into_result(self) -> Result<Self, ClientError> {
        match self {
            Self::Failed(e) => Err(e),
            other => Ok(other),
        }
    }
}
