//! Store errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store is full: {limit} records")]
    CapacityExceeded { limit: usize },

    #[error("Expiry out of range: {at} + {ttl}")]
    ExpiryOutOfRange { at: String, ttl: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true if the write may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
