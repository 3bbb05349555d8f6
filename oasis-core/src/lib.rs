pub mod repository;

pub use repository::{OperatorDirectory, ReservationStore};

/// Failures surfaced by the storage layer.
///
/// The domain layer only distinguishes unique-key collisions from
/// everything else: a duplicate reservation code aborts the commit,
/// while any other backend fault is reported and the operation retried
/// by the requester.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
