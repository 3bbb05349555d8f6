use async_trait::async_trait;
use oasis_shared::{OperatorRecord, RequesterId, Reservation, ReservationStatus};

use crate::StoreResult;

/// Durable reservation records, keyed by their unique code.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Inserts a new record. The code is a unique key: a collision fails
    /// with `StoreError::Duplicate` and leaves the existing row intact.
    async fn insert(&self, reservation: &Reservation) -> StoreResult<()>;

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Reservation>>;

    /// Records still awaiting a decision, oldest first.
    async fn list_pending(&self) -> StoreResult<Vec<Reservation>>;

    /// Approved records, newest first.
    async fn list_approved(&self) -> StoreResult<Vec<Reservation>>;

    /// Everything a requester has ever submitted, oldest first.
    async fn list_by_requester(&self, requester: &RequesterId) -> StoreResult<Vec<Reservation>>;

    /// Moves a record out of `pending` into the given status. Returns
    /// `false` without touching the row when the code is unknown or the
    /// record already carries a terminal status.
    async fn set_status_if_pending(
        &self,
        code: &str,
        status: &ReservationStatus,
    ) -> StoreResult<bool>;
}

/// Directory of identities allowed to run operator commands.
#[async_trait]
pub trait OperatorDirectory: Send + Sync {
    /// Registers an operator. The identity is a unique key: promoting an
    /// existing operator fails with `StoreError::Duplicate` and keeps the
    /// original record, including its promotion timestamp.
    async fn insert(&self, record: &OperatorRecord) -> StoreResult<()>;

    /// Removes an operator. Returns `false` when the identity is absent.
    async fn remove(&self, identity: &RequesterId) -> StoreResult<bool>;

    async fn find(&self, identity: &RequesterId) -> StoreResult<Option<OperatorRecord>>;

    /// All registered operators in promotion order.
    async fn list(&self) -> StoreResult<Vec<OperatorRecord>>;

    /// True when nobody has been promoted yet; drives the bootstrap seed.
    async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.list().await?.is_empty())
    }
}
