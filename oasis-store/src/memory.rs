use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use oasis_core::{OperatorDirectory, ReservationStore, StoreError, StoreResult};
use oasis_shared::{OperatorRecord, RequesterId, Reservation, ReservationStatus};

/// In-memory implementation of both store traits with the same observable
/// semantics as the SQLite backend: unique keys, conditional updates,
/// insertion-ordered scans, approved view newest first. Unit tests inject
/// it wherever a store is expected; it also serves as an ephemeral
/// backend for local runs.
#[derive(Default)]
pub struct MemoryStore {
    reservations: Mutex<Vec<Reservation>>,
    operators: Mutex<Vec<OperatorRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn reservations(&self) -> StoreResult<MutexGuard<'_, Vec<Reservation>>> {
        self.reservations
            .lock()
            .map_err(|_| StoreError::Backend("reservation lock poisoned".to_string()))
    }

    fn operators(&self) -> StoreResult<MutexGuard<'_, Vec<OperatorRecord>>> {
        self.operators
            .lock()
            .map_err(|_| StoreError::Backend("operator lock poisoned".to_string()))
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn insert(&self, reservation: &Reservation) -> StoreResult<()> {
        let mut rows = self.reservations()?;
        if rows.iter().any(|r| r.code == reservation.code) {
            return Err(StoreError::Duplicate(reservation.code.clone()));
        }
        rows.push(reservation.clone());
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Reservation>> {
        Ok(self.reservations()?.iter().find(|r| r.code == code).cloned())
    }

    async fn list_pending(&self) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .reservations()?
            .iter()
            .filter(|r| r.status == ReservationStatus::Pending)
            .cloned()
            .collect())
    }

    async fn list_approved(&self) -> StoreResult<Vec<Reservation>> {
        let mut approved: Vec<Reservation> = self
            .reservations()?
            .iter()
            .filter(|r| r.status == ReservationStatus::Approved)
            .cloned()
            .collect();
        approved.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(approved)
    }

    async fn list_by_requester(&self, requester: &RequesterId) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .reservations()?
            .iter()
            .filter(|r| &r.requester == requester)
            .cloned()
            .collect())
    }

    async fn set_status_if_pending(
        &self,
        code: &str,
        status: &ReservationStatus,
    ) -> StoreResult<bool> {
        let mut rows = self.reservations()?;
        match rows
            .iter_mut()
            .find(|r| r.code == code && r.status == ReservationStatus::Pending)
        {
            Some(row) => {
                row.status = status.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl OperatorDirectory for MemoryStore {
    async fn insert(&self, record: &OperatorRecord) -> StoreResult<()> {
        let mut rows = self.operators()?;
        if rows.iter().any(|op| op.identity == record.identity) {
            return Err(StoreError::Duplicate(record.identity.to_string()));
        }
        rows.push(record.clone());
        Ok(())
    }

    async fn remove(&self, identity: &RequesterId) -> StoreResult<bool> {
        let mut rows = self.operators()?;
        match rows.iter().position(|op| &op.identity == identity) {
            Some(index) => {
                rows.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find(&self, identity: &RequesterId) -> StoreResult<Option<OperatorRecord>> {
        Ok(self
            .operators()?
            .iter()
            .find(|op| &op.identity == identity)
            .cloned())
    }

    async fn list(&self) -> StoreResult<Vec<OperatorRecord>> {
        Ok(self.operators()?.clone())
    }
}
