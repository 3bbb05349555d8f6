use std::sync::Arc;

use oasis_core::{OperatorDirectory, ReservationStore, StoreError};
use oasis_shared::{OperatorRecord, RequesterId, Reservation, ReservationStatus};
use tracing::info;

use crate::notify::{Notice, NoticeQueue};

/// Operator-gated workflow over committed reservations.
///
/// Every operation first checks the caller against the operator
/// directory; a non-operator gets `PermissionDenied`, which is distinct
/// from the not-found failures an authorized caller can hit.
pub struct ApprovalService {
    reservations: Arc<dyn ReservationStore>,
    operators: Arc<dyn OperatorDirectory>,
    notices: NoticeQueue,
}

impl ApprovalService {
    pub fn new(
        reservations: Arc<dyn ReservationStore>,
        operators: Arc<dyn OperatorDirectory>,
        notices: NoticeQueue,
    ) -> Self {
        Self {
            reservations,
            operators,
            notices,
        }
    }

    /// True when the identity may run operator commands.
    pub async fn is_operator(&self, identity: &RequesterId) -> Result<bool, ApprovalError> {
        Ok(self.operators.find(identity).await?.is_some())
    }

    pub async fn operator_record(
        &self,
        identity: &RequesterId,
    ) -> Result<Option<OperatorRecord>, ApprovalError> {
        Ok(self.operators.find(identity).await?)
    }

    /// Moves a pending reservation to approved and queues the requester
    /// notice. The update is conditional on the record still being
    /// pending: approving twice succeeds once and then reports
    /// not-found-for-update, never a quiet no-op.
    pub async fn approve(
        &self,
        caller: &RequesterId,
        code: &str,
    ) -> Result<Reservation, ApprovalError> {
        self.authorize(caller).await?;

        let updated = self
            .reservations
            .set_status_if_pending(code, &ReservationStatus::Approved)
            .await?;
        if !updated {
            return Err(ApprovalError::ReservationNotFound(code.to_string()));
        }

        let reservation = self
            .reservations
            .find_by_code(code)
            .await?
            .ok_or_else(|| ApprovalError::ReservationNotFound(code.to_string()))?;

        info!("Reservation {} approved by {}", code, caller);
        self.notices
            .publish(Notice::ReservationApproved(reservation.clone()));
        Ok(reservation)
    }

    /// Moves a pending reservation to rejected, optionally carrying a
    /// reason. The requester is not notified; only approval fans out.
    pub async fn reject(
        &self,
        caller: &RequesterId,
        code: &str,
        reason: Option<String>,
    ) -> Result<(), ApprovalError> {
        self.authorize(caller).await?;

        let status = ReservationStatus::Rejected { reason };
        let updated = self
            .reservations
            .set_status_if_pending(code, &status)
            .await?;
        if !updated {
            return Err(ApprovalError::ReservationNotFound(code.to_string()));
        }

        info!("Reservation {} rejected by {}", code, caller);
        Ok(())
    }

    /// Registers a new operator. Promoting an existing identity fails
    /// and leaves the stored record untouched.
    pub async fn promote(
        &self,
        caller: &RequesterId,
        identity: RequesterId,
        username: Option<String>,
        full_name: Option<String>,
    ) -> Result<OperatorRecord, ApprovalError> {
        self.authorize(caller).await?;

        let record = OperatorRecord::new(identity, username, full_name);
        match self.operators.insert(&record).await {
            Ok(()) => {
                info!("Operator {} promoted by {}", record.identity, caller);
                Ok(record)
            }
            Err(StoreError::Duplicate(_)) => Err(ApprovalError::AlreadyOperator(record.identity)),
            Err(err) => Err(err.into()),
        }
    }

    /// Removes an operator; the identity loses authorization immediately.
    pub async fn demote(
        &self,
        caller: &RequesterId,
        identity: &RequesterId,
    ) -> Result<(), ApprovalError> {
        self.authorize(caller).await?;

        if !self.operators.remove(identity).await? {
            return Err(ApprovalError::OperatorNotFound(identity.clone()));
        }

        info!("Operator {} demoted by {}", identity, caller);
        Ok(())
    }

    /// All operators in promotion order.
    pub async fn list_operators(
        &self,
        caller: &RequesterId,
    ) -> Result<Vec<OperatorRecord>, ApprovalError> {
        self.authorize(caller).await?;
        Ok(self.operators.list().await?)
    }

    /// The review queue, oldest first.
    pub async fn pending(&self, caller: &RequesterId) -> Result<Vec<Reservation>, ApprovalError> {
        self.authorize(caller).await?;
        Ok(self.reservations.list_pending().await?)
    }

    /// Approved reservations, newest first.
    pub async fn approved(&self, caller: &RequesterId) -> Result<Vec<Reservation>, ApprovalError> {
        self.authorize(caller).await?;
        Ok(self.reservations.list_approved().await?)
    }

    async fn authorize(&self, caller: &RequesterId) -> Result<(), ApprovalError> {
        match self.operators.find(caller).await? {
            Some(_) => Ok(()),
            None => Err(ApprovalError::PermissionDenied(caller.clone())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error("Not an operator: {0}")]
    PermissionDenied(RequesterId),

    #[error("No pending reservation with code {0}")]
    ReservationNotFound(String),

    #[error("Already an operator: {0}")]
    AlreadyOperator(RequesterId),

    #[error("Not an operator identity: {0}")]
    OperatorNotFound(RequesterId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use oasis_shared::Venue;
    use oasis_store::MemoryStore;
    use tokio::sync::mpsc;

    fn pending(code: &str, requester: &str, hour: u32) -> Reservation {
        Reservation {
            code: code.to_string(),
            display_name: "Sami".to_string(),
            venue: Venue::Bar,
            party_size: 2,
            amount: 20_000,
            payment_reference: "445566".to_string(),
            status: ReservationStatus::Pending,
            requester: RequesterId::new(requester),
            created_at: Utc.with_ymd_and_hms(2025, 6, 30, hour, 0, 0).unwrap(),
            reservation_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        }
    }

    async fn service_with_root(
        store: Arc<MemoryStore>,
    ) -> (ApprovalService, RequesterId, mpsc::Receiver<Notice>) {
        let root = RequesterId::new("root-op");
        OperatorDirectory::insert(
            &*store,
            &OperatorRecord::new(root.clone(), Some("root".into()), None),
        )
        .await
        .unwrap();

        let (notices, rx) = NoticeQueue::bounded(16);
        let service = ApprovalService::new(store.clone(), store, notices);
        (service, root, rx)
    }

    #[tokio::test]
    async fn test_approve_succeeds_once_then_reports_not_found() {
        let store = Arc::new(MemoryStore::new());
        ReservationStore::insert(&*store, &pending("X1", "14002", 9))
            .await
            .unwrap();
        let (service, root, mut rx) = service_with_root(store.clone()).await;

        let approved = service.approve(&root, "X1").await.unwrap();
        assert_eq!(approved.status, ReservationStatus::Approved);
        assert!(matches!(
            rx.try_recv(),
            Ok(Notice::ReservationApproved(r)) if r.code == "X1"
        ));

        // Second operator pressing the same affordance: zero rows updated
        let err = service.approve(&root, "X1").await.unwrap_err();
        assert!(matches!(err, ApprovalError::ReservationNotFound(_)));
        assert!(rx.try_recv().is_err());

        let kept = store.find_by_code("X1").await.unwrap().unwrap();
        assert_eq!(kept.status, ReservationStatus::Approved);
    }

    #[tokio::test]
    async fn test_reject_is_terminal_and_silent() {
        let store = Arc::new(MemoryStore::new());
        ReservationStore::insert(&*store, &pending("X1", "14002", 9))
            .await
            .unwrap();
        let (service, root, mut rx) = service_with_root(store.clone()).await;

        service
            .reject(&root, "X1", Some("venue closed that day".into()))
            .await
            .unwrap();

        let kept = store.find_by_code("X1").await.unwrap().unwrap();
        assert_eq!(
            kept.status,
            ReservationStatus::Rejected {
                reason: Some("venue closed that day".into())
            }
        );
        // No requester notice on rejection
        assert!(rx.try_recv().is_err());

        // Rejecting (or approving) a terminal record fails
        let err = service.reject(&root, "X1", None).await.unwrap_err();
        assert!(matches!(err, ApprovalError::ReservationNotFound(_)));
        let err = service.approve(&root, "X1").await.unwrap_err();
        assert!(matches!(err, ApprovalError::ReservationNotFound(_)));
    }

    #[tokio::test]
    async fn test_non_operator_is_denied_not_not_found() {
        let store = Arc::new(MemoryStore::new());
        ReservationStore::insert(&*store, &pending("X1", "14002", 9))
            .await
            .unwrap();
        let (service, root, _rx) = service_with_root(store).await;

        let stranger = RequesterId::new("14002");
        let err = service.approve(&stranger, "X1").await.unwrap_err();
        assert!(matches!(err, ApprovalError::PermissionDenied(_)));

        // Same operation by an operator against a bogus code: not found
        let err = service.approve(&root, "NOPE").await.unwrap_err();
        assert!(matches!(err, ApprovalError::ReservationNotFound(_)));
    }

    #[tokio::test]
    async fn test_promote_duplicate_keeps_existing_record() {
        let store = Arc::new(MemoryStore::new());
        let (service, root, _rx) = service_with_root(store.clone()).await;

        let promoted = service
            .promote(&root, RequesterId::new("77001"), Some("lina".into()), Some("Lina K".into()))
            .await
            .unwrap();
        assert_eq!(promoted.username.as_deref(), Some("lina"));

        let err = service
            .promote(&root, RequesterId::new("77001"), Some("other".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApprovalError::AlreadyOperator(_)));

        // The original record survives the failed promotion
        let kept = store.find(&RequesterId::new("77001")).await.unwrap().unwrap();
        assert_eq!(kept.username.as_deref(), Some("lina"));
        assert_eq!(kept.full_name.as_deref(), Some("Lina K"));
    }

    #[tokio::test]
    async fn test_demote_revokes_authorization() {
        let store = Arc::new(MemoryStore::new());
        let (service, root, _rx) = service_with_root(store).await;

        let lina = RequesterId::new("77001");
        service
            .promote(&root, lina.clone(), None, None)
            .await
            .unwrap();
        assert!(service.is_operator(&lina).await.unwrap());

        service.demote(&root, &lina).await.unwrap();
        assert!(!service.is_operator(&lina).await.unwrap());

        let err = service.demote(&root, &lina).await.unwrap_err();
        assert!(matches!(err, ApprovalError::OperatorNotFound(_)));

        // A demoted identity is a stranger again
        let err = service.pending(&lina).await.unwrap_err();
        assert!(matches!(err, ApprovalError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_operator_views_filter_and_order() {
        let store = Arc::new(MemoryStore::new());
        for (code, hour) in [("A1", 8), ("A2", 9), ("A3", 10)] {
            ReservationStore::insert(&*store, &pending(code, "14002", hour))
                .await
                .unwrap();
        }
        let (service, root, _rx) = service_with_root(store).await;

        service.approve(&root, "A1").await.unwrap();
        service.approve(&root, "A2").await.unwrap();

        let pending_view = service.pending(&root).await.unwrap();
        assert_eq!(pending_view.len(), 1);
        assert_eq!(pending_view[0].code, "A3");

        // Approved view is newest first
        let approved_view = service.approved(&root).await.unwrap();
        let codes: Vec<&str> = approved_view.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["A2", "A1"]);
    }
}
