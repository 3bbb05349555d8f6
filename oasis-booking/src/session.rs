use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use oasis_core::{ReservationStore, StoreError};
use oasis_shared::{RequesterId, Reservation, ReservationStatus, Venue};
use tracing::{info, warn};

use crate::capacity::{Admission, CapacityGate};
use crate::codes::CodeIssuer;
use crate::notify::{Notice, NoticeQueue};

/// Fields collected before the confirmation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub venue: Venue,
    pub name: String,
    pub party_size: i64,
    pub date: NaiveDate,
}

/// Conversation position for one requester.
///
/// Ephemeral and never persisted; each variant carries exactly the
/// fields collected up to that point, so no state can observe a field
/// that was never entered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingVenue,
    AwaitingName {
        venue: Venue,
    },
    AwaitingPartySize {
        venue: Venue,
        name: String,
    },
    AwaitingDate {
        venue: Venue,
        name: String,
        party_size: i64,
    },
    AwaitingConfirmation {
        draft: Draft,
    },
    AwaitingPaymentReference {
        draft: Draft,
    },
}

/// One piece of requester input, already shaped by the transport layer.
#[derive(Debug, Clone)]
pub enum SessionInput {
    /// A venue picked from the selection keyboard.
    Venue(Venue),
    /// Free-form message text.
    Text(String),
    /// The confirm button under the summary card.
    Confirm,
    /// The cancel button under the summary card.
    Abort,
}

/// What the requester should see after an input is applied. Rendering
/// to transport text happens in the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionReply {
    VenuePrompt,
    NamePrompt { venue: Venue },
    PartySizePrompt,
    InvalidPartySize,
    DatePrompt,
    InvalidDate,
    /// Admission refused; back to party-size entry with the figure shown.
    CapacityExhausted { remaining: i64 },
    ConfirmationPrompt {
        draft: Draft,
        amount: i64,
        remaining_after: i64,
    },
    PaymentPrompt { amount: i64 },
    InvalidPaymentReference,
    /// Commit landed; carries the full record for the success card.
    Committed { reservation: Reservation },
    /// The issued code already exists; the requester must resubmit.
    CodeConflict,
    Cancelled,
    /// Free text arrived where a button press was expected.
    NotUnderstood,
}

/// Result of applying one input: the state to keep plus the reply to
/// render (`None` when the input is dropped without a response).
#[derive(Debug, Clone)]
pub struct Step {
    pub state: SessionState,
    pub reply: Option<SessionReply>,
}

impl Step {
    fn next(state: SessionState, reply: SessionReply) -> Self {
        Self {
            state,
            reply: Some(reply),
        }
    }

    fn silent(state: SessionState) -> Self {
        Self { state, reply: None }
    }
}

/// The per-requester reservation conversation.
///
/// Walks venue → name → party size → date → confirmation → payment
/// reference, runs the admission check when the date is accepted, and
/// commits the reservation when the payment reference passes. The flow
/// itself is stateless; callers own the `SessionState` and must apply
/// inputs for one requester strictly in order.
pub struct BookingFlow {
    store: Arc<dyn ReservationStore>,
    gate: CapacityGate,
    issuer: Arc<dyn CodeIssuer>,
    notices: NoticeQueue,
    price_per_person: i64,
}

impl BookingFlow {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        gate: CapacityGate,
        issuer: Arc<dyn CodeIssuer>,
        notices: NoticeQueue,
        price_per_person: i64,
    ) -> Self {
        Self {
            store,
            gate,
            issuer,
            notices,
            price_per_person,
        }
    }

    /// Starts the conversation. Re-entry mid-flow discards any
    /// in-progress fields unconditionally and restarts at venue
    /// selection.
    pub fn begin(&self) -> Step {
        Step::next(SessionState::AwaitingVenue, SessionReply::VenuePrompt)
    }

    /// Discards the conversation without writing anything.
    pub fn cancel(&self) -> Step {
        Step::next(SessionState::Idle, SessionReply::Cancelled)
    }

    /// Applies one requester input to the current state.
    ///
    /// `Err` means the store failed mid-operation; the caller keeps the
    /// previous state and reports a generic failure.
    pub async fn advance(
        &self,
        requester: &RequesterId,
        state: SessionState,
        input: SessionInput,
    ) -> Result<Step, StoreError> {
        match (state, input) {
            (SessionState::AwaitingVenue, SessionInput::Venue(venue)) => Ok(Step::next(
                SessionState::AwaitingName { venue },
                SessionReply::NamePrompt { venue },
            )),

            (SessionState::AwaitingName { venue }, SessionInput::Text(text)) => Ok(Step::next(
                SessionState::AwaitingPartySize {
                    venue,
                    name: text.trim().to_string(),
                },
                SessionReply::PartySizePrompt,
            )),

            (SessionState::AwaitingPartySize { venue, name }, SessionInput::Text(text)) => {
                match text.trim().parse::<i64>() {
                    Ok(party_size) if party_size > 0 => Ok(Step::next(
                        SessionState::AwaitingDate {
                            venue,
                            name,
                            party_size,
                        },
                        SessionReply::DatePrompt,
                    )),
                    _ => Ok(Step::next(
                        SessionState::AwaitingPartySize { venue, name },
                        SessionReply::InvalidPartySize,
                    )),
                }
            }

            (
                SessionState::AwaitingDate {
                    venue,
                    name,
                    party_size,
                },
                SessionInput::Text(text),
            ) => match NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
                Ok(date) => self.check_admission(venue, name, party_size, date).await,
                Err(_) => Ok(Step::next(
                    SessionState::AwaitingDate {
                        venue,
                        name,
                        party_size,
                    },
                    SessionReply::InvalidDate,
                )),
            },

            (SessionState::AwaitingConfirmation { draft }, SessionInput::Confirm) => {
                let amount = draft.party_size * self.price_per_person;
                Ok(Step::next(
                    SessionState::AwaitingPaymentReference { draft },
                    SessionReply::PaymentPrompt { amount },
                ))
            }

            (SessionState::AwaitingConfirmation { .. }, SessionInput::Abort) => {
                Ok(Step::next(SessionState::Idle, SessionReply::Cancelled))
            }

            (SessionState::AwaitingPaymentReference { draft }, SessionInput::Text(text)) => {
                let reference = text.trim();
                if reference.is_empty() || !reference.chars().all(|c| c.is_ascii_digit()) {
                    return Ok(Step::next(
                        SessionState::AwaitingPaymentReference { draft },
                        SessionReply::InvalidPaymentReference,
                    ));
                }
                self.commit(requester, draft, reference).await
            }

            // Free text where a button press is expected keeps the state
            // and nudges the requester back to the buttons.
            (state @ SessionState::AwaitingVenue, SessionInput::Text(_))
            | (state @ SessionState::AwaitingConfirmation { .. }, SessionInput::Text(_)) => {
                Ok(Step::next(state, SessionReply::NotUnderstood))
            }

            // Stray button presses anywhere else are dropped silently.
            (state, _) => Ok(Step::silent(state)),
        }
    }

    /// Admission check, run once when the date is accepted. Refusal
    /// returns the conversation to party-size entry with the remaining
    /// figure disclosed; the date is collected again afterwards.
    async fn check_admission(
        &self,
        venue: Venue,
        name: String,
        party_size: i64,
        date: NaiveDate,
    ) -> Result<Step, StoreError> {
        let pending = self.store.list_pending().await?;

        match self.gate.admit(venue, party_size, &pending) {
            Admission::Exhausted { remaining } => Ok(Step::next(
                SessionState::AwaitingPartySize { venue, name },
                SessionReply::CapacityExhausted { remaining },
            )),
            Admission::Granted { remaining_after } => {
                let draft = Draft {
                    venue,
                    name,
                    party_size,
                    date,
                };
                let amount = party_size * self.price_per_person;
                Ok(Step::next(
                    SessionState::AwaitingConfirmation {
                        draft: draft.clone(),
                    },
                    SessionReply::ConfirmationPrompt {
                        draft,
                        amount,
                        remaining_after,
                    },
                ))
            }
        }
    }

    /// Builds the pending record and inserts it. A duplicate code is an
    /// explicit conflict: the state stays at payment-reference entry and
    /// nothing is regenerated or retried; resubmitting runs a fresh
    /// commit with a newly issued code.
    async fn commit(
        &self,
        requester: &RequesterId,
        draft: Draft,
        reference: &str,
    ) -> Result<Step, StoreError> {
        let reservation = Reservation {
            code: self.issuer.issue(),
            display_name: draft.name.clone(),
            venue: draft.venue,
            party_size: draft.party_size,
            amount: draft.party_size * self.price_per_person,
            payment_reference: reference.to_string(),
            status: ReservationStatus::Pending,
            requester: requester.clone(),
            created_at: Utc::now(),
            reservation_date: draft.date,
        };

        match self.store.insert(&reservation).await {
            Ok(()) => {
                info!(
                    "Reservation {} committed for {} at {}",
                    reservation.code, reservation.reservation_date, reservation.venue
                );
                self.notices
                    .publish(Notice::ReservationSubmitted(reservation.clone()));
                Ok(Step::next(
                    SessionState::Idle,
                    SessionReply::Committed { reservation },
                ))
            }
            Err(StoreError::Duplicate(code)) => {
                warn!("Reservation code collision on {}", code);
                Ok(Step::next(
                    SessionState::AwaitingPaymentReference { draft },
                    SessionReply::CodeConflict,
                ))
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{MockCodeIssuer, TimestampCodeIssuer};
    use oasis_shared::CapacityTable;
    use oasis_store::MemoryStore;
    use tokio::sync::mpsc;

    fn flow_over(
        store: Arc<MemoryStore>,
        issuer: Arc<dyn CodeIssuer>,
    ) -> (BookingFlow, mpsc::Receiver<Notice>) {
        let (notices, rx) = NoticeQueue::bounded(16);
        let flow = BookingFlow::new(
            store,
            CapacityGate::new(CapacityTable::default()),
            issuer,
            notices,
            10_000,
        );
        (flow, rx)
    }

    async fn drive(flow: &BookingFlow, requester: &RequesterId, state: SessionState, input: SessionInput) -> Step {
        flow.advance(requester, state, input).await.unwrap()
    }

    /// Walks a session up to payment-reference entry.
    async fn walk_to_payment(flow: &BookingFlow, requester: &RequesterId, party_size: &str) -> SessionState {
        let step = flow.begin();
        assert_eq!(step.reply, Some(SessionReply::VenuePrompt));

        let step = drive(flow, requester, step.state, SessionInput::Venue(Venue::Bar)).await;
        let step = drive(flow, requester, step.state, SessionInput::Text("Sami Haddad".into())).await;
        let step = drive(flow, requester, step.state, SessionInput::Text(party_size.into())).await;
        assert_eq!(step.reply, Some(SessionReply::DatePrompt));

        let step = drive(flow, requester, step.state, SessionInput::Text("2025-07-01".into())).await;
        assert!(matches!(
            step.reply,
            Some(SessionReply::ConfirmationPrompt { .. })
        ));

        let step = drive(flow, requester, step.state, SessionInput::Confirm).await;
        assert_eq!(step.reply, Some(SessionReply::PaymentPrompt { amount: 10_000 * party_size.parse::<i64>().unwrap() }));
        step.state
    }

    fn seed_pending(venue: Venue, count: usize) -> Vec<Reservation> {
        (0..count)
            .map(|i| Reservation {
                code: format!("SEED{:06}", i),
                display_name: format!("guest {}", i),
                venue,
                party_size: 3,
                amount: 30_000,
                payment_reference: "900100".to_string(),
                status: ReservationStatus::Pending,
                requester: RequesterId::new(format!("seed-{}", i)),
                created_at: Utc::now(),
                reservation_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_full_walk_commits_pending_reservation() {
        let store = Arc::new(MemoryStore::new());
        let (flow, mut rx) = flow_over(store.clone(), Arc::new(TimestampCodeIssuer::new("OASIS")));
        let requester = RequesterId::new("14002");

        let state = walk_to_payment(&flow, &requester, "4").await;
        let step = drive(&flow, &requester, state, SessionInput::Text("778899".into())).await;

        assert_eq!(step.state, SessionState::Idle);
        let reservation = match step.reply {
            Some(SessionReply::Committed { reservation }) => reservation,
            other => panic!("expected commit, got {:?}", other),
        };
        assert!(reservation.code.starts_with("OASIS"));
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.amount, 40_000);
        assert_eq!(reservation.payment_reference, "778899");
        assert_eq!(reservation.requester, requester);

        // Persisted and fanned out to operators
        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].code, reservation.code);
        assert!(matches!(
            rx.try_recv(),
            Ok(Notice::ReservationSubmitted(r)) if r.code == reservation.code
        ));
    }

    #[tokio::test]
    async fn test_party_size_must_be_positive_integer() {
        let store = Arc::new(MemoryStore::new());
        let (flow, _rx) = flow_over(store, Arc::new(TimestampCodeIssuer::new("OASIS")));
        let requester = RequesterId::new("14002");

        let step = flow.begin();
        let step = drive(&flow, &requester, step.state, SessionInput::Venue(Venue::KidsPool)).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("Rana".into())).await;

        for junk in ["four", "0", "-3", "2.5"] {
            let step = drive(&flow, &requester, step.state.clone(), SessionInput::Text(junk.into())).await;
            assert_eq!(step.reply, Some(SessionReply::InvalidPartySize));
            assert!(matches!(step.state, SessionState::AwaitingPartySize { .. }));
        }

        let step = drive(&flow, &requester, step.state, SessionInput::Text("4".into())).await;
        assert_eq!(step.reply, Some(SessionReply::DatePrompt));
    }

    #[tokio::test]
    async fn test_date_must_be_iso() {
        let store = Arc::new(MemoryStore::new());
        let (flow, _rx) = flow_over(store, Arc::new(TimestampCodeIssuer::new("OASIS")));
        let requester = RequesterId::new("14002");

        let step = flow.begin();
        let step = drive(&flow, &requester, step.state, SessionInput::Venue(Venue::Bar)).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("Sami".into())).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("2".into())).await;

        for junk in ["01-07-2025", "2025/07/01", "2025-02-30", "tomorrow"] {
            let step = drive(&flow, &requester, step.state.clone(), SessionInput::Text(junk.into())).await;
            assert_eq!(step.reply, Some(SessionReply::InvalidDate));
            assert!(matches!(step.state, SessionState::AwaitingDate { .. }));
        }

        let step = drive(&flow, &requester, step.state, SessionInput::Text("2025-07-01".into())).await;
        assert!(matches!(step.reply, Some(SessionReply::ConfirmationPrompt { .. })));
    }

    #[tokio::test]
    async fn test_capacity_refusal_returns_to_party_size() {
        let store = Arc::new(MemoryStore::new());
        for r in seed_pending(Venue::Bar, 25) {
            store.insert(&r).await.unwrap();
        }
        let (flow, _rx) = flow_over(store.clone(), Arc::new(TimestampCodeIssuer::new("OASIS")));
        let requester = RequesterId::new("14002");

        let step = flow.begin();
        let step = drive(&flow, &requester, step.state, SessionInput::Venue(Venue::Bar)).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("Sami".into())).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("6".into())).await;

        // 25 of 30 seats pending → refusing 6, disclosing the 5 left
        let step = drive(&flow, &requester, step.state, SessionInput::Text("2025-07-01".into())).await;
        assert_eq!(step.reply, Some(SessionReply::CapacityExhausted { remaining: 5 }));
        assert_eq!(
            step.state,
            SessionState::AwaitingPartySize {
                venue: Venue::Bar,
                name: "Sami".to_string()
            }
        );
        assert_eq!(store.list_pending().await.unwrap().len(), 25);

        // A smaller party passes on the next attempt
        let step = drive(&flow, &requester, step.state, SessionInput::Text("5".into())).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("2025-07-01".into())).await;
        assert!(matches!(
            step.reply,
            Some(SessionReply::ConfirmationPrompt { remaining_after: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_approved_reservations_free_capacity() {
        let store = Arc::new(MemoryStore::new());
        for r in seed_pending(Venue::Bar, 30) {
            store.insert(&r).await.unwrap();
        }
        // Approving one frees a seat: only pending rows count
        store
            .set_status_if_pending("SEED000000", &ReservationStatus::Approved)
            .await
            .unwrap();

        let (flow, _rx) = flow_over(store, Arc::new(TimestampCodeIssuer::new("OASIS")));
        let requester = RequesterId::new("14002");

        let step = flow.begin();
        let step = drive(&flow, &requester, step.state, SessionInput::Venue(Venue::Bar)).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("Sami".into())).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("1".into())).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("2025-07-01".into())).await;

        assert!(matches!(
            step.reply,
            Some(SessionReply::ConfirmationPrompt { remaining_after: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_payment_reference_digits_only() {
        let store = Arc::new(MemoryStore::new());
        let (flow, mut rx) = flow_over(store.clone(), Arc::new(TimestampCodeIssuer::new("OASIS")));
        let requester = RequesterId::new("14002");

        let state = walk_to_payment(&flow, &requester, "2").await;

        let step = drive(&flow, &requester, state, SessionInput::Text("12a34".into())).await;
        assert_eq!(step.reply, Some(SessionReply::InvalidPaymentReference));
        assert!(matches!(step.state, SessionState::AwaitingPaymentReference { .. }));
        assert!(store.list_pending().await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());

        let step = drive(&flow, &requester, step.state, SessionInput::Text("12345".into())).await;
        assert!(matches!(step.reply, Some(SessionReply::Committed { .. })));
        assert_eq!(store.list_pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_discards_without_writing() {
        let store = Arc::new(MemoryStore::new());
        let (flow, mut rx) = flow_over(store.clone(), Arc::new(TimestampCodeIssuer::new("OASIS")));
        let requester = RequesterId::new("14002");

        let step = flow.begin();
        let step = drive(&flow, &requester, step.state, SessionInput::Venue(Venue::Bar)).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("Sami".into())).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("3".into())).await;
        let step = drive(&flow, &requester, step.state, SessionInput::Text("2025-07-01".into())).await;

        // Declining the summary card discards everything
        let step = drive(&flow, &requester, step.state, SessionInput::Abort).await;
        assert_eq!(step.state, SessionState::Idle);
        assert_eq!(step.reply, Some(SessionReply::Cancelled));
        assert!(store.list_pending().await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reentry_restarts_at_venue_selection() {
        let store = Arc::new(MemoryStore::new());
        let (flow, _rx) = flow_over(store, Arc::new(TimestampCodeIssuer::new("OASIS")));
        let requester = RequesterId::new("14002");

        let step = flow.begin();
        let step = drive(&flow, &requester, step.state, SessionInput::Venue(Venue::Bar)).await;
        let _ = drive(&flow, &requester, step.state, SessionInput::Text("Sami".into())).await;

        // Starting over mid-flow drops the collected fields
        let step = flow.begin();
        assert_eq!(step.state, SessionState::AwaitingVenue);
        assert_eq!(step.reply, Some(SessionReply::VenuePrompt));
    }

    #[tokio::test]
    async fn test_duplicate_code_is_surfaced_and_state_kept() {
        let store = Arc::new(MemoryStore::new());
        let (flow, mut rx) = flow_over(store.clone(), Arc::new(MockCodeIssuer("OASIS1".to_string())));

        let first = RequesterId::new("14002");
        let state = walk_to_payment(&flow, &first, "2").await;
        let step = drive(&flow, &first, state, SessionInput::Text("111222".into())).await;
        assert!(matches!(step.reply, Some(SessionReply::Committed { .. })));
        let _ = rx.try_recv();

        // Second commit draws the same code and must fail loudly
        let second = RequesterId::new("14003");
        let state = walk_to_payment(&flow, &second, "2").await;
        let step = drive(&flow, &second, state, SessionInput::Text("333444".into())).await;

        assert_eq!(step.reply, Some(SessionReply::CodeConflict));
        assert!(matches!(step.state, SessionState::AwaitingPaymentReference { .. }));
        assert!(rx.try_recv().is_err());

        // The original row is untouched
        let kept = store.find_by_code("OASIS1").await.unwrap().unwrap();
        assert_eq!(kept.requester, first);
        assert_eq!(kept.payment_reference, "111222");
    }

    #[tokio::test]
    async fn test_text_during_button_steps_keeps_state() {
        let store = Arc::new(MemoryStore::new());
        let (flow, _rx) = flow_over(store, Arc::new(TimestampCodeIssuer::new("OASIS")));
        let requester = RequesterId::new("14002");

        let step = flow.begin();
        let step = drive(&flow, &requester, step.state, SessionInput::Text("bar please".into())).await;
        assert_eq!(step.state, SessionState::AwaitingVenue);
        assert_eq!(step.reply, Some(SessionReply::NotUnderstood));

        // A stray confirm press before any summary card is dropped
        let step = drive(&flow, &requester, step.state, SessionInput::Confirm).await;
        assert_eq!(step.state, SessionState::AwaitingVenue);
        assert_eq!(step.reply, None);
    }
}
