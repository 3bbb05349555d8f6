use std::sync::Arc;

use chrono::Utc;
use oasis_booking::{
    ApprovalError, ApprovalService, BookingFlow, SessionInput, SessionReply, SessionState,
};
use oasis_core::ReservationStore;
use oasis_shared::RequesterId;
use oasis_store::app_config::BusinessRules;
use serde::Deserialize;
use tracing::{error, warn};

use crate::commands::{CallbackAction, Command};
use crate::texts;
use crate::transport::{ChatTransport, Keyboard, OutboundMessage};

/// One inbound chat event, as the relay delivers it: either a message
/// with text or a pressed inline button with its callback data.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUpdate {
    pub requester_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub message: Option<InboundMessage>,
    #[serde(default)]
    pub callback: Option<InboundCallback>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundCallback {
    pub data: String,
}

/// Turns inbound updates into conversation transitions, operator
/// operations and outbound messages.
///
/// The gateway itself holds no per-requester state; the session worker
/// owns the `SessionState` and passes it in for every event, so one
/// requester's events are applied strictly in order.
pub struct Gateway {
    flow: BookingFlow,
    approvals: ApprovalService,
    reservations: Arc<dyn ReservationStore>,
    transport: Arc<dyn ChatTransport>,
    rules: BusinessRules,
}

impl Gateway {
    pub fn new(
        flow: BookingFlow,
        approvals: ApprovalService,
        reservations: Arc<dyn ReservationStore>,
        transport: Arc<dyn ChatTransport>,
        rules: BusinessRules,
    ) -> Self {
        Self {
            flow,
            approvals,
            reservations,
            transport,
            rules,
        }
    }

    pub async fn apply(&self, update: ChatUpdate, state: &mut SessionState) {
        let requester = RequesterId::new(update.requester_id.clone());

        if let Some(callback) = &update.callback {
            match CallbackAction::parse(&callback.data) {
                Some(CallbackAction::Approve(code)) => {
                    self.handle_approve(&requester, &code).await;
                }
                Some(CallbackAction::Venue(venue)) => {
                    self.advance(&requester, state, SessionInput::Venue(venue)).await;
                }
                Some(CallbackAction::Confirm) => {
                    self.advance(&requester, state, SessionInput::Confirm).await;
                }
                Some(CallbackAction::Cancel) => {
                    self.advance(&requester, state, SessionInput::Abort).await;
                }
                None => warn!("Dropping unrecognized callback payload '{}'", callback.data),
            }
            return;
        }

        let Some(message) = &update.message else {
            return;
        };
        let text = message.text.trim();

        if let Some(command) = Command::parse(text) {
            self.handle_command(&update, &requester, state, command).await;
            return;
        }

        // Outside a flow, free text gets the help reply; inside, it is
        // the flow's input.
        if matches!(state, SessionState::Idle) {
            let keyboard = self.menu_keyboard(&requester).await;
            self.send(&requester, texts::fallback(), Some(keyboard)).await;
            return;
        }
        self.advance(&requester, state, SessionInput::Text(text.to_string()))
            .await;
    }

    async fn handle_command(
        &self,
        update: &ChatUpdate,
        requester: &RequesterId,
        state: &mut SessionState,
        command: Command,
    ) {
        match command {
            Command::Start => {
                // /start always lands on the menu, abandoning any flow
                *state = SessionState::Idle;
                let operator = self.approvals.operator_record(requester).await.ok().flatten();
                let keyboard = texts::menu_keyboard(operator.is_some());
                let text = texts::welcome(Utc::now().date_naive(), operator.as_ref());
                self.send(requester, text, Some(keyboard)).await;
            }
            Command::Book => {
                let step = self.flow.begin();
                *state = step.state;
                if let Some(reply) = step.reply {
                    self.render(requester, reply).await;
                }
            }
            Command::Cancel => {
                let step = self.flow.cancel();
                *state = step.state;
                let keyboard = self.menu_keyboard(requester).await;
                self.send(requester, texts::cancelled(), Some(keyboard)).await;
            }
            Command::Status => self.show_status(requester).await,
            Command::MyId => self.show_identity(update, requester).await,
            Command::Pending => self.show_pending(requester).await,
            Command::Approved => self.show_approved(requester).await,
            Command::Reject { code, reason } => {
                let text = match self.approvals.reject(requester, &code, reason.clone()).await {
                    Ok(()) => texts::reject_done(&code, reason.as_deref()),
                    Err(err) => self.approval_error_text(err),
                };
                self.send(requester, text, None).await;
            }
            Command::Promote {
                identity,
                username,
                full_name,
            } => {
                let text = match self
                    .approvals
                    .promote(requester, RequesterId::new(identity), username, full_name)
                    .await
                {
                    Ok(record) => texts::promote_done(&record),
                    Err(err) => self.approval_error_text(err),
                };
                self.send(requester, text, None).await;
            }
            Command::Demote { identity } => {
                let identity = RequesterId::new(identity);
                let text = match self.approvals.demote(requester, &identity).await {
                    Ok(()) => texts::demote_done(identity.as_str()),
                    Err(err) => self.approval_error_text(err),
                };
                self.send(requester, text, None).await;
            }
            Command::Operators => {
                let text = match self.approvals.list_operators(requester).await {
                    Ok(operators) if operators.is_empty() => texts::no_operators(),
                    Ok(operators) => texts::operators_list(&operators),
                    Err(err) => self.approval_error_text(err),
                };
                self.send(requester, text, None).await;
            }
        }
    }

    /// The approve affordance works from any conversation state; it
    /// never touches the operator's own booking flow.
    async fn handle_approve(&self, requester: &RequesterId, code: &str) {
        let text = match self.approvals.approve(requester, code).await {
            Ok(reservation) => texts::approve_done(&reservation.code),
            Err(err) => self.approval_error_text(err),
        };
        self.send(requester, text, None).await;
    }

    async fn show_status(&self, requester: &RequesterId) {
        let reservations = match self.reservations.list_by_requester(requester).await {
            Ok(list) => list,
            Err(err) => {
                error!("Failed to list reservations for {}: {}", requester, err);
                self.send(requester, texts::generic_failure(), None).await;
                return;
            }
        };

        if reservations.is_empty() {
            self.send(requester, texts::no_reservations(), None).await;
            return;
        }
        for reservation in &reservations {
            let card = texts::status_card(reservation, &self.rules.currency);
            self.send(requester, card, None).await;
        }
    }

    async fn show_identity(&self, update: &ChatUpdate, requester: &RequesterId) {
        let reservations = self
            .reservations
            .list_by_requester(requester)
            .await
            .unwrap_or_default();
        let last_status = reservations.last().map(|r| &r.status);
        let operator = self
            .approvals
            .is_operator(requester)
            .await
            .unwrap_or(false);

        let text = texts::identity_card(
            requester.as_str(),
            update.display_name.as_deref(),
            update.username.as_deref(),
            reservations.len(),
            last_status,
            operator,
            Utc::now().date_naive(),
        );
        self.send(requester, text, None).await;
    }

    async fn show_pending(&self, requester: &RequesterId) {
        let pending = match self.approvals.pending(requester).await {
            Ok(list) => list,
            Err(err) => {
                let text = self.approval_error_text(err);
                self.send(requester, text, None).await;
                return;
            }
        };

        if pending.is_empty() {
            self.send(requester, texts::no_pending(), None).await;
            return;
        }

        let total_people: i64 = pending.iter().map(|r| r.party_size).sum();
        self.send(requester, texts::pending_summary(pending.len(), total_people), None)
            .await;
        for reservation in &pending {
            let card = texts::pending_card(reservation, &self.rules.currency);
            self.send(requester, card, Some(texts::approve_keyboard(&reservation.code)))
                .await;
        }
    }

    async fn show_approved(&self, requester: &RequesterId) {
        let approved = match self.approvals.approved(requester).await {
            Ok(list) => list,
            Err(err) => {
                let text = self.approval_error_text(err);
                self.send(requester, text, None).await;
                return;
            }
        };

        if approved.is_empty() {
            self.send(requester, texts::no_approved(), None).await;
            return;
        }

        let total_people: i64 = approved.iter().map(|r| r.party_size).sum();
        let total_amount: i64 = approved.iter().map(|r| r.amount).sum();
        self.send(
            requester,
            texts::approved_summary(approved.len(), total_people, total_amount, &self.rules.currency),
            None,
        )
        .await;
        for reservation in &approved {
            let card = texts::approved_card(reservation, &self.rules.currency);
            self.send(requester, card, None).await;
        }
    }

    async fn advance(&self, requester: &RequesterId, state: &mut SessionState, input: SessionInput) {
        match self.flow.advance(requester, state.clone(), input).await {
            Ok(step) => {
                *state = step.state;
                if let Some(reply) = step.reply {
                    self.render(requester, reply).await;
                }
            }
            // Unexpected store failure: keep the state, answer generically
            Err(err) => {
                error!("Store failure in session for {}: {}", requester, err);
                self.send(requester, texts::generic_failure(), None).await;
            }
        }
    }

    async fn render(&self, requester: &RequesterId, reply: SessionReply) {
        let (text, keyboard) = match reply {
            SessionReply::VenuePrompt => (texts::venue_prompt(), Some(texts::venue_keyboard())),
            SessionReply::NamePrompt { venue } => (texts::name_prompt(venue), None),
            SessionReply::PartySizePrompt => (texts::party_size_prompt(), None),
            SessionReply::InvalidPartySize => (texts::invalid_party_size(), None),
            SessionReply::DatePrompt => (texts::date_prompt(), None),
            SessionReply::InvalidDate => (texts::invalid_date(), None),
            SessionReply::CapacityExhausted { remaining } => {
                (texts::capacity_exhausted(remaining), None)
            }
            SessionReply::ConfirmationPrompt {
                draft,
                amount,
                remaining_after,
            } => (
                texts::confirmation_card(&draft, amount, remaining_after, &self.rules.currency),
                Some(texts::confirm_keyboard()),
            ),
            SessionReply::PaymentPrompt { amount } => (
                texts::payment_instructions(amount, &self.rules.currency, &self.rules.merchant_phone),
                None,
            ),
            SessionReply::InvalidPaymentReference => (texts::invalid_payment_reference(), None),
            SessionReply::Committed { reservation } => (texts::committed(&reservation), None),
            SessionReply::CodeConflict => (texts::code_conflict(), None),
            SessionReply::Cancelled => {
                let keyboard = self.menu_keyboard(requester).await;
                (texts::cancelled(), Some(keyboard))
            }
            SessionReply::NotUnderstood => (texts::fallback(), None),
        };
        self.send(requester, text, keyboard).await;
    }

    fn approval_error_text(&self, err: ApprovalError) -> String {
        match err {
            ApprovalError::PermissionDenied(_) => texts::permission_denied(),
            ApprovalError::ReservationNotFound(code) => texts::reservation_not_found(&code),
            ApprovalError::AlreadyOperator(identity) => texts::already_operator(identity.as_str()),
            ApprovalError::OperatorNotFound(identity) => texts::not_an_operator(identity.as_str()),
            ApprovalError::Store(err) => {
                error!("Store failure in operator command: {}", err);
                texts::generic_failure()
            }
        }
    }

    async fn menu_keyboard(&self, requester: &RequesterId) -> Keyboard {
        let operator = self
            .approvals
            .is_operator(requester)
            .await
            .unwrap_or(false);
        texts::menu_keyboard(operator)
    }

    /// Delivery is best effort: failures are logged and never reach the
    /// requester-visible flow.
    async fn send(&self, recipient: &RequesterId, text: String, keyboard: Option<Keyboard>) {
        let message = OutboundMessage {
            recipient: recipient.clone(),
            text,
            keyboard,
        };
        if let Err(err) = self.transport.deliver(message).await {
            error!("Failed to deliver message to {}: {}", recipient, err);
        }
    }
}
