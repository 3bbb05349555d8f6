use std::sync::Arc;

use oasis_booking::Notice;
use oasis_core::OperatorDirectory;
use oasis_shared::Reservation;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::texts;
use crate::transport::{ChatTransport, OutboundMessage};

/// Drains the outbound notice queue and performs delivery.
///
/// Runs as one detached task for the process lifetime. Every delivery is
/// best effort: a failure is logged and never reaches the flow that
/// produced the notice, and the fan-out to operators continues past any
/// individual failure.
pub async fn run_dispatcher(
    mut notices: mpsc::Receiver<Notice>,
    operators: Arc<dyn OperatorDirectory>,
    transport: Arc<dyn ChatTransport>,
    currency: String,
) {
    info!("Notice dispatcher started");

    while let Some(notice) = notices.recv().await {
        match notice {
            Notice::ReservationSubmitted(reservation) => {
                fan_out_submission(&*operators, &*transport, &reservation, &currency).await;
            }
            Notice::ReservationApproved(reservation) => {
                let message = OutboundMessage {
                    recipient: reservation.requester.clone(),
                    text: texts::approval_notice(&reservation),
                    keyboard: None,
                };
                if let Err(err) = transport.deliver(message).await {
                    error!(
                        "Failed to notify requester {} of approval: {}",
                        reservation.requester, err
                    );
                }
            }
        }
    }

    info!("Notice dispatcher stopped");
}

async fn fan_out_submission(
    operators: &dyn OperatorDirectory,
    transport: &dyn ChatTransport,
    reservation: &Reservation,
    currency: &str,
) {
    let recipients = match operators.list().await {
        Ok(list) => list,
        Err(err) => {
            error!(
                "Failed to list operators for reservation {}: {}",
                reservation.code, err
            );
            return;
        }
    };

    for operator in recipients {
        let message = OutboundMessage {
            recipient: operator.identity.clone(),
            text: texts::submission_notice(reservation, currency),
            keyboard: Some(texts::approve_keyboard(&reservation.code)),
        };
        if let Err(err) = transport.deliver(message).await {
            error!("Failed to notify operator {}: {}", operator.identity, err);
        }
    }
}
