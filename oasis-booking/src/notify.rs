use oasis_shared::Reservation;
use tokio::sync::mpsc;
use tracing::error;

/// Events that leave the booking core for human recipients.
#[derive(Debug, Clone)]
pub enum Notice {
    /// A new request entered the pending queue; fan out to every operator.
    ReservationSubmitted(Reservation),
    /// A pending request was approved; tell the requester.
    ReservationApproved(Reservation),
}

/// Sending half of the outbound notice channel.
///
/// Publishing is fire-and-forget: a full or closed channel is logged and
/// the notice dropped, never surfaced to the flow that produced it. A
/// dispatcher task owns the receiving half and performs delivery.
#[derive(Clone)]
pub struct NoticeQueue {
    tx: mpsc::Sender<Notice>,
}

impl NoticeQueue {
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Notice>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn publish(&self, notice: Notice) {
        if let Err(err) = self.tx.try_send(notice) {
            error!("Failed to enqueue notice: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use oasis_shared::{RequesterId, ReservationStatus, Venue};

    fn sample() -> Reservation {
        Reservation {
            code: "OASIS20250701120000".to_string(),
            display_name: "Sami".to_string(),
            venue: Venue::Bar,
            party_size: 2,
            amount: 20_000,
            payment_reference: "555001".to_string(),
            status: ReservationStatus::Pending,
            requester: RequesterId::new("14002"),
            created_at: Utc::now(),
            reservation_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_publish_delivers_in_order() {
        let (queue, mut rx) = NoticeQueue::bounded(8);

        queue.publish(Notice::ReservationSubmitted(sample()));
        queue.publish(Notice::ReservationApproved(sample()));

        assert!(matches!(rx.recv().await, Some(Notice::ReservationSubmitted(_))));
        assert!(matches!(rx.recv().await, Some(Notice::ReservationApproved(_))));
    }

    #[tokio::test]
    async fn test_publish_survives_closed_channel() {
        let (queue, rx) = NoticeQueue::bounded(1);
        drop(rx);

        // Logged and dropped, no panic, no error surfaced
        queue.publish(Notice::ReservationApproved(sample()));
    }
}
