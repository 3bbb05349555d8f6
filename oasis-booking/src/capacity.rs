use oasis_shared::{CapacityTable, Reservation, Venue};

/// Outcome of an admission check for one venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Room for the whole party; `remaining_after` is shown on the
    /// confirmation card.
    Granted { remaining_after: i64 },
    /// The venue is saturated with pending requests; `remaining` is
    /// disclosed to the requester.
    Exhausted { remaining: i64 },
}

/// Admission control over the fixed per-venue capacity table.
///
/// Remaining seats are computed from a caller-supplied scan of pending
/// reservations: configured seats minus one per pending request at the
/// venue. Approved and rejected records never count, and the requested
/// date is ignored. The scan and any later insert are separate store
/// calls, so under concurrency the answer is advisory, not a hold.
pub struct CapacityGate {
    table: CapacityTable,
}

impl CapacityGate {
    pub fn new(table: CapacityTable) -> Self {
        Self { table }
    }

    /// Seats still open at a venue given the current pending set.
    pub fn remaining(&self, venue: Venue, pending: &[Reservation]) -> i64 {
        let held = pending.iter().filter(|r| r.venue == venue).count() as i64;
        self.table.seats(venue) - held
    }

    /// Decides whether a party may proceed to the confirmation step.
    pub fn admit(&self, venue: Venue, party_size: i64, pending: &[Reservation]) -> Admission {
        let remaining = self.remaining(venue, pending);
        if party_size > remaining {
            Admission::Exhausted { remaining }
        } else {
            Admission::Granted {
                remaining_after: remaining - party_size,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use oasis_shared::{RequesterId, ReservationStatus};

    fn pending_at(venue: Venue, count: usize) -> Vec<Reservation> {
        (0..count)
            .map(|i| Reservation {
                code: format!("OASIS20250701{:06}", i),
                display_name: format!("guest {}", i),
                venue,
                party_size: 4,
                amount: 40_000,
                payment_reference: "1234567".to_string(),
                status: ReservationStatus::Pending,
                requester: RequesterId::new(format!("req-{}", i)),
                created_at: Utc::now(),
                reservation_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_remaining_counts_requests_not_people() {
        let gate = CapacityGate::new(CapacityTable::default());

        // 25 pending parties of 4 hold 25 of the bar's 30 seats, not 100
        let pending = pending_at(Venue::Bar, 25);
        assert_eq!(gate.remaining(Venue::Bar, &pending), 5);
    }

    #[test]
    fn test_last_seats_admission() {
        let gate = CapacityGate::new(CapacityTable::default());
        let pending = pending_at(Venue::Bar, 25);

        // 6 against the 5 remaining is refused with the figure disclosed
        assert_eq!(
            gate.admit(Venue::Bar, 6, &pending),
            Admission::Exhausted { remaining: 5 }
        );

        // 5 exactly fills the venue
        assert_eq!(
            gate.admit(Venue::Bar, 5, &pending),
            Admission::Granted { remaining_after: 0 }
        );
    }

    #[test]
    fn test_other_venues_do_not_count() {
        let gate = CapacityGate::new(CapacityTable::default());

        let pending = pending_at(Venue::SummerPool, 10);
        assert_eq!(gate.remaining(Venue::Bar, &pending), 30);
    }
}
