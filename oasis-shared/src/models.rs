use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat identity of a requester or operator. Doubles as the delivery
/// address for outbound notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(pub String);

impl RequesterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bookable venue. The set is fixed; capacity lives in [`CapacityTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    Bar,
    WinterPool,
    KidsPool,
    SummerPool,
    HallSide,
}

impl Venue {
    pub const ALL: [Venue; 5] = [
        Venue::Bar,
        Venue::WinterPool,
        Venue::KidsPool,
        Venue::SummerPool,
        Venue::HallSide,
    ];

    /// Stable token used in storage and callback payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Bar => "bar",
            Venue::WinterPool => "winter_pool",
            Venue::KidsPool => "kids_pool",
            Venue::SummerPool => "summer_pool",
            Venue::HallSide => "hall_side",
        }
    }

    pub fn parse(token: &str) -> Option<Venue> {
        Venue::ALL.iter().copied().find(|v| v.as_str() == token)
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seats per venue. Process-wide immutable configuration, loaded at
/// startup and never derived from stored data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityTable {
    pub bar: i64,
    pub winter_pool: i64,
    pub kids_pool: i64,
    pub summer_pool: i64,
    pub hall_side: i64,
}

impl Default for CapacityTable {
    fn default() -> Self {
        Self {
            bar: 30,
            winter_pool: 50,
            kids_pool: 40,
            summer_pool: 60,
            hall_side: 45,
        }
    }
}

impl CapacityTable {
    pub fn seats(&self, venue: Venue) -> i64 {
        match venue {
            Venue::Bar => self.bar,
            Venue::WinterPool => self.winter_pool,
            Venue::KidsPool => self.kids_pool,
            Venue::SummerPool => self.summer_pool,
            Venue::HallSide => self.hall_side,
        }
    }
}

/// Reservation lifecycle status.
///
/// Wire and storage form is exactly `pending`, `approved`, `rejected` or
/// `rejected:<reason>`. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected { reason: Option<String> },
}

impl ReservationStatus {
    pub fn encode(&self) -> String {
        match self {
            ReservationStatus::Pending => "pending".to_string(),
            ReservationStatus::Approved => "approved".to_string(),
            ReservationStatus::Rejected { reason: None } => "rejected".to_string(),
            ReservationStatus::Rejected { reason: Some(r) } => format!("rejected:{}", r),
        }
    }

    pub fn decode(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "approved" => Some(ReservationStatus::Approved),
            "rejected" => Some(ReservationStatus::Rejected { reason: None }),
            other => other.strip_prefix("rejected:").map(|r| ReservationStatus::Rejected {
                reason: Some(r.to_string()),
            }),
        }
    }

    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Pending)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<ReservationStatus> for String {
    fn from(status: ReservationStatus) -> String {
        status.encode()
    }
}

impl TryFrom<String> for ReservationStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ReservationStatus::decode(&s).ok_or_else(|| format!("unrecognized status '{}'", s))
    }
}

/// A committed reservation request.
///
/// Created exactly once in `Pending` by the booking flow; moved to a
/// terminal status exactly once by the approval workflow; never deleted
/// and never mutated by the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique human-readable code issued at confirmation time.
    pub code: String,
    pub display_name: String,
    pub venue: Venue,
    pub party_size: i64,
    /// party_size × configured unit price, fixed at commit.
    pub amount: i64,
    /// Transfer reference as entered; digits only, never verified.
    pub payment_reference: String,
    pub status: ReservationStatus,
    pub requester: RequesterId,
    pub created_at: DateTime<Utc>,
    /// Calendar date being reserved; distinct from `created_at`.
    pub reservation_date: NaiveDate,
}

/// A privileged identity allowed to approve/reject reservations and to
/// manage other operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRecord {
    pub identity: RequesterId,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub promoted_at: DateTime<Utc>,
}

impl OperatorRecord {
    pub fn new(
        identity: RequesterId,
        username: Option<String>,
        full_name: Option<String>,
    ) -> Self {
        Self {
            identity,
            username,
            full_name,
            promoted_at: Utc::now(),
        }
    }
}
