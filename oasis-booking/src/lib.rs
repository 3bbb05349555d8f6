pub mod approval;
pub mod capacity;
pub mod codes;
pub mod notify;
pub mod session;

pub use approval::{ApprovalError, ApprovalService};
pub use capacity::{Admission, CapacityGate};
pub use codes::{CodeIssuer, MockCodeIssuer, TimestampCodeIssuer};
pub use notify::{Notice, NoticeQueue};
pub use session::{BookingFlow, Draft, SessionInput, SessionReply, SessionState, Step};
