//! Every requester- and operator-facing string, plus the keyboards that
//! go with them. Handlers stay free of literal text.

use chrono::NaiveDate;
use oasis_booking::Draft;
use oasis_shared::{OperatorRecord, Reservation, ReservationStatus, Venue};

use crate::transport::{Button, Keyboard};

pub const MENU_BOOK: &str = "📅 Book a table";
pub const MENU_STATUS: &str = "🔄 My reservations";
pub const MENU_MY_ID: &str = "🆔 My ID";
pub const MENU_PENDING: &str = "⏳ Pending requests";
pub const MENU_APPROVED: &str = "📋 Approved reservations";

pub fn venue_label(venue: Venue) -> &'static str {
    match venue {
        Venue::Bar => "Bar",
        Venue::WinterPool => "Winter pool side",
        Venue::KidsPool => "Kids pool side",
        Venue::SummerPool => "Summer pool side",
        Venue::HallSide => "Opposite the hall",
    }
}

/// `1234567` → `1,234,567`.
pub fn format_amount(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if amount < 0 {
        out.insert(0, '-');
    }
    out
}

fn status_line(status: &ReservationStatus) -> String {
    match status {
        ReservationStatus::Pending => "⏳ awaiting approval".to_string(),
        ReservationStatus::Approved => "✅ approved".to_string(),
        ReservationStatus::Rejected { reason: None } => "❌ rejected".to_string(),
        ReservationStatus::Rejected { reason: Some(r) } => format!("❌ rejected: {}", r),
    }
}

fn detail_card(reservation: &Reservation, currency: &str) -> String {
    format!(
        "🆔 Code: {}\n\
         👤 Name: {}\n\
         📍 Venue: {}\n\
         👥 Party size: {}\n\
         💰 Amount: {} {}\n\
         🔢 Transfer reference: {}\n\
         📅 Reservation date: {}",
        reservation.code,
        reservation.display_name,
        venue_label(reservation.venue),
        reservation.party_size,
        format_amount(reservation.amount),
        currency,
        reservation.payment_reference,
        reservation.reservation_date,
    )
}

// --- keyboards ---

pub fn menu_keyboard(operator: bool) -> Keyboard {
    let mut rows = vec![
        vec![MENU_BOOK.to_string(), MENU_STATUS.to_string()],
        vec![MENU_MY_ID.to_string()],
    ];
    if operator {
        rows.push(vec![MENU_PENDING.to_string(), MENU_APPROVED.to_string()]);
    }
    Keyboard::Menu { rows }
}

pub fn venue_keyboard() -> Keyboard {
    Keyboard::Inline {
        rows: Venue::ALL
            .iter()
            .map(|v| {
                vec![Button {
                    label: venue_label(*v).to_string(),
                    data: format!("venue:{}", v),
                }]
            })
            .collect(),
    }
}

pub fn confirm_keyboard() -> Keyboard {
    Keyboard::Inline {
        rows: vec![
            vec![Button {
                label: "✅ Confirm reservation".to_string(),
                data: "confirm".to_string(),
            }],
            vec![Button {
                label: "❌ Cancel".to_string(),
                data: "cancel".to_string(),
            }],
        ],
    }
}

pub fn approve_keyboard(code: &str) -> Keyboard {
    Keyboard::Inline {
        rows: vec![vec![Button {
            label: "✅ Approve reservation".to_string(),
            data: format!("approve:{}", code),
        }]],
    }
}

// --- menu and flow prompts ---

pub fn welcome(today: NaiveDate, operator: Option<&OperatorRecord>) -> String {
    let mut msg = format!("✨ Welcome to the Oasis resort ✨\n📅 Today: {}\n", today);
    if let Some(op) = operator {
        msg.push_str("\n👑 You are an operator");
        if let Some(name) = &op.full_name {
            msg.push_str(&format!(": {}", name));
        }
        msg.push('\n');
        if let Some(username) = &op.username {
            msg.push_str(&format!("📌 Username: @{}\n", username));
        }
    }
    msg.push_str("\nChoose from the menu:");
    msg
}

pub fn venue_prompt() -> String {
    "📍 Pick a table location:".to_string()
}

pub fn name_prompt(venue: Venue) -> String {
    format!(
        "📍 {}\n📝 Please enter the full name for the reservation:",
        venue_label(venue)
    )
}

pub fn party_size_prompt() -> String {
    "👥 How many people? (numbers only)".to_string()
}

pub fn invalid_party_size() -> String {
    "⚠️ Please enter a positive whole number".to_string()
}

pub fn date_prompt() -> String {
    "📅 Please enter the reservation date (YYYY-MM-DD):".to_string()
}

pub fn invalid_date() -> String {
    "⚠️ That date doesn't parse. Please use the YYYY-MM-DD format".to_string()
}

pub fn capacity_exhausted(remaining: i64) -> String {
    format!(
        "⚠️ That party exceeds the remaining capacity ({}). Please enter a smaller number",
        remaining
    )
}

pub fn confirmation_card(draft: &Draft, amount: i64, remaining_after: i64, currency: &str) -> String {
    format!(
        "📋 Reservation details:\n\n\
         📍 Venue: {}\n\
         👤 Name: {}\n\
         👥 Party size: {}\n\
         📅 Reservation date: {}\n\
         💰 Total price: {} {}\n\
         🪑 Seats left afterwards: {}\n\n\
         Confirm this reservation?",
        venue_label(draft.venue),
        draft.name,
        draft.party_size,
        draft.date,
        format_amount(amount),
        currency,
        remaining_after,
    )
}

pub fn payment_instructions(amount: i64, currency: &str, merchant_phone: &str) -> String {
    format!(
        "💰 How to pay:\n\n\
         1. Transfer {} {} to {}\n\
         2. Send the transfer reference number once the payment is done\n\n\
         Please enter the transfer reference number:",
        format_amount(amount),
        currency,
        merchant_phone,
    )
}

pub fn invalid_payment_reference() -> String {
    "⚠️ That reference is not valid. Please enter the transfer reference number (digits only):"
        .to_string()
}

pub fn committed(reservation: &Reservation) -> String {
    format!(
        "✅ Your reservation request is in\n\n\
         Your details:\n\
         Code: {}\n\
         Transfer reference: {}\n\
         📅 Reservation date: {}\n\n\
         We will review it and let you know shortly.\n\
         Use /status any time to check on it.\n\n\
         Thank you for choosing us!",
        reservation.code, reservation.payment_reference, reservation.reservation_date,
    )
}

pub fn code_conflict() -> String {
    "⚠️ Something went wrong saving the reservation. Please send the transfer reference again."
        .to_string()
}

pub fn cancelled() -> String {
    "❌ Reservation cancelled".to_string()
}

pub fn fallback() -> String {
    "Sorry, I don't understand that.\nPlease use the menu buttons or send /start to begin again."
        .to_string()
}

pub fn generic_failure() -> String {
    "⚠️ Something went wrong on our side. Please try again.".to_string()
}

// --- requester views ---

pub fn no_reservations() -> String {
    "You have no reservations on record.".to_string()
}

pub fn status_card(reservation: &Reservation, currency: &str) -> String {
    let mut msg = format!(
        "🔄 Reservation status:\n\n{}\n📌 Status: {}\n",
        detail_card(reservation, currency),
        status_line(&reservation.status),
    );
    if reservation.status == ReservationStatus::Approved {
        msg.push_str("\n🎉 Your reservation was approved. Enjoy!");
    }
    msg
}

pub fn identity_card(
    identity: &str,
    display_name: Option<&str>,
    username: Option<&str>,
    total_reservations: usize,
    last_status: Option<&ReservationStatus>,
    operator: bool,
    today: NaiveDate,
) -> String {
    let mut msg = format!(
        "🆔 Your details:\n\n\
         - ID: {}\n\
         - Name: {}\n\
         - Username: @{}\n\
         - Reservations: {}",
        identity,
        display_name.unwrap_or("not set"),
        username.unwrap_or("not set"),
        total_reservations,
    );
    if let Some(status) = last_status {
        msg.push_str(&format!("\n📅 Latest reservation: {}", status_line(status)));
    }
    if operator {
        msg.push_str("\n👑 You are an operator");
    }
    msg.push_str(&format!("\n\n📅 Today: {}", today));
    msg
}

// --- operator views ---

pub fn permission_denied() -> String {
    "⚠️ You are not allowed to do that".to_string()
}

pub fn no_pending() -> String {
    "No reservations are waiting for approval".to_string()
}

pub fn pending_summary(count: usize, total_people: i64) -> String {
    format!(
        "📊 Pending reservations:\n\
         • Requests waiting: {}\n\
         • Total people: {}\n\n\
         Details:",
        count, total_people,
    )
}

pub fn pending_card(reservation: &Reservation, currency: &str) -> String {
    detail_card(reservation, currency)
}

pub fn no_approved() -> String {
    "No reservations have been approved yet.".to_string()
}

pub fn approved_summary(count: usize, total_people: i64, total_amount: i64, currency: &str) -> String {
    format!(
        "📊 Approved reservations:\n\
         • Reservations: {}\n\
         • Total people: {}\n\
         • Total amount: {} {}\n\n\
         Details:",
        count,
        total_people,
        format_amount(total_amount),
        currency,
    )
}

pub fn approved_card(reservation: &Reservation, currency: &str) -> String {
    format!(
        "{}\n👤 Requester: {}",
        detail_card(reservation, currency),
        reservation.requester,
    )
}

pub fn approve_done(code: &str) -> String {
    format!(
        "✅ Reservation {} approved\nThe requester has been notified",
        code
    )
}

pub fn reservation_not_found(code: &str) -> String {
    format!("⚠️ No pending reservation found for {}", code)
}

pub fn reject_done(code: &str, reason: Option<&str>) -> String {
    let mut msg = format!("✅ Reservation {} rejected", code);
    if let Some(reason) = reason {
        msg.push_str(&format!("\n📝 Reason: {}", reason));
    }
    msg
}

pub fn promote_done(record: &OperatorRecord) -> String {
    format!(
        "✅ Promoted to operator:\n\
         🆔 ID: {}\n\
         📌 Username: @{}\n\
         📛 Name: {}",
        record.identity,
        record.username.as_deref().unwrap_or("none"),
        record.full_name.as_deref().unwrap_or("not set"),
    )
}

pub fn already_operator(identity: &str) -> String {
    format!("⚠️ {} is already an operator", identity)
}

pub fn demote_done(identity: &str) -> String {
    format!("✅ Operator rights removed from {}", identity)
}

pub fn not_an_operator(identity: &str) -> String {
    format!("⚠️ {} is not an operator", identity)
}

pub fn no_operators() -> String {
    "There are no operators yet".to_string()
}

pub fn operators_list(operators: &[OperatorRecord]) -> String {
    let mut msg = "📋 Operators:\n\n".to_string();
    for op in operators {
        msg.push_str(&format!(
            "🆔 ID: {}\n\
             📌 Username: @{}\n\
             📛 Name: {}\n\
             🕒 Promoted: {}\n\n",
            op.identity,
            op.username.as_deref().unwrap_or("none"),
            op.full_name.as_deref().unwrap_or("not set"),
            op.promoted_at.format("%Y-%m-%d %H:%M:%S"),
        ));
    }
    msg
}

// --- asynchronous notices ---

pub fn submission_notice(reservation: &Reservation, currency: &str) -> String {
    format!(
        "📣 New reservation awaiting approval:\n\n{}\n👤 Requester: {}",
        detail_card(reservation, currency),
        reservation.requester,
    )
}

pub fn approval_notice(reservation: &Reservation) -> String {
    format!(
        "🎉 Your reservation has been approved!\n\n\
         👤 Name: {}\n\
         🆔 Code: {}\n\
         📅 Reservation date: {}\n\n\
         Thank you for choosing us. Have a great time!",
        reservation.display_name, reservation.code, reservation.reservation_date,
    )
}
