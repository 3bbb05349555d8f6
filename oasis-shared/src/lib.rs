pub mod models;

pub use models::{
    CapacityTable, OperatorRecord, RequesterId, Reservation, ReservationStatus, Venue,
};
