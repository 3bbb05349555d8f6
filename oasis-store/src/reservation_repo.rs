use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use oasis_core::{ReservationStore, StoreError, StoreResult};
use oasis_shared::{RequesterId, Reservation, ReservationStatus, Venue};
use sqlx::SqlitePool;

pub struct SqliteReservationStore {
    pool: SqlitePool,
}

impl SqliteReservationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_list(&self, sql: &str) -> StoreResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.into_iter().map(ReservationRow::into_model).collect()
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ReservationRow {
    code: String,
    display_name: String,
    venue: String,
    party_size: i64,
    amount: i64,
    payment_reference: String,
    status: String,
    requester: String,
    created_at: DateTime<Utc>,
    reservation_date: NaiveDate,
}

impl ReservationRow {
    fn into_model(self) -> StoreResult<Reservation> {
        let venue = Venue::parse(&self.venue)
            .ok_or_else(|| StoreError::Backend(format!("unrecognized venue '{}'", self.venue)))?;
        let status = ReservationStatus::decode(&self.status)
            .ok_or_else(|| StoreError::Backend(format!("unrecognized status '{}'", self.status)))?;

        Ok(Reservation {
            code: self.code,
            display_name: self.display_name,
            venue,
            party_size: self.party_size,
            amount: self.amount,
            payment_reference: self.payment_reference,
            status,
            requester: RequesterId::new(self.requester),
            created_at: self.created_at,
            reservation_date: self.reservation_date,
        })
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

const SELECT_COLUMNS: &str = "SELECT code, display_name, venue, party_size, amount, \
     payment_reference, status, requester, created_at, reservation_date FROM reservations";

#[async_trait]
impl ReservationStore for SqliteReservationStore {
    async fn insert(&self, reservation: &Reservation) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO reservations
                (code, display_name, venue, party_size, amount, payment_reference, status, requester, created_at, reservation_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&reservation.code)
        .bind(&reservation.display_name)
        .bind(reservation.venue.as_str())
        .bind(reservation.party_size)
        .bind(reservation.amount)
        .bind(&reservation.payment_reference)
        .bind(reservation.status.encode())
        .bind(reservation.requester.as_str())
        .bind(reservation.created_at)
        .bind(reservation.reservation_date)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate(reservation.code.clone()))
            }
            Err(err) => Err(backend(err)),
        }
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Reservation>> {
        let row: Option<ReservationRow> =
            sqlx::query_as(&format!("{} WHERE code = ?1", SELECT_COLUMNS))
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        row.map(ReservationRow::into_model).transpose()
    }

    async fn list_pending(&self) -> StoreResult<Vec<Reservation>> {
        self.fetch_list(&format!(
            "{} WHERE status = 'pending' ORDER BY id",
            SELECT_COLUMNS
        ))
        .await
    }

    async fn list_approved(&self) -> StoreResult<Vec<Reservation>> {
        self.fetch_list(&format!(
            "{} WHERE status = 'approved' ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .await
    }

    async fn list_by_requester(&self, requester: &RequesterId) -> StoreResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> =
            sqlx::query_as(&format!("{} WHERE requester = ?1 ORDER BY id", SELECT_COLUMNS))
                .bind(requester.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;

        rows.into_iter().map(ReservationRow::into_model).collect()
    }

    async fn set_status_if_pending(
        &self,
        code: &str,
        status: &ReservationStatus,
    ) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE reservations SET status = ?1 WHERE code = ?2 AND status = 'pending'")
                .bind(status.encode())
                .bind(code)
                .execute(&self.pool)
                .await
                .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }
}
