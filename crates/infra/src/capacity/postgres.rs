//! Postgres-backed capacity gate.
//!
//! The check and the increment are a single conditional `UPDATE`, so the
//! database row lock serializes concurrent reservations for one event and a
//! rejected reservation never touches the counter.
//!
//! ## Error Mapping
//!
//! | Situation | CapacityError |
//! |-----------|---------------|
//! | `UPDATE` matched no row, event row missing | `UnknownEvent` |
//! | `UPDATE` matched no row, event row present | `CapacityExceeded` |
//! | any sqlx error | `Backend` |

use std::future::Future;
use std::sync::Arc;

use sqlx::{PgPool, Row};
use tracing::instrument;

use eventive_core::EventId;

use super::r#trait::{CapacityError, CapacityGate, Reservation};

const SCHEMA: &str = include_str!("../../migrations/0001_event_capacity.sql");

#[derive(Debug, Clone)]
pub struct PostgresCapacityGate {
    pool: Arc<PgPool>,
}

impl PostgresCapacityGate {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `event_capacity` table if it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), CapacityError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    /// Register (or update) an event's declared capacity. The reserved
    /// counter of an existing row is preserved.
    #[instrument(skip(self), fields(event_id = %event), err)]
    pub async fn declare_capacity(&self, event: &EventId, capacity: Option<u32>) -> Result<(), CapacityError> {
        let capacity = capacity.map(to_i32).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO event_capacity (event_id, capacity, reserved)
            VALUES ($1, $2, 0)
            ON CONFLICT (event_id)
            DO UPDATE SET capacity = EXCLUDED.capacity, updated_at = NOW()
            "#,
        )
        .bind(event.as_str())
        .bind(capacity)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("declare_capacity", e))?;

        Ok(())
    }

    /// Overwrite the reserved counter with a recount taken from the booking
    /// store. Run at startup, before any booking is admitted.
    #[instrument(skip(self), fields(event_id = %event, reserved), err)]
    pub async fn sync_reserved(&self, event: &EventId, reserved: u32) -> Result<(), CapacityError> {
        let reserved = to_i32(reserved)?;

        sqlx::query(
            r#"
            UPDATE event_capacity
            SET reserved = $2, updated_at = NOW()
            WHERE event_id = $1
            "#,
        )
        .bind(event.as_str())
        .bind(reserved)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("sync_reserved", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(event_id = %event, requested), err)]
    pub async fn try_reserve(&self, event: &EventId, requested: u32) -> Result<Reservation, CapacityError> {
        let slots = to_i32(requested)?;

        let updated = sqlx::query(
            r#"
            UPDATE event_capacity
            SET reserved = reserved + $2, updated_at = NOW()
            WHERE event_id = $1
              AND (capacity IS NULL OR reserved + $2 <= capacity)
            RETURNING reserved
            "#,
        )
        .bind(event.as_str())
        .bind(slots)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("reserve", e))?;

        if updated.is_some() {
            return Ok(Reservation::new(event.clone(), requested));
        }

        // Zero rows: either the event is unknown or it is full.
        let row = sqlx::query("SELECT capacity, reserved FROM event_capacity WHERE event_id = $1")
            .bind(event.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("reserve_lookup", e))?;

        let Some(row) = row else {
            return Err(CapacityError::UnknownEvent(event.clone()));
        };

        let capacity: Option<i32> = row
            .try_get("capacity")
            .map_err(|e| CapacityError::Backend(format!("failed to read capacity: {e}")))?;
        let reserved: i32 = row
            .try_get("reserved")
            .map_err(|e| CapacityError::Backend(format!("failed to read reserved: {e}")))?;

        let available = capacity.unwrap_or(i32::MAX).saturating_sub(reserved).max(0);

        Err(CapacityError::CapacityExceeded {
            event: event.clone(),
            requested,
            available: u32::try_from(available).unwrap_or(0),
        })
    }

    #[instrument(skip(self), fields(event_id = %reservation.event, slots = reservation.slots), err)]
    pub async fn release_slots(&self, reservation: &Reservation) -> Result<(), CapacityError> {
        let slots = to_i32(reservation.slots)?;

        sqlx::query(
            r#"
            UPDATE event_capacity
            SET reserved = GREATEST(reserved - $2, 0), updated_at = NOW()
            WHERE event_id = $1
            "#,
        )
        .bind(reservation.event.as_str())
        .bind(slots)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("release", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(event_id = %event), err)]
    pub async fn current_reserved(&self, event: &EventId) -> Result<u32, CapacityError> {
        let row = sqlx::query("SELECT reserved FROM event_capacity WHERE event_id = $1")
            .bind(event.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("reserved", e))?;

        let Some(row) = row else {
            return Ok(0);
        };
        let reserved: i32 = row
            .try_get("reserved")
            .map_err(|e| CapacityError::Backend(format!("failed to read reserved: {e}")))?;

        Ok(u32::try_from(reserved).unwrap_or(0))
    }
}

fn to_i32(value: u32) -> Result<i32, CapacityError> {
    i32::try_from(value).map_err(|_| CapacityError::Backend(format!("slot count {value} out of range")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> CapacityError {
    match err {
        sqlx::Error::Database(db_err) => {
            CapacityError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => CapacityError::Backend(format!("connection pool closed in {operation}")),
        other => CapacityError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

/// Drive an async gate call from the synchronous trait.
///
/// Booking work runs on blocking threads (`spawn_blocking`), which still carry
/// the runtime handle.
fn run_blocking<F>(fut: F) -> Result<F::Output, CapacityError>
where
    F: Future,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        CapacityError::Backend("PostgresCapacityGate requires a tokio runtime context".to_string())
    })?;
    Ok(tokio::task::block_in_place(|| handle.block_on(fut)))
}

impl CapacityGate for PostgresCapacityGate {
    fn reserve(&self, event: &EventId, requested: u32) -> Result<Reservation, CapacityError> {
        run_blocking(self.try_reserve(event, requested))?
    }

    fn release(&self, reservation: &Reservation) -> Result<(), CapacityError> {
        run_blocking(self.release_slots(reservation))?
    }

    fn reserved(&self, event: &EventId) -> Result<u32, CapacityError> {
        run_blocking(self.current_reserved(event))?
    }
}
