//! Reservations repository: the slot uniqueness space lives here

use chrono::{NaiveTime, Utc};
use sqlx::{Executor, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        reservation::{OccupiedSlotRow, Reservation, ReservationDetails},
        slot::{SlotTime, Weekday},
    },
};

const SLOT_CONSTRAINT: &str = "reservations_slot_key";

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation {} not found", id)))
    }

    /// True iff nothing holds this equipment/weekday/slot
    pub async fn is_free(&self, equipment_id: i32, weekday: Weekday, start: SlotTime) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reservations
                WHERE equipment_id = $1 AND weekday = $2 AND start_time = $3
            )
            "#,
        )
        .bind(equipment_id)
        .bind(weekday)
        .bind(start)
        .fetch_one(&self.pool)
        .await?;
        Ok(!taken)
    }

    /// Book every slot in `starts` or none of them.
    ///
    /// Reference checks, the availability check and the inserts share one
    /// transaction. The UNIQUE (equipment_id, weekday, start_time) constraint
    /// catches a concurrent booker that slipped in after the check; the whole
    /// batch is then rolled back and every slot taken by then is reported.
    pub async fn book(
        &self,
        client_id: i32,
        equipment_id: i32,
        weekday: Weekday,
        starts: &[SlotTime],
    ) -> AppResult<Vec<Reservation>> {
        let mut tx = self.pool.begin().await?;

        // FOR SHARE keeps a concurrent deactivation out until we commit
        let client_active: Option<bool> =
            sqlx::query_scalar("SELECT active FROM clients WHERE id = $1 FOR SHARE")
                .bind(client_id)
                .fetch_optional(&mut *tx)
                .await?;
        if client_active != Some(true) {
            return Err(AppError::InvalidReference(format!(
                "Client {} does not exist or is inactive",
                client_id
            )));
        }

        let equipment_active: Option<bool> =
            sqlx::query_scalar("SELECT active FROM equipment WHERE id = $1 FOR SHARE")
                .bind(equipment_id)
                .fetch_optional(&mut *tx)
                .await?;
        if equipment_active != Some(true) {
            return Err(AppError::InvalidReference(format!(
                "Equipment {} does not exist or is inactive",
                equipment_id
            )));
        }

        let taken = taken_slots(&mut *tx, equipment_id, weekday, starts).await?;
        if !taken.is_empty() {
            return Err(slot_conflict(&taken));
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(starts.len());
        for &start in starts {
            let row = sqlx::query_as::<_, Reservation>(
                r#"
                INSERT INTO reservations (client_id, equipment_id, weekday, start_time, end_time, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(client_id)
            .bind(equipment_id)
            .bind(weekday)
            .bind(start)
            .bind(start.end())
            .bind(now)
            .fetch_one(&mut *tx)
            .await;

            match row {
                Ok(row) => created.push(row),
                Err(e) if is_slot_violation(&e) => {
                    // A concurrent booker committed first: report everything it took
                    tx.rollback().await?;
                    let taken = taken_slots(&self.pool, equipment_id, weekday, starts).await?;
                    if taken.is_empty() {
                        return Err(slot_conflict(&[start]));
                    }
                    return Err(slot_conflict(&taken));
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Delete a reservation; the slot is free immediately
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Reservation {} not found", id)));
        }
        Ok(())
    }

    /// All reservations of a weekday, ordered by equipment name then start
    pub async fn list_by_day(&self, weekday: Weekday) -> AppResult<Vec<ReservationDetails>> {
        let rows = sqlx::query_as::<_, ReservationDetails>(
            r#"
            SELECT r.id, r.client_id, c.first_name AS client_first_name,
                   c.last_name AS client_last_name,
                   r.equipment_id, e.name AS equipment_name, e.category AS equipment_category,
                   r.weekday, r.start_time, r.end_time, r.created_at
            FROM reservations r
            JOIN clients c ON r.client_id = c.id
            JOIN equipment e ON r.equipment_id = e.id
            WHERE r.weekday = $1
            ORDER BY e.name, r.start_time
            "#,
        )
        .bind(weekday)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Standing reservations of one client, ordered by weekday then start
    pub async fn list_by_client(&self, client_id: i32) -> AppResult<Vec<ReservationDetails>> {
        let rows = sqlx::query_as::<_, ReservationDetails>(
            r#"
            SELECT r.id, r.client_id, c.first_name AS client_first_name,
                   c.last_name AS client_last_name,
                   r.equipment_id, e.name AS equipment_name, e.category AS equipment_category,
                   r.weekday, r.start_time, r.end_time, r.created_at
            FROM reservations r
            JOIN clients c ON r.client_id = c.id
            JOIN equipment e ON r.equipment_id = e.id
            WHERE r.client_id = $1
            ORDER BY r.weekday, r.start_time
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every occupied slot of a weekday in one round trip (occupancy grid input)
    pub async fn occupied_slots(&self, weekday: Weekday) -> AppResult<Vec<OccupiedSlotRow>> {
        let rows = sqlx::query_as::<_, OccupiedSlotRow>(
            r#"
            SELECT r.id AS reservation_id, r.equipment_id, r.start_time,
                   r.client_id, c.first_name AS client_first_name,
                   c.last_name AS client_last_name
            FROM reservations r
            JOIN clients c ON r.client_id = c.id
            WHERE r.weekday = $1
            "#,
        )
        .bind(weekday)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Slots of `starts` already held on this equipment and weekday, in order
async fn taken_slots<'e, E>(
    executor: E,
    equipment_id: i32,
    weekday: Weekday,
    starts: &[SlotTime],
) -> AppResult<Vec<SlotTime>>
where
    E: Executor<'e, Database = Postgres>,
{
    let times: Vec<NaiveTime> = starts.iter().map(|s| s.to_naive_time()).collect();
    let taken: Vec<SlotTime> = sqlx::query_scalar(
        r#"
        SELECT start_time FROM reservations
        WHERE equipment_id = $1 AND weekday = $2 AND start_time = ANY($3)
        ORDER BY start_time
        "#,
    )
    .bind(equipment_id)
    .bind(weekday)
    .bind(times)
    .fetch_all(executor)
    .await?;
    Ok(taken)
}

fn slot_conflict(slots: &[SlotTime]) -> AppError {
    AppError::SlotConflict {
        slots: slots.iter().map(|s| s.label().to_string()).collect(),
    }
}

fn is_slot_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(SLOT_CONSTRAINT)
        }
        _ => false,
    }
}
