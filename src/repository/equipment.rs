//! Equipment repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::equipment::{CreateEquipment, Equipment, EquipmentCategory, UpdateEquipment},
};

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List equipment ordered by category then name
    pub async fn list(&self, active_only: bool) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, Equipment>(
            r#"
            SELECT * FROM equipment
            WHERE ($1 = FALSE OR active = TRUE)
            ORDER BY category, name, id
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Create equipment
    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (name, category, description, active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(data.category.unwrap_or(EquipmentCategory::Other))
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update equipment
    pub async fn update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment> {
        let now = Utc::now();
        let mut sets = vec!["modif_date = $1".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.name, "name");
        add_field!(data.category, "category");
        add_field!(data.description, "description");
        add_field!(data.active, "active");

        let query = format!(
            "UPDATE equipment SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Equipment>(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.name);
        bind_field!(data.category);
        bind_field!(data.description);
        bind_field!(data.active);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Retire equipment; its standing reservations are kept
    pub async fn deactivate(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>(
            "UPDATE equipment SET active = FALSE, modif_date = $1 WHERE id = $2 RETURNING *",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Hard delete (cascades to reservations)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        Ok(())
    }
}
