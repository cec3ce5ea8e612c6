//! Clients repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{classify_write_error, AppError, AppResult},
    models::client::{Client, CreateClient, UpdateClient},
};

#[derive(Clone)]
pub struct ClientsRepository {
    pool: Pool<Postgres>,
}

impl ClientsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List clients ordered by surname then name
    pub async fn list(&self, active_only: bool) -> AppResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE ($1 = FALSE OR active = TRUE)
            ORDER BY last_name, first_name, id
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get client by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Client> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))
    }

    /// Get client by normalized national ID (active or not)
    pub async fn get_by_national_id(&self, national_id: &str) -> AppResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE national_id = $1")
            .bind(national_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    /// Get client by email, case-insensitively
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    /// Check if email already belongs to another client
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM clients
                WHERE LOWER(email) = LOWER($1) AND ($2::int IS NULL OR id != $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a client. Expects `national_id` already normalized.
    pub async fn create(&self, data: &CreateClient) -> AppResult<Client> {
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (first_name, last_name, national_id, phone, email, enrollment_date, active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING *
            "#,
        )
        .bind(data.first_name.trim())
        .bind(data.last_name.trim())
        .bind(&data.national_id)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(Utc::now().date_naive())
        .fetch_one(&self.pool)
        .await
        .map_err(classify_write_error)
    }

    /// Update a client
    pub async fn update(&self, id: i32, data: &UpdateClient) -> AppResult<Client> {
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

        add_field!(data.first_name, "first_name");
        add_field!(data.last_name, "last_name");
        add_field!(data.phone, "phone");
        add_field!(data.email, "email");
        add_field!(data.active, "active");

        let query = format!(
            "UPDATE clients SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Client>(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.first_name);
        bind_field!(data.last_name);
        bind_field!(data.phone);
        bind_field!(data.email);
        bind_field!(data.active);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify_write_error)?
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))
    }

    /// Soft delete: the client keeps its history and its national ID
    pub async fn deactivate(&self, id: i32) -> AppResult<Client> {
        sqlx::query_as::<_, Client>(
            "UPDATE clients SET active = FALSE, modif_date = $1 WHERE id = $2 RETURNING *",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))
    }

    /// Hard delete (cascades to reservations and receipts)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Client {} not found", id)));
        }
        Ok(())
    }
}
