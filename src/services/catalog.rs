//! Client catalog service: registration, lifecycle and identity lookup

use crate::{
    config::ClientsConfig,
    error::{AppError, AppResult},
    models::{
        client::{is_valid_national_id, non_blank, normalize_national_id, Client, CreateClient, UpdateClient},
        principal::PrincipalClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    config: ClientsConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: ClientsConfig) -> Self {
        Self { repository, config }
    }

    // ---- Clients ----

    pub async fn list_clients(&self, active_only: bool) -> AppResult<Vec<Client>> {
        self.repository.clients.list(active_only).await
    }

    pub async fn get_client(&self, id: i32) -> AppResult<Client> {
        self.repository.clients.get_by_id(id).await
    }

    /// Register a client.
    ///
    /// The national ID stays reserved by deactivated clients: registering it
    /// again is refused and the caller is pointed at the existing record,
    /// which can be reactivated instead.
    pub async fn create_client(&self, mut data: CreateClient) -> AppResult<Client> {
        data.national_id = normalize_national_id(&data.national_id);
        data.phone = non_blank(data.phone);
        data.email = non_blank(data.email);

        if data.national_id.is_empty() {
            return Err(AppError::Validation(
                "National ID has no letters or digits".to_string(),
            ));
        }
        if self.config.validate_national_id && !is_valid_national_id(&data.national_id) {
            return Err(AppError::Validation(format!(
                "'{}' is not a valid DNI/NIE",
                data.national_id
            )));
        }

        if let Some(existing) = self.repository.clients.get_by_national_id(&data.national_id).await? {
            let message = if existing.active {
                format!("National ID {} already belongs to client {}", data.national_id, existing.id)
            } else {
                format!(
                    "National ID {} belongs to deactivated client {}; reactivate it instead",
                    data.national_id, existing.id
                )
            };
            tracing::warn!("Rejected duplicate national ID for client {}", existing.id);
            return Err(AppError::DuplicateKey(message));
        }

        if let Some(ref email) = data.email {
            if self.repository.clients.email_exists(email, None).await? {
                return Err(AppError::DuplicateKey(format!("Email {} already registered", email)));
            }
        }

        let client = self.repository.clients.create(&data).await?;
        tracing::info!("Registered client {} {} ({})", client.id, client.full_name(), client.national_id);
        Ok(client)
    }

    pub async fn update_client(&self, id: i32, mut data: UpdateClient) -> AppResult<Client> {
        data.email = non_blank(data.email);
        if let Some(ref email) = data.email {
            if self.repository.clients.email_exists(email, Some(id)).await? {
                return Err(AppError::DuplicateKey(format!("Email {} already registered", email)));
            }
        }
        let client = self.repository.clients.update(id, &data).await?;
        if data.active == Some(true) {
            tracing::info!("Client {} reactivated", id);
        }
        Ok(client)
    }

    pub async fn deactivate_client(&self, id: i32) -> AppResult<Client> {
        let client = self.repository.clients.deactivate(id).await?;
        tracing::info!("Client {} deactivated", id);
        Ok(client)
    }

    pub async fn delete_client(&self, id: i32) -> AppResult<()> {
        self.repository.clients.delete(id).await?;
        tracing::info!("Client {} permanently deleted with its reservations and receipts", id);
        Ok(())
    }

    // ---- Identity lookup ----

    pub async fn find_by_national_id(&self, national_id: &str) -> AppResult<Client> {
        let normalized = normalize_national_id(national_id);
        self.repository
            .clients
            .get_by_national_id(&normalized)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No client with national ID {}", normalized)))
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Client> {
        self.repository
            .clients
            .get_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No client with email {}", email.trim())))
    }

    /// Map an authenticated principal to its Client record
    pub async fn resolve_principal(&self, claims: &PrincipalClaims) -> AppResult<Client> {
        if let Some(id) = claims.client_id {
            return self.get_client(id).await;
        }
        match claims.email {
            Some(ref email) => self.find_by_email(email).await,
            None => Err(AppError::NotFound(
                "Principal is not associated with a client".to_string(),
            )),
        }
    }
}
