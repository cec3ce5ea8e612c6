//! Authenticated principal supplied by the access gate

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Role granted by the access gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Client,
}

/// JWT claims issued by the external access gate.
///
/// A `client` principal carries the id of its own Client record; staff and
/// admins usually carry none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalClaims {
    pub sub: String,
    pub role: Role,
    pub client_id: Option<i32>,
    /// Login email, used to resolve the Client when no client_id is bound
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl PrincipalClaims {
    /// Create a JWT token (used by tooling and tests; production tokens come from the gate)
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Staff)
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization("Staff privileges required".to_string()))
        }
    }

    /// Client id a client principal is bound to
    fn own_client_id(&self) -> Result<i32, AppError> {
        self.client_id.ok_or_else(|| {
            AppError::Authorization("Principal is not bound to a client".to_string())
        })
    }

    /// Resolve which client an operation targets.
    ///
    /// Staff may target any client but must name one; a client principal
    /// always targets itself and may not name someone else.
    pub fn target_client(&self, requested: Option<i32>) -> Result<i32, AppError> {
        if self.is_staff() {
            return requested
                .ok_or_else(|| AppError::BadRequest("client_id is required".to_string()));
        }
        let own = self.own_client_id()?;
        match requested {
            Some(id) if id != own => Err(AppError::Authorization(
                "Clients may only act on their own records".to_string(),
            )),
            _ => Ok(own),
        }
    }

    /// Like `target_client`, but staff may leave the client unspecified (all clients)
    pub fn scope_client(&self, requested: Option<i32>) -> Result<Option<i32>, AppError> {
        if self.is_staff() {
            return Ok(requested);
        }
        self.target_client(requested).map(Some)
    }

    pub fn require_client_access(&self, client_id: i32) -> Result<(), AppError> {
        self.target_client(Some(client_id)).map(|_| ())
    }
}
