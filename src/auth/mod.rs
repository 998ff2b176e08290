//! Bearer-token authentication and the actor model used for role gating.
//!
//! Credential management and password hashing live in a separate identity
//! service; this crate only verifies the JWT it issues and exposes the
//! resulting [`Actor`] to handlers via the [`AuthenticatedActor`] extractor.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{errors::ServiceError, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Restaurant,
    Kitchen,
    Supplier,
    /// Executive dashboard role; barred from inventory mutation.
    Pimpinan,
}

/// The authenticated principal a lifecycle command runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
    /// Meaningful only for restaurant and kitchen staff.
    pub branch_id: Option<i64>,
}

impl Actor {
    pub fn require_role(&self, role: Role, action: &str) -> Result<(), ServiceError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "only {} staff can {}",
                role, action
            )))
        }
    }

    /// Branch the actor belongs to, or an auth error when the role has none.
    pub fn own_branch(&self) -> Result<i64, ServiceError> {
        self.branch_id
            .ok_or_else(|| ServiceError::AuthError("actor has no branch".into()))
    }

    /// Restaurant or kitchen staff acting for their own branch; actions
    /// gated on branch identity rather than a single role use this.
    pub fn require_branch_staff(&self, action: &str) -> Result<i64, ServiceError> {
        if !matches!(self.role, Role::Restaurant | Role::Kitchen) {
            return Err(ServiceError::Forbidden(format!(
                "only branch staff can {}",
                action
            )));
        }
        self.own_branch()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub branch_id: Option<i64>,
    pub iat: i64,
    pub exp: i64,
}

/// Signs a token for the given actor. Used by the identity service and by
/// the test harness.
pub fn issue_token(secret: &str, actor: &Actor, ttl_secs: i64) -> Result<String, ServiceError> {
    let now = Utc::now();
    let claims = Claims {
        sub: actor.user_id,
        role: actor.role,
        branch_id: actor.branch_id,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::AuthError(format!("failed to sign token: {}", e)))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Actor, ServiceError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| ServiceError::AuthError(format!("invalid token: {}", e)))?;

    Ok(Actor {
        user_id: data.claims.sub,
        role: data.claims.role,
        branch_id: data.claims.branch_id,
    })
}

/// Axum extractor yielding the verified [`Actor`] from the Bearer header.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedActor(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedActor {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::AuthError("missing Authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::AuthError("expected Bearer token".into()))?;

        let actor = verify_token(&state.config.jwt_secret, token)?;
        Ok(AuthenticatedActor(actor))
    }
}
