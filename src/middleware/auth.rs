use crate::core::{AppError, Result as AppResult};
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Paths reachable without a bearer token
pub const PUBLIC_PATHS: &[&str] = &["/", "/health", "/ready", "/payments/webhook"];

/// Platform role attached to a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    PlatformAdmin,
    SchoolAdmin,
    SchoolStaff,
    Parent,
}

impl Role {
    pub fn is_platform_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::PlatformAdmin)
    }

    pub fn is_school_staff(&self) -> bool {
        matches!(self, Role::SchoolAdmin | Role::SchoolStaff)
    }
}

/// Authenticated caller, as yielded by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub school_id: Option<Uuid>,
    pub is_active: bool,
}

impl Actor {
    pub fn ensure_active(&self) -> AppResult<()> {
        if !self.is_active {
            return Err(AppError::forbidden("Account is inactive"));
        }
        Ok(())
    }

    /// School-stage actions: school admin or staff acting on their own school
    pub fn ensure_school_member(&self, school_id: Uuid) -> AppResult<()> {
        self.ensure_active()?;

        if !self.role.is_school_staff() {
            return Err(AppError::forbidden(
                "Only school administrators or staff can perform this action",
            ));
        }

        if self.school_id != Some(school_id) {
            return Err(AppError::forbidden("Caller does not belong to this school"));
        }

        Ok(())
    }

    /// Admin-stage actions: super admin or platform admin
    pub fn ensure_platform_admin(&self) -> AppResult<()> {
        self.ensure_active()?;

        if !self.role.is_platform_admin() {
            return Err(AppError::forbidden(
                "Only platform administrators can perform this action",
            ));
        }

        Ok(())
    }

    /// Read access: platform admins, or staff of the given school
    pub fn ensure_can_view_school(&self, school_id: Uuid) -> AppResult<()> {
        if self.role.is_platform_admin() {
            return self.ensure_active();
        }
        self.ensure_school_member(school_id)
    }
}

impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Actor>()
                .cloned()
                .ok_or_else(|| AppError::unauthorized("Missing authenticated caller")),
        )
    }
}

/// Resolves a bearer token to the calling actor
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> AppResult<Option<Actor>>;
}

/// Looks bearer tokens up in `api_keys` by their SHA-256 digest
pub struct PgIdentityResolver {
    pool: PgPool,
}

impl PgIdentityResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityResolver for PgIdentityResolver {
    async fn resolve(&self, token: &str) -> AppResult<Option<Actor>> {
        let actor = sqlx::query_as::<_, Actor>(
            r#"
            SELECT p.id AS user_id, p.role, p.school_id, p.is_active
            FROM api_keys k
            JOIN profiles p ON p.id = k.profile_id
            WHERE k.key_hash = $1 AND k.is_active = TRUE
            LIMIT 1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref actor) = actor {
            // best effort; a failed timestamp write must not block the request
            if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE key_hash = $1")
                .bind(hash_token(token))
                .execute(&self.pool)
                .await
            {
                tracing::warn!(user_id = %actor.user_id, error = %e, "Failed to record API key usage");
            }
        }

        Ok(actor)
    }
}

/// Hex SHA-256 digest stored in `api_keys.key_hash`
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Bearer token authentication middleware
pub struct Authenticate {
    resolver: Arc<dyn IdentityResolver>,
}

impl Authenticate {
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { resolver }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authenticate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticateMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticateMiddleware {
            service: Rc::new(service),
            resolver: self.resolver.clone(),
        }))
    }
}

pub struct AuthenticateMiddleware<S> {
    service: Rc<S>,
    resolver: Arc<dyn IdentityResolver>,
}

impl<S, B> Service<ServiceRequest> for AuthenticateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let resolver = self.resolver.clone();

        Box::pin(async move {
            if PUBLIC_PATHS.contains(&req.path()) {
                return svc.call(req).await;
            }

            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .ok_or_else(|| Error::from(AppError::unauthorized("Missing bearer token")))?;

            let actor = resolver
                .resolve(&token)
                .await
                .map_err(Error::from)?
                .ok_or_else(|| Error::from(AppError::unauthorized("Invalid bearer token")))?;

            tracing::debug!(user_id = %actor.user_id, role = ?actor.role, "Authenticated request");
            req.extensions_mut().insert(actor);

            svc.call(req).await
        })
    }
}
