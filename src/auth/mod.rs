/*!
 * # Authentication and Authorization Module
 *
 * Workers sign in with email and password and receive an HS256 JWT. The
 * token carries the worker's role together with the permission set of that
 * role, so route guards never touch the database.
 */

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::user::{self, UserRole};

mod password;
mod permissions;

pub use password::{hash_password, verify_password};
pub use permissions::*;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,              // Subject (user ID)
    pub name: String,             // Worker's display name
    pub email: String,            // Worker's email
    pub role: UserRole,           // Worker role
    pub permissions: Vec<String>, // Permissions granted by the role
    pub jti: String,              // JWT ID (unique identifier for this token)
    pub iat: i64,                 // Issued at time
    pub exp: i64,                 // Expiration time
    pub nbf: i64,                 // Not valid before time
    pub iss: String,              // Issuer
    pub aud: String,              // Audience
}

/// Authenticated worker extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub permissions: Vec<String>,
    pub token_id: String,
}

impl AuthUser {
    /// Check if the user has a specific role
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }

    /// Check if the user has a specific permission. Admins hold every permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == permission)
    }

    /// Check if the user is an admin
    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }

    /// Acting identity for work done outside a request, such as seeding.
    pub fn for_worker(worker: &user::Model) -> Self {
        Self {
            user_id: worker.id,
            name: worker.full_name.clone(),
            email: worker.email.clone(),
            role: worker.role,
            permissions: permissions_for_role(worker.role),
            token_id: "internal".to_string(),
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, access_token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            jwt_audience: "repairdesk".to_string(),
            jwt_issuer: "repairdesk-api".to_string(),
            access_token_expiration,
        }
    }
}

/// Access token handed out on login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Authentication service that handles token issuance and validation
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Generate a JWT token for a worker
    pub fn generate_token(&self, user: &user::Model) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let lifetime = ChronoDuration::from_std(self.config.access_token_expiration)
            .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;
        let exp = now + lifetime;

        let claims = Claims {
            sub: user.id.to_string(),
            name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
            permissions: permissions_for_role(user.role),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(IssuedToken {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: lifetime.num_seconds(),
        })
    }

    /// Validate a JWT token and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        Ok(claims)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, String) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required".to_string(),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::TokenCreation(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_TOKEN_CREATION_FAILED",
                "Token creation failed".to_string(),
            ),
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                "Insufficient permissions".to_string(),
            ),
            Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                "Internal authentication error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            },
            "request_id": crate::tracing::current_request_id().map(|rid| rid.to_string()),
        }));

        (status, body).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Authentication middleware: validates the bearer token and stores the
/// resulting `AuthUser` in the request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("Authentication service not available".to_string())
                .into_response();
        }
    };

    match extract_auth_from_headers(request.headers(), &auth_service) {
        Ok(user) => {
            debug!(user_id = %user.user_id, role = %user.role, "Authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let auth_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingAuth)?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidToken)?;

    let claims = auth_service.validate_token(token)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

    Ok(AuthUser {
        user_id,
        name: claims.name,
        email: claims.email,
        role: claims.role,
        permissions: claims.permissions,
        token_id: claims.jti,
    })
}

/// Permission middleware to check if a user has the required permission
pub async fn permission_middleware(
    State(required_permission): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if !user.has_permission(&required_permission) {
        debug!(
            user_id = %user.user_id,
            permission = %required_permission,
            "Permission denied"
        );
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Router helpers that attach authentication and permission guards
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_permission(self, permission: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_permission(self, permission: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            permission.to_string(),
            permission_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Extension, Router};
    use tower::ServiceExt;

    const SECRET: &str = "unit_test_secret_with_enough_entropy_0123456789";

    fn service(expiration: Duration) -> AuthService {
        AuthService::new(AuthConfig::new(SECRET.to_string(), expiration))
    }

    fn worker(role: UserRole) -> user::Model {
        let now = Utc::now();
        user::Model {
            id: Uuid::new_v4(),
            full_name: "Dana Fixer".into(),
            email: "dana@example.com".into(),
            password_hash: String::new(),
            role,
            location_id: None,
            phone: None,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_token_validates() {
        let svc = service(Duration::from_secs(600));
        let user = worker(UserRole::Technician);
        let issued = svc.generate_token(&user).unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 600);

        let claims = svc.validate_token(&issued.access_token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, UserRole::Technician);
        assert!(claims.permissions.contains(&consts::DEVICES_UPDATE.to_string()));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issued = service(Duration::from_secs(600))
            .generate_token(&worker(UserRole::Sales))
            .unwrap();
        let other = AuthService::new(AuthConfig::new(
            "another_secret_that_is_long_enough_abcdefghijkl".into(),
            Duration::from_secs(600),
        ));
        assert_matches!(
            other.validate_token(&issued.access_token),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let svc = service(Duration::from_secs(600));
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            name: "x".into(),
            email: "x@example.com".into(),
            role: UserRole::Sales,
            permissions: vec![],
            jti: "jti".into(),
            iat: now - 7200,
            exp: now - 3600,
            nbf: now - 7200,
            iss: svc.config.jwt_issuer.clone(),
            aud: svc.config.jwt_audience.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_matches!(svc.validate_token(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn admin_has_every_permission() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            name: "root".into(),
            email: "root@example.com".into(),
            role: UserRole::Admin,
            permissions: vec![],
            token_id: "t".into(),
        };
        assert!(user.has_permission(consts::USERS_MANAGE));
    }

    async fn whoami(user: AuthUser) -> String {
        user.email
    }

    fn guarded_app(svc: Arc<AuthService>, permission: &str) -> Router {
        Router::new()
            .route("/me", get(whoami))
            .with_permission(permission)
            .layer(Extension(svc))
    }

    #[tokio::test]
    async fn guard_rejects_missing_token_and_wrong_role() {
        let svc = Arc::new(service(Duration::from_secs(600)));

        let response = guarded_app(svc.clone(), consts::SALES_CREATE)
            .oneshot(HttpRequest::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let token = svc
            .generate_token(&worker(UserRole::Technician))
            .unwrap()
            .access_token;
        let response = guarded_app(svc.clone(), consts::SALES_CREATE)
            .oneshot(
                HttpRequest::builder()
                    .uri("/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn guard_admits_permitted_role() {
        let svc = Arc::new(service(Duration::from_secs(600)));
        let token = svc
            .generate_token(&worker(UserRole::Sales))
            .unwrap()
            .access_token;
        let response = guarded_app(svc, consts::SALES_CREATE)
            .oneshot(
                HttpRequest::builder()
                    .uri("/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
