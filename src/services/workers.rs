use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{hash_password, verify_password, AuthService, AuthUser},
    db::DbPool,
    entities::{
        location,
        user::{self, UserRole},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{normalize_search, search_condition},
    PaginatedResponse,
};

const INVALID_LOGIN: &str = "Invalid email or password";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: user::Model,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateWorkerRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: UserRole,
    pub location_id: Option<Uuid>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateWorkerRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub location_id: Option<Uuid>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    /// Required when changing your own password.
    pub current_password: Option<String>,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Default)]
pub struct WorkerFilter {
    pub role: Option<UserRole>,
    pub location_id: Option<Uuid>,
    pub active: Option<bool>,
    pub search: Option<String>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct WorkerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    auth: Arc<AuthService>,
}

impl WorkerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, auth: Arc<AuthService>) -> Self {
        Self {
            db_pool,
            event_sender,
            auth,
        }
    }

    /// Checks credentials and issues an access token. Unknown emails,
    /// inactive accounts and wrong passwords are indistinguishable.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;

        let worker = user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(&request.email)))
            .one(db)
            .await?;

        let worker = match worker {
            Some(w) if w.is_active && verify_password(&request.password, &w.password_hash) => w,
            _ => {
                warn!("Rejected login attempt");
                return Err(ServiceError::Unauthorized(INVALID_LOGIN.to_string()));
            }
        };

        let token = self.auth.generate_token(&worker).map_err(|e| {
            error!(error = %e, user_id = %worker.id, "Failed to issue token");
            ServiceError::JwtError(e.to_string())
        })?;

        let mut active: user::ActiveModel = worker.into();
        active.last_login_at = Set(Some(Utc::now()));
        let worker = active.update(db).await?;

        info!(user_id = %worker.id, role = %worker.role, "Worker logged in");
        Ok(LoginResponse {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            user: worker,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Worker", id))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: WorkerFilter,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<user::Model>, ServiceError> {
        let mut query = user::Entity::find();
        if let Some(role) = filter.role {
            query = query.filter(user::Column::Role.eq(role));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(user::Column::LocationId.eq(location_id));
        }
        if let Some(active) = filter.active {
            query = query.filter(user::Column::IsActive.eq(active));
        }
        if let Some(term) = normalize_search(filter.search.as_deref()) {
            query = query.filter(search_condition(
                &term,
                &[user::Column::FullName, user::Column::Email],
            ));
        }

        let paginator = query
            .order_by_asc(user::Column::FullName)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role))]
    pub async fn create(&self, request: CreateWorkerRequest) -> Result<user::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let email = normalize_email(&request.email);

        self.ensure_email_free(&email, None).await?;
        if let Some(location_id) = request.location_id {
            self.ensure_location(location_id).await?;
        }

        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();
        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            full_name: Set(request.full_name.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(request.role),
            location_id: Set(request.location_id),
            phone: Set(request.phone),
            is_active: Set(true),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(user_id = %created.id, "Worker created");
        self.event_sender
            .send_or_log(Event::UserCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self, actor, request), fields(actor = %actor.user_id))]
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: Uuid,
        request: UpdateWorkerRequest,
    ) -> Result<user::Model, ServiceError> {
        request.validate()?;
        let existing = self.get(id).await?;

        if let Some(role) = request.role {
            if role != existing.role && !actor.is_admin() {
                return Err(ServiceError::Forbidden(
                    "Only administrators can change roles".to_string(),
                ));
            }
        }
        if request.is_active == Some(false) && actor.user_id == id {
            return Err(ServiceError::InvalidOperation(
                "You cannot deactivate your own account".to_string(),
            ));
        }

        let mut active: user::ActiveModel = existing.into();
        if let Some(full_name) = request.full_name {
            active.full_name = Set(full_name.trim().to_string());
        }
        if let Some(email) = request.email {
            let email = normalize_email(&email);
            self.ensure_email_free(&email, Some(id)).await?;
            active.email = Set(email);
        }
        if let Some(role) = request.role {
            active.role = Set(role);
        }
        if let Some(location_id) = request.location_id {
            self.ensure_location(location_id).await?;
            active.location_id = Set(Some(location_id));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db_pool).await?;
        info!(user_id = %id, "Worker updated");
        Ok(updated)
    }

    /// Workers change their own password with the current one; admins may
    /// reset anyone else's without it.
    #[instrument(skip(self, actor, request), fields(actor = %actor.user_id))]
    pub async fn change_password(
        &self,
        actor: &AuthUser,
        id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;
        let existing = self.get(id).await?;

        if actor.user_id == id {
            let current = request.current_password.as_deref().unwrap_or_default();
            if !verify_password(current, &existing.password_hash) {
                return Err(ServiceError::Unauthorized(
                    "Current password is incorrect".to_string(),
                ));
            }
        } else if !actor.is_admin() {
            return Err(ServiceError::Forbidden(
                "Only administrators can reset another worker's password".to_string(),
            ));
        }

        let mut active: user::ActiveModel = existing.into();
        active.password_hash = Set(hash_password(&request.new_password)?);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db_pool).await?;

        info!(user_id = %id, "Password changed");
        Ok(())
    }

    /// Soft delete.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn deactivate(&self, actor: &AuthUser, id: Uuid) -> Result<user::Model, ServiceError> {
        if actor.user_id == id {
            return Err(ServiceError::InvalidOperation(
                "You cannot deactivate your own account".to_string(),
            ));
        }
        let existing = self.get(id).await?;
        let mut active: user::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db_pool).await?;
        info!(user_id = %id, "Worker deactivated");
        Ok(updated)
    }

    /// Creates the first administrator when the users table is empty.
    #[instrument(skip(self, password))]
    pub async fn ensure_bootstrap_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<user::Model>, ServiceError> {
        let existing = user::Entity::find().count(&*self.db_pool).await?;
        if existing > 0 {
            return Ok(None);
        }

        let admin = self
            .create(CreateWorkerRequest {
                full_name: "Administrator".to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role: UserRole::Admin,
                location_id: None,
                phone: None,
            })
            .await?;
        info!(user_id = %admin.id, "Bootstrap administrator created");
        Ok(Some(admin))
    }

    async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = user::Entity::find().filter(user::Column::Email.eq(email));
        if let Some(id) = except {
            query = query.filter(user::Column::Id.ne(id));
        }
        if query.count(&*self.db_pool).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "A worker with email {} already exists",
                email
            )));
        }
        Ok(())
    }

    async fn ensure_location(&self, id: Uuid) -> Result<(), ServiceError> {
        if location::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .is_none()
        {
            return Err(ServiceError::InvalidInput(format!(
                "Location {} does not exist",
                id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::db::migrated_memory_pool;
    use crate::events::detached_sender;
    use assert_matches::assert_matches;
    use std::time::Duration;

    const SECRET: &str = "worker_service_test_secret_0123456789abcdef";

    async fn service() -> WorkerService {
        let auth = Arc::new(AuthService::new(AuthConfig::new(
            SECRET.to_string(),
            Duration::from_secs(3600),
        )));
        WorkerService::new(migrated_memory_pool().await, detached_sender(), auth)
    }

    fn actor_for(model: &user::Model) -> AuthUser {
        AuthUser::for_worker(model)
    }

    fn new_worker(email: &str, role: UserRole) -> CreateWorkerRequest {
        CreateWorkerRequest {
            full_name: "Jordan Bench".into(),
            email: email.into(),
            password: "hunter2hunter2".into(),
            role,
            location_id: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn login_issues_token_and_records_time() {
        let svc = service().await;
        svc.create(new_worker("Tech@Shop.test", UserRole::Technician))
            .await
            .unwrap();

        let response = svc
            .login(LoginRequest {
                email: "tech@shop.test".into(),
                password: "hunter2hunter2".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert!(response.user.last_login_at.is_some());

        let claims = svc.auth.validate_token(&response.access_token).unwrap();
        assert_eq!(claims.role, UserRole::Technician);
    }

    #[tokio::test]
    async fn bad_password_and_inactive_look_the_same() {
        let svc = service().await;
        let admin = svc.create(new_worker("admin@shop.test", UserRole::Admin)).await.unwrap();
        let tech = svc.create(new_worker("tech@shop.test", UserRole::Technician)).await.unwrap();

        let wrong = svc
            .login(LoginRequest {
                email: "tech@shop.test".into(),
                password: "nope-nope".into(),
            })
            .await
            .unwrap_err();

        svc.deactivate(&actor_for(&admin), tech.id).await.unwrap();
        let inactive = svc
            .login(LoginRequest {
                email: "tech@shop.test".into(),
                password: "hunter2hunter2".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong.to_string(), inactive.to_string());
        assert_matches!(inactive, ServiceError::Unauthorized(_));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let svc = service().await;
        svc.create(new_worker("dup@shop.test", UserRole::Sales)).await.unwrap();
        assert_matches!(
            svc.create(new_worker("DUP@shop.test", UserRole::Sales)).await,
            Err(ServiceError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn only_admins_change_roles() {
        let svc = service().await;
        let manager = svc.create(new_worker("m@shop.test", UserRole::Manager)).await.unwrap();
        let tech = svc.create(new_worker("t@shop.test", UserRole::Technician)).await.unwrap();

        let result = svc
            .update(
                &actor_for(&manager),
                tech.id,
                UpdateWorkerRequest {
                    role: Some(UserRole::Admin),
                    ..Default::default()
                },
            )
            .await;
        assert_matches!(result, Err(ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn self_password_change_needs_current_password() {
        let svc = service().await;
        let tech = svc.create(new_worker("t@shop.test", UserRole::Technician)).await.unwrap();
        let actor = actor_for(&tech);

        let missing = svc
            .change_password(
                &actor,
                tech.id,
                ChangePasswordRequest {
                    current_password: None,
                    new_password: "brand-new-pass".into(),
                },
            )
            .await;
        assert_matches!(missing, Err(ServiceError::Unauthorized(_)));

        svc.change_password(
            &actor,
            tech.id,
            ChangePasswordRequest {
                current_password: Some("hunter2hunter2".into()),
                new_password: "brand-new-pass".into(),
            },
        )
        .await
        .unwrap();

        assert!(svc
            .login(LoginRequest {
                email: "t@shop.test".into(),
                password: "brand-new-pass".into(),
            })
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn cannot_deactivate_self() {
        let svc = service().await;
        let admin = svc.create(new_worker("a@shop.test", UserRole::Admin)).await.unwrap();
        assert_matches!(
            svc.deactivate(&actor_for(&admin), admin.id).await,
            Err(ServiceError::InvalidOperation(_))
        );
    }

    #[tokio::test]
    async fn bootstrap_only_runs_on_empty_table() {
        let svc = service().await;
        let created = svc
            .ensure_bootstrap_admin("owner@shop.test", "owner-password")
            .await
            .unwrap();
        assert_eq!(created.map(|u| u.role), Some(UserRole::Admin));

        let second = svc
            .ensure_bootstrap_admin("other@shop.test", "other-password")
            .await
            .unwrap();
        assert!(second.is_none());
    }
}
