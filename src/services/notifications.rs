use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, ActiveModelTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        notification::{self, NotificationKind},
        user,
    },
    errors::ServiceError,
    PaginatedResponse,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateNotificationRequest {
    /// Recipient worker; omit to broadcast to everyone.
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[serde(default)]
    pub kind: NotificationKind,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCount {
    pub unread: u64,
}

/// Own notifications plus broadcasts.
fn visible_to(user_id: Uuid) -> Condition {
    Condition::any()
        .add(notification::Column::UserId.eq(user_id))
        .add(notification::Column::UserId.is_null())
}

/// Inserts a notification on any connection, including an open transaction.
pub async fn notify<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<Uuid>,
    title: impl Into<String>,
    message: impl Into<String>,
    kind: NotificationKind,
) -> Result<notification::Model, ServiceError> {
    let model = notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        title: Set(title.into()),
        message: Set(message.into()),
        kind: Set(kind),
        is_read: Set(false),
        created_at: Set(Utc::now()),
    };
    Ok(model.insert(conn).await?)
}

#[derive(Clone)]
pub struct NotificationService {
    db_pool: Arc<DbPool>,
}

impl NotificationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<notification::Model>, ServiceError> {
        let mut query = notification::Entity::find().filter(visible_to(user_id));
        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }

        let paginator = query
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    #[instrument(skip(self))]
    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        Ok(notification::Entity::find()
            .filter(visible_to(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&*self.db_pool)
            .await?)
    }

    /// Marks one visible notification read. Broadcasts share a single flag.
    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<notification::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = notification::Entity::find_by_id(notification_id)
            .filter(visible_to(user_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Notification", notification_id))?;

        if existing.is_read {
            return Ok(existing);
        }

        let mut active: notification::ActiveModel = existing.into();
        active.is_read = Set(true);
        Ok(active.update(db).await?)
    }

    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(visible_to(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&*self.db_pool)
            .await?;
        info!(%user_id, updated = result.rows_affected, "Marked notifications read");
        Ok(result.rows_affected)
    }

    #[instrument(skip(self, request), fields(kind = %request.kind))]
    pub async fn create(
        &self,
        request: CreateNotificationRequest,
    ) -> Result<notification::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;

        if let Some(target) = request.user_id {
            if user::Entity::find_by_id(target).one(db).await?.is_none() {
                return Err(ServiceError::InvalidInput(format!(
                    "Worker {} does not exist",
                    target
                )));
            }
        }

        let created = notify(db, request.user_id, request.title, request.message, request.kind).await?;
        info!(notification_id = %created.id, "Notification created");
        Ok(created)
    }
}
