use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{customer, recipient_group, recipient_group_member},
    errors::ServiceError,
    PaginatedResponse,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AddMembersRequest {
    #[validate(length(min = 1, max = 5000))]
    pub customer_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: recipient_group::Model,
    pub member_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupWithMembers {
    #[serde(flatten)]
    pub group: recipient_group::Model,
    pub members: Vec<customer::Model>,
}

#[derive(Clone)]
pub struct RecipientGroupService {
    db_pool: Arc<DbPool>,
}

impl RecipientGroupService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: u64, limit: u64) -> Result<PaginatedResponse<GroupSummary>, ServiceError> {
        let db = &*self.db_pool;
        let paginator = recipient_group::Entity::find()
            .order_by_asc(recipient_group::Column::Name)
            .paginate(db, limit);
        let total = paginator.num_items().await?;

        let mut items = Vec::new();
        for group in paginator.fetch_page(page - 1).await? {
            let member_count = recipient_group_member::Entity::find()
                .filter(recipient_group_member::Column::GroupId.eq(group.id))
                .count(db)
                .await?;
            items.push(GroupSummary {
                group,
                member_count,
            });
        }
        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<GroupWithMembers, ServiceError> {
        let db = &*self.db_pool;
        let group = self.find(id).await?;
        let member_ids: Vec<Uuid> = recipient_group_member::Entity::find()
            .filter(recipient_group_member::Column::GroupId.eq(id))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.customer_id)
            .collect();
        let members = customer::Entity::find()
            .filter(customer::Column::Id.is_in(member_ids))
            .order_by_asc(customer::Column::LastName)
            .order_by_asc(customer::Column::FirstName)
            .all(db)
            .await?;
        Ok(GroupWithMembers { group, members })
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateGroupRequest) -> Result<recipient_group::Model, ServiceError> {
        request.validate()?;
        let name = request.name.trim().to_string();
        self.ensure_name_free(&name, None).await?;

        let now = Utc::now();
        let created = recipient_group::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(request.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(group_id = %created.id, "Recipient group created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateGroupRequest,
    ) -> Result<recipient_group::Model, ServiceError> {
        request.validate()?;
        let existing = self.find(id).await?;

        let mut active: recipient_group::ActiveModel = existing.into();
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            self.ensure_name_free(&name, Some(id)).await?;
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.find(id).await?;

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for group delete");
            ServiceError::DatabaseError(e)
        })?;
        recipient_group_member::Entity::delete_many()
            .filter(recipient_group_member::Column::GroupId.eq(id))
            .exec(&txn)
            .await?;
        recipient_group::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await.map_err(|e| {
            error!(error = %e, group_id = %id, "Failed to commit group delete");
            ServiceError::DatabaseError(e)
        })?;

        info!(group_id = %id, "Recipient group deleted");
        Ok(())
    }

    /// Adds customers to a group. Existing members are skipped; any unknown
    /// customer id rejects the whole request.
    #[instrument(skip(self, request), fields(count = request.customer_ids.len()))]
    pub async fn add_members(
        &self,
        id: Uuid,
        request: AddMembersRequest,
    ) -> Result<GroupWithMembers, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        self.find(id).await?;

        let requested: HashSet<Uuid> = request.customer_ids.into_iter().collect();
        let known: HashSet<Uuid> = customer::Entity::find()
            .filter(customer::Column::Id.is_in(requested.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        let mut unknown: Vec<String> = requested
            .difference(&known)
            .map(|id| id.to_string())
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(ServiceError::InvalidInput(format!(
                "Unknown customer id(s): {}",
                unknown.join(", ")
            )));
        }

        let existing: HashSet<Uuid> = recipient_group_member::Entity::find()
            .filter(recipient_group_member::Column::GroupId.eq(id))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.customer_id)
            .collect();
        let now = Utc::now();
        let new_members: Vec<recipient_group_member::ActiveModel> = requested
            .difference(&existing)
            .map(|customer_id| recipient_group_member::ActiveModel {
                group_id: Set(id),
                customer_id: Set(*customer_id),
                added_at: Set(now),
            })
            .collect();

        let added = new_members.len();
        if !new_members.is_empty() {
            recipient_group_member::Entity::insert_many(new_members)
                .exec_without_returning(db)
                .await?;
        }
        info!(group_id = %id, added, "Recipient group members added");
        self.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_member(&self, id: Uuid, customer_id: Uuid) -> Result<(), ServiceError> {
        self.find(id).await?;
        let result = recipient_group_member::Entity::delete_many()
            .filter(recipient_group_member::Column::GroupId.eq(id))
            .filter(recipient_group_member::Column::CustomerId.eq(customer_id))
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Customer {} is not a member of group {}",
                customer_id, id
            )));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<recipient_group::Model, ServiceError> {
        recipient_group::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Recipient group", id))
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query =
            recipient_group::Entity::find().filter(recipient_group::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(recipient_group::Column::Id.ne(id));
        }
        if query.count(&*self.db_pool).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "A recipient group named '{}' already exists",
                name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrated_memory_pool;
    use crate::events::detached_sender;
    use crate::services::customers::{tests::customer_request, CustomerService};
    use assert_matches::assert_matches;

    fn group(name: &str) -> CreateGroupRequest {
        CreateGroupRequest {
            name: name.into(),
            description: None,
        }
    }

    #[tokio::test]
    async fn membership_lifecycle() {
        let pool = migrated_memory_pool().await;
        let customers = CustomerService::new(pool.clone(), detached_sender());
        let ada = customers
            .create(customer_request("Ada", "ada@example.com", "555 0100"))
            .await
            .unwrap();
        let bob = customers
            .create(customer_request("Bob", "bob@example.com", "555 0200"))
            .await
            .unwrap();
        let svc = RecipientGroupService::new(pool);
        let vip = svc.create(group("VIP")).await.unwrap();

        svc.add_members(
            vip.id,
            AddMembersRequest {
                customer_ids: vec![ada.id, bob.id],
            },
        )
        .await
        .unwrap();
        // Re-adding is a no-op.
        let again = svc
            .add_members(
                vip.id,
                AddMembersRequest {
                    customer_ids: vec![ada.id],
                },
            )
            .await
            .unwrap();
        assert_eq!(again.members.len(), 2);

        let listed = svc.list(1, 20).await.unwrap();
        assert_eq!(listed.items[0].member_count, 2);

        svc.remove_member(vip.id, bob.id).await.unwrap();
        assert_matches!(
            svc.remove_member(vip.id, bob.id).await,
            Err(ServiceError::NotFound(_))
        );
        assert_eq!(svc.get(vip.id).await.unwrap().members.len(), 1);

        svc.delete(vip.id).await.unwrap();
        assert_matches!(svc.get(vip.id).await, Err(ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_customers_and_duplicate_names_are_rejected() {
        let pool = migrated_memory_pool().await;
        let svc = RecipientGroupService::new(pool);
        let vip = svc.create(group("VIP")).await.unwrap();

        assert_matches!(svc.create(group("VIP")).await, Err(ServiceError::Conflict(_)));
        assert_matches!(
            svc.add_members(
                vip.id,
                AddMembersRequest {
                    customer_ids: vec![Uuid::new_v4()],
                },
            )
            .await,
            Err(ServiceError::InvalidInput(_))
        );

        let other = svc.create(group("Regulars")).await.unwrap();
        assert_matches!(
            svc.update(
                other.id,
                UpdateGroupRequest {
                    name: Some("VIP".into()),
                    ..Default::default()
                },
            )
            .await,
            Err(ServiceError::Conflict(_))
        );
    }
}
