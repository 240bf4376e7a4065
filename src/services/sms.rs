use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::{
        customer,
        notification::NotificationKind,
        recipient_group, recipient_group_member,
        sms_campaign::{self, CampaignStatus},
        sms_recipient::{self, DeliveryStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{notifications::notify, settings::SettingsService, sms_gateway::SmsGateway},
    PaginatedResponse,
};

pub const SINGLE_SEGMENT_CHARS: usize = 160;
pub const MULTI_SEGMENT_CHARS: usize = 153;
pub const DEFAULT_PREVIEW_SIZE: usize = 5;
const MAX_PREVIEW_SIZE: usize = 50;

/// Values available to `{placeholder}` substitution.
#[derive(Debug, Clone)]
pub struct TemplateContext<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    pub business_name: &'a str,
}

impl<'a> TemplateContext<'a> {
    pub fn for_customer(customer: &'a customer::Model, business_name: &'a str) -> Self {
        Self {
            first_name: &customer.first_name,
            last_name: &customer.last_name,
            phone: &customer.phone,
            email: &customer.email,
            business_name,
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "first_name" => Some(self.first_name.to_string()),
            "last_name" => Some(self.last_name.to_string()),
            "full_name" => Some(format!("{} {}", self.first_name, self.last_name).trim().to_string()),
            "phone" => Some(self.phone.to_string()),
            "email" => Some(self.email.to_string()),
            "business_name" => Some(self.business_name.to_string()),
            _ => None,
        }
    }
}

/// Substitutes known placeholders. Unknown placeholders and stray braces
/// are copied through unchanged.
pub fn render_template(template: &str, ctx: &TemplateContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after
            .find('}')
            .and_then(|close| ctx.lookup(&after[..close]).map(|value| (value, close)));
        match replaced {
            Some((value, close)) => {
                out.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Number of SMS segments a message occupies.
pub fn segment_count(message: &str) -> usize {
    let chars = message.chars().count();
    match chars {
        0 => 0,
        n if n <= SINGLE_SEGMENT_CHARS => 1,
        n => n.div_ceil(MULTI_SEGMENT_CHARS),
    }
}

/// Digits only, keeping a leading `+`.
pub fn normalize_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    let mut normalized = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        normalized.push('+');
    }
    normalized.extend(trimmed.chars().filter(|c| c.is_ascii_digit()));
    normalized
}

/// Keeps opted-in customers with a usable phone, first occurrence per
/// normalized number.
pub fn select_recipients(candidates: Vec<customer::Model>) -> Vec<customer::Model> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| c.sms_opt_in)
        .filter(|c| {
            let phone = normalize_phone(&c.phone);
            phone.chars().any(|ch| ch.is_ascii_digit()) && seen.insert(phone)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(min = 1, max = 1600))]
    pub message_template: String,
    pub recipient_group_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateCampaignRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 1600))]
    pub message_template: Option<String>,
    pub recipient_group_id: Option<Uuid>,
}

/// Who a preview or send targets. Explicit ids win over a group; with
/// neither, the campaign's own group is used, then every customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RecipientSelection {
    pub customer_ids: Option<Vec<Uuid>>,
    pub recipient_group_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SendSingleRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 1600))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignWithRecipients {
    #[serde(flatten)]
    pub campaign: sms_campaign::Model,
    pub recipients: Vec<sms_recipient::Model>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PreviewMessage {
    pub customer_id: Uuid,
    pub name: String,
    pub phone: String,
    pub message: String,
    pub segments: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignPreview {
    pub total_recipients: usize,
    /// Segments used by the unrendered template.
    pub segments: usize,
    pub samples: Vec<PreviewMessage>,
}

#[derive(Clone)]
pub struct SmsService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    settings: SettingsService,
    gateway: Arc<dyn SmsGateway>,
}

impl SmsService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        settings: SettingsService,
        gateway: Arc<dyn SmsGateway>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            settings,
            gateway,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        status: Option<CampaignStatus>,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<sms_campaign::Model>, ServiceError> {
        let mut query = sms_campaign::Entity::find();
        if let Some(status) = status {
            query = query.filter(sms_campaign::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(sms_campaign::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<CampaignWithRecipients, ServiceError> {
        let campaign = self.find_campaign(id).await?;
        let recipients = campaign
            .find_related(sms_recipient::Entity)
            .order_by_asc(sms_recipient::Column::Phone)
            .all(&*self.db_pool)
            .await?;
        Ok(CampaignWithRecipients {
            campaign,
            recipients,
        })
    }

    #[instrument(skip(self, actor, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        actor: &AuthUser,
        request: CreateCampaignRequest,
    ) -> Result<sms_campaign::Model, ServiceError> {
        request.validate()?;
        if let Some(group_id) = request.recipient_group_id {
            self.ensure_group(group_id).await?;
        }

        let created = sms_campaign::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            message_template: Set(request.message_template),
            status: Set(CampaignStatus::Draft),
            recipient_group_id: Set(request.recipient_group_id),
            total_recipients: Set(0),
            sent_count: Set(0),
            failed_count: Set(0),
            created_by: Set(Some(actor.user_id)),
            created_at: Set(Utc::now()),
            sent_at: Set(None),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(campaign_id = %created.id, "SMS campaign drafted");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateCampaignRequest,
    ) -> Result<sms_campaign::Model, ServiceError> {
        request.validate()?;
        let campaign = self.find_draft(id).await?;

        let mut active: sms_campaign::ActiveModel = campaign.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(template) = request.message_template {
            active.message_template = Set(template);
        }
        if let Some(group_id) = request.recipient_group_id {
            self.ensure_group(group_id).await?;
            active.recipient_group_id = Set(Some(group_id));
        }
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let campaign = self.find_draft(id).await?;
        campaign.delete(&*self.db_pool).await?;
        info!(campaign_id = %id, "SMS campaign deleted");
        Ok(())
    }

    #[instrument(skip(self, selection))]
    pub async fn preview(
        &self,
        id: Uuid,
        selection: RecipientSelection,
        size: Option<usize>,
    ) -> Result<CampaignPreview, ServiceError> {
        let campaign = self.find_campaign(id).await?;
        let business = self.settings.business_settings().await?;
        let recipients = self.resolve_recipients(&campaign, selection).await?;
        let size = size.unwrap_or(DEFAULT_PREVIEW_SIZE).clamp(1, MAX_PREVIEW_SIZE);

        let samples = recipients
            .iter()
            .take(size)
            .map(|c| {
                let message = render_template(
                    &campaign.message_template,
                    &TemplateContext::for_customer(c, &business.business_name),
                );
                PreviewMessage {
                    customer_id: c.id,
                    name: format!("{} {}", c.first_name, c.last_name),
                    phone: c.phone.clone(),
                    segments: segment_count(&message),
                    message,
                }
            })
            .collect();

        Ok(CampaignPreview {
            total_recipients: recipients.len(),
            segments: segment_count(&campaign.message_template),
            samples,
        })
    }

    /// Delivers a draft campaign. Each recipient gets one stored row whether
    /// or not the gateway accepted it.
    #[instrument(skip(self, actor, selection), fields(user_id = %actor.user_id))]
    pub async fn send(
        &self,
        actor: &AuthUser,
        id: Uuid,
        selection: RecipientSelection,
    ) -> Result<CampaignWithRecipients, ServiceError> {
        let db = &*self.db_pool;
        let campaign = self.find_draft(id).await?;
        let business = self.settings.business_settings().await?;
        let recipients = self.resolve_recipients(&campaign, selection).await?;
        if recipients.is_empty() {
            return Err(ServiceError::InvalidInput(
                "No opted-in customers with a phone number were selected".to_string(),
            ));
        }

        // Claim the draft so a concurrent send cannot deliver it twice.
        let claimed = sms_campaign::Entity::update_many()
            .col_expr(sms_campaign::Column::Status, Expr::value(CampaignStatus::Sending))
            .col_expr(
                sms_campaign::Column::TotalRecipients,
                Expr::value(recipients.len() as i32),
            )
            .filter(sms_campaign::Column::Id.eq(id))
            .filter(sms_campaign::Column::Status.eq(CampaignStatus::Draft))
            .exec(db)
            .await?;
        if claimed.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "Campaign {} is already being sent",
                id
            )));
        }

        let mut sent = 0i32;
        let mut failed = 0i32;
        let delivered: Result<(), ServiceError> = async {
            for customer in &recipients {
                let message = render_template(
                    &campaign.message_template,
                    &TemplateContext::for_customer(customer, &business.business_name),
                );
                match self.deliver(Some(id), customer, message).await?.status {
                    DeliveryStatus::Sent => sent += 1,
                    _ => failed += 1,
                }
            }
            Ok(())
        }
        .await;

        let finished = match delivered {
            Ok(()) => self.finish_campaign(id, sent, failed).await,
            Err(e) => Err(e),
        };
        let (status, now) = match finished {
            Ok(done) => done,
            Err(e) => {
                error!(campaign_id = %id, sent, failed, error = %e, "SMS campaign delivery interrupted");
                self.release_claim(id, sent, failed).await;
                return Err(e);
            }
        };

        info!(campaign_id = %id, sent, failed, status = %status, "SMS campaign delivered");
        self.event_sender
            .send_or_log(Event::CampaignSent {
                campaign_id: id,
                sent,
                failed,
                at: now,
            })
            .await;
        if let Err(e) = notify(
            db,
            Some(actor.user_id),
            format!("Campaign \"{}\" sent", campaign.name),
            format!("{} delivered, {} failed", sent, failed),
            NotificationKind::Sms,
        )
        .await
        {
            warn!(campaign_id = %id, error = %e, "Failed to notify sender about campaign");
        }

        self.get(id).await
    }

    /// Sends one message to one customer outside any campaign.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn send_single(&self, request: SendSingleRequest) -> Result<sms_recipient::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let customer = customer::Entity::find_by_id(request.customer_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidInput(format!("Customer {} does not exist", request.customer_id))
            })?;
        if !normalize_phone(&customer.phone).chars().any(|c| c.is_ascii_digit()) {
            return Err(ServiceError::InvalidInput(
                "Customer has no phone number".to_string(),
            ));
        }

        let business = self.settings.business_settings().await?;
        let message = render_template(
            &request.message,
            &TemplateContext::for_customer(&customer, &business.business_name),
        );
        let stored = self.deliver(None, &customer, message).await?;

        if stored.status == DeliveryStatus::Failed {
            return Err(ServiceError::ExternalServiceError(
                stored
                    .error
                    .unwrap_or_else(|| "SMS delivery failed".to_string()),
            ));
        }
        Ok(stored)
    }

    async fn deliver(
        &self,
        campaign_id: Option<Uuid>,
        customer: &customer::Model,
        message: String,
    ) -> Result<sms_recipient::Model, ServiceError> {
        let phone = normalize_phone(&customer.phone);
        let outcome = self.gateway.send(&phone, &message).await;
        let (status, provider_message_id, error, sent_at) = match outcome {
            Ok(provider_id) => (DeliveryStatus::Sent, Some(provider_id), None, Some(Utc::now())),
            Err(e) => {
                warn!(customer_id = %customer.id, error = %e, "SMS delivery failed");
                (DeliveryStatus::Failed, None, Some(e.to_string()), None)
            }
        };
        Ok(sms_recipient::ActiveModel {
            id: Set(Uuid::new_v4()),
            campaign_id: Set(campaign_id),
            customer_id: Set(Some(customer.id)),
            phone: Set(phone),
            message: Set(message),
            status: Set(status),
            provider_message_id: Set(provider_message_id),
            error: Set(error),
            sent_at: Set(sent_at),
        }
        .insert(&*self.db_pool)
        .await?)
    }

    /// Records the final counts of a claimed campaign.
    async fn finish_campaign(
        &self,
        id: Uuid,
        sent: i32,
        failed: i32,
    ) -> Result<(CampaignStatus, DateTime<Utc>), ServiceError> {
        let status = if sent == 0 {
            CampaignStatus::Failed
        } else {
            CampaignStatus::Completed
        };
        let now = Utc::now();
        sms_campaign::Entity::update_many()
            .col_expr(sms_campaign::Column::Status, Expr::value(status))
            .col_expr(sms_campaign::Column::SentCount, Expr::value(sent))
            .col_expr(sms_campaign::Column::FailedCount, Expr::value(failed))
            .col_expr(sms_campaign::Column::SentAt, Expr::value(Some(now)))
            .filter(sms_campaign::Column::Id.eq(id))
            .exec(&*self.db_pool)
            .await?;
        Ok((status, now))
    }

    /// Moves a campaign out of `sending` after an interrupted delivery: back
    /// to draft when no message was attempted, otherwise `failed` with the
    /// counts reached so far.
    async fn release_claim(&self, id: Uuid, sent: i32, failed: i32) {
        let update = sms_campaign::Entity::update_many()
            .filter(sms_campaign::Column::Id.eq(id))
            .filter(sms_campaign::Column::Status.eq(CampaignStatus::Sending));
        let update = if sent == 0 && failed == 0 {
            update
                .col_expr(sms_campaign::Column::Status, Expr::value(CampaignStatus::Draft))
                .col_expr(sms_campaign::Column::TotalRecipients, Expr::value(0))
        } else {
            update
                .col_expr(sms_campaign::Column::Status, Expr::value(CampaignStatus::Failed))
                .col_expr(sms_campaign::Column::SentCount, Expr::value(sent))
                .col_expr(sms_campaign::Column::FailedCount, Expr::value(failed))
                .col_expr(sms_campaign::Column::SentAt, Expr::value(Some(Utc::now())))
        };
        if let Err(e) = update.exec(&*self.db_pool).await {
            error!(campaign_id = %id, error = %e, "Failed to release campaign after interrupted send");
        }
    }

    async fn resolve_recipients(
        &self,
        campaign: &sms_campaign::Model,
        selection: RecipientSelection,
    ) -> Result<Vec<customer::Model>, ServiceError> {
        let db = &*self.db_pool;
        let query = customer::Entity::find()
            .order_by_asc(customer::Column::CreatedAt)
            .order_by_asc(customer::Column::Id);

        let candidates = if let Some(ids) = selection.customer_ids {
            query.filter(customer::Column::Id.is_in(ids)).all(db).await?
        } else if let Some(group_id) = selection.recipient_group_id.or(campaign.recipient_group_id) {
            self.ensure_group(group_id).await?;
            let member_ids: Vec<Uuid> = recipient_group_member::Entity::find()
                .filter(recipient_group_member::Column::GroupId.eq(group_id))
                .all(db)
                .await?
                .into_iter()
                .map(|m| m.customer_id)
                .collect();
            query
                .filter(customer::Column::Id.is_in(member_ids))
                .all(db)
                .await?
        } else {
            query.all(db).await?
        };

        Ok(select_recipients(candidates))
    }

    async fn find_campaign(&self, id: Uuid) -> Result<sms_campaign::Model, ServiceError> {
        sms_campaign::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Campaign", id))
    }

    async fn find_draft(&self, id: Uuid) -> Result<sms_campaign::Model, ServiceError> {
        let campaign = self.find_campaign(id).await?;
        if campaign.status != CampaignStatus::Draft {
            return Err(ServiceError::Conflict(format!(
                "Campaign {} is {} and can no longer be changed",
                id, campaign.status
            )));
        }
        Ok(campaign)
    }

    async fn ensure_group(&self, id: Uuid) -> Result<(), ServiceError> {
        if recipient_group::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .is_none()
        {
            return Err(ServiceError::InvalidInput(format!(
                "Recipient group {} does not exist",
                id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrated_memory_pool;
    use crate::entities::{notification, user::UserRole};
    use crate::events::detached_sender;
    use crate::services::customers::{tests::customer_request, CustomerService, UpdateCustomerRequest};
    use crate::services::devices::tests::{actor, seed_worker};
    use crate::services::sms_gateway::MockSmsGateway;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use std::time::Duration;

    fn ctx() -> TemplateContext<'static> {
        TemplateContext {
            first_name: "Ada",
            last_name: "Lovelace",
            phone: "+1 555 0100",
            email: "ada@example.com",
            business_name: "Fix-It",
        }
    }

    #[test]
    fn renders_known_placeholders() {
        assert_eq!(
            render_template("Hi {first_name}, {business_name} has your device. -{full_name}", &ctx()),
            "Hi Ada, Fix-It has your device. -Ada Lovelace"
        );
    }

    #[test]
    fn leaves_unknown_and_unbalanced_braces() {
        assert_eq!(render_template("{First_Name} {nope}", &ctx()), "{First_Name} {nope}");
        assert_eq!(render_template("50% {off", &ctx()), "50% {off");
        assert_eq!(render_template("{ {first_name}}", &ctx()), "{ Ada}");
        assert_eq!(render_template("}{", &ctx()), "}{");
    }

    #[test]
    fn segments() {
        assert_eq!(segment_count(""), 0);
        assert_eq!(segment_count(&"a".repeat(160)), 1);
        assert_eq!(segment_count(&"a".repeat(161)), 2);
        assert_eq!(segment_count(&"a".repeat(306)), 2);
        assert_eq!(segment_count(&"a".repeat(307)), 3);
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone(" +1 (555) 010-0100 "), "+15550100100");
        assert_eq!(normalize_phone("555 0100"), "5550100");
        assert_eq!(normalize_phone("--"), "");
    }

    proptest! {
        #[test]
        fn templates_without_braces_are_unchanged(s in "[^{}]*") {
            prop_assert_eq!(render_template(&s, &ctx()), s);
        }

        #[test]
        fn rendering_never_panics(s in ".*") {
            let _ = render_template(&s, &ctx());
        }
    }

    struct Fixture {
        pool: Arc<DbPool>,
        customers: CustomerService,
        user: AuthUser,
    }

    async fn fixture() -> Fixture {
        let pool = migrated_memory_pool().await;
        let worker = seed_worker(&pool, UserRole::Sales).await;
        Fixture {
            customers: CustomerService::new(pool.clone(), detached_sender()),
            user: actor(&worker),
            pool,
        }
    }

    fn service(pool: &Arc<DbPool>, gateway: MockSmsGateway) -> SmsService {
        let events = detached_sender();
        let settings = SettingsService::new(pool.clone(), events.clone(), Duration::from_secs(60));
        SmsService::new(pool.clone(), events, settings, Arc::new(gateway))
    }

    fn draft(name: &str) -> CreateCampaignRequest {
        CreateCampaignRequest {
            name: name.into(),
            message_template: "Hi {first_name}, 10% off at {business_name}".into(),
            recipient_group_id: None,
        }
    }

    #[tokio::test]
    async fn send_filters_dedupes_and_records() {
        let fx = fixture().await;
        fx.customers
            .create(customer_request("Ada", "ada@example.com", "+1 555 0100"))
            .await
            .unwrap();
        // Same number, different formatting.
        fx.customers
            .create(customer_request("Dup", "dup@example.com", "+1 (555) 0100"))
            .await
            .unwrap();
        let opted_out = fx
            .customers
            .create(customer_request("Quiet", "quiet@example.com", "555 0200"))
            .await
            .unwrap();
        fx.customers
            .update(
                opted_out.id,
                UpdateCustomerRequest {
                    sms_opt_in: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        fx.customers
            .create(customer_request("Bob", "bob@example.com", "555 0300"))
            .await
            .unwrap();

        let mut gateway = MockSmsGateway::new();
        gateway
            .expect_send()
            .times(2)
            .returning(|to, _| {
                if to == "5550300" {
                    Err(ServiceError::ExternalServiceError("carrier down".into()))
                } else {
                    Ok("msg-1".into())
                }
            });
        let svc = service(&fx.pool, gateway);

        let campaign = svc.create(&fx.user, draft("Spring")).await.unwrap();
        let preview = svc
            .preview(campaign.id, RecipientSelection::default(), None)
            .await
            .unwrap();
        assert_eq!(preview.total_recipients, 2);
        assert!(preview
            .samples
            .iter()
            .any(|m| m.message == "Hi Bob, 10% off at RepairDesk"));

        let done = svc
            .send(&fx.user, campaign.id, RecipientSelection::default())
            .await
            .unwrap();
        assert_eq!(done.campaign.status, CampaignStatus::Completed);
        assert_eq!(done.campaign.total_recipients, 2);
        assert_eq!(done.campaign.sent_count, 1);
        assert_eq!(done.campaign.failed_count, 1);
        assert!(done.campaign.sent_at.is_some());
        assert_eq!(done.recipients.len(), 2);

        let notes = notification::Entity::find()
            .filter(notification::Column::UserId.eq(fx.user.user_id))
            .all(&*fx.pool)
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Sms);

        assert_matches!(
            svc.send(&fx.user, campaign.id, RecipientSelection::default()).await,
            Err(ServiceError::Conflict(_))
        );
        assert_matches!(
            svc.update(campaign.id, UpdateCampaignRequest::default()).await,
            Err(ServiceError::Conflict(_))
        );
        assert_matches!(svc.delete(campaign.id).await, Err(ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn all_failures_mark_campaign_failed() {
        let fx = fixture().await;
        fx.customers
            .create(customer_request("Ada", "ada@example.com", "555 0100"))
            .await
            .unwrap();
        let mut gateway = MockSmsGateway::new();
        gateway
            .expect_send()
            .returning(|_, _| Err(ServiceError::ExternalServiceError("nope".into())));
        let svc = service(&fx.pool, gateway);

        let campaign = svc.create(&fx.user, draft("Doomed")).await.unwrap();
        let done = svc
            .send(&fx.user, campaign.id, RecipientSelection::default())
            .await
            .unwrap();
        assert_eq!(done.campaign.status, CampaignStatus::Failed);
        assert_eq!(done.recipients[0].status, DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn explicit_ids_limit_the_audience() {
        let fx = fixture().await;
        let ada = fx
            .customers
            .create(customer_request("Ada", "ada@example.com", "555 0100"))
            .await
            .unwrap();
        fx.customers
            .create(customer_request("Bob", "bob@example.com", "555 0300"))
            .await
            .unwrap();
        let svc = service(&fx.pool, MockSmsGateway::new());
        let campaign = svc.create(&fx.user, draft("Just Ada")).await.unwrap();

        let preview = svc
            .preview(
                campaign.id,
                RecipientSelection {
                    customer_ids: Some(vec![ada.id]),
                    recipient_group_id: None,
                },
                Some(10),
            )
            .await
            .unwrap();
        assert_eq!(preview.total_recipients, 1);
        assert_eq!(preview.samples[0].customer_id, ada.id);
    }

    #[tokio::test]
    async fn empty_audience_is_rejected() {
        let fx = fixture().await;
        let svc = service(&fx.pool, MockSmsGateway::new());
        let campaign = svc.create(&fx.user, draft("Nobody")).await.unwrap();
        assert_matches!(
            svc.send(&fx.user, campaign.id, RecipientSelection::default()).await,
            Err(ServiceError::InvalidInput(_))
        );
        assert_eq!(svc.get(campaign.id).await.unwrap().campaign.status, CampaignStatus::Draft);
    }

    #[tokio::test]
    async fn single_message_is_stored_without_campaign() {
        let fx = fixture().await;
        let ada = fx
            .customers
            .create(customer_request("Ada", "ada@example.com", "555 0100"))
            .await
            .unwrap();
        let mut gateway = MockSmsGateway::new();
        gateway
            .expect_send()
            .withf(|to, body| to == "5550100" && body == "Ada, your device is ready")
            .times(1)
            .returning(|_, _| Ok("msg-9".into()));
        let svc = service(&fx.pool, gateway);

        let row = svc
            .send_single(SendSingleRequest {
                customer_id: ada.id,
                message: "{first_name}, your device is ready".into(),
            })
            .await
            .unwrap();
        assert_eq!(row.campaign_id, None);
        assert_eq!(row.provider_message_id.as_deref(), Some("msg-9"));
    }

    /// Delivers normally but drops the recipients table on the given call,
    /// so recording that delivery fails.
    struct BreaksStorageOn {
        pool: Arc<DbPool>,
        calls: std::sync::atomic::AtomicUsize,
        fail_on: usize,
    }

    #[async_trait::async_trait]
    impl SmsGateway for BreaksStorageOn {
        async fn send(&self, _to: &str, _body: &str) -> Result<String, ServiceError> {
            let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            if call == self.fail_on {
                use sea_orm::ConnectionTrait;
                self.pool.execute_unprepared("DROP TABLE sms_recipients").await?;
            }
            Ok(format!("msg-{}", call))
        }
    }

    fn breaking_service(pool: &Arc<DbPool>, fail_on: usize) -> SmsService {
        let events = detached_sender();
        let settings = SettingsService::new(pool.clone(), events.clone(), Duration::from_secs(60));
        let gateway = BreaksStorageOn {
            pool: pool.clone(),
            calls: Default::default(),
            fail_on,
        };
        SmsService::new(pool.clone(), events, settings, Arc::new(gateway))
    }

    #[tokio::test]
    async fn interrupted_send_keeps_partial_counts() {
        let fx = fixture().await;
        fx.customers
            .create(customer_request("Ada", "ada@example.com", "555 0100"))
            .await
            .unwrap();
        fx.customers
            .create(customer_request("Bob", "bob@example.com", "555 0300"))
            .await
            .unwrap();
        let svc = breaking_service(&fx.pool, 2);
        let campaign = svc.create(&fx.user, draft("Halfway")).await.unwrap();

        assert!(svc
            .send(&fx.user, campaign.id, RecipientSelection::default())
            .await
            .is_err());

        let row = sms_campaign::Entity::find_by_id(campaign.id)
            .one(&*fx.pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, CampaignStatus::Failed);
        assert_eq!(row.total_recipients, 2);
        assert_eq!(row.sent_count, 1);
        assert_eq!(row.failed_count, 0);
        assert!(row.sent_at.is_some());
    }

    #[tokio::test]
    async fn send_failing_before_any_delivery_returns_to_draft() {
        let fx = fixture().await;
        fx.customers
            .create(customer_request("Ada", "ada@example.com", "555 0100"))
            .await
            .unwrap();
        let svc = breaking_service(&fx.pool, 1);
        let campaign = svc.create(&fx.user, draft("Retry me")).await.unwrap();

        assert!(svc
            .send(&fx.user, campaign.id, RecipientSelection::default())
            .await
            .is_err());

        let row = sms_campaign::Entity::find_by_id(campaign.id)
            .one(&*fx.pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, CampaignStatus::Draft);
        assert_eq!(row.total_recipients, 0);
        assert_eq!(row.sent_count, 0);
        assert!(row.sent_at.is_none());
    }
}
