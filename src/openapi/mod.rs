use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

/// Registers the JWT bearer scheme referenced by `security(("Bearer" = []))`.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RepairDesk API",
        version = "1.0.0",
        description = r#"
# RepairDesk Repair Shop API

Back office for a computer and phone repair shop.

- **Repairs**: register devices, move them through the repair workflow, print receipts
- **Customers**: contact details, SMS opt-in, device history
- **Inventory**: parts stock, manual adjustments, reorder predictions
- **Sales**: point of sale with stock deduction and tax
- **SMS**: templated campaigns and recipient groups
- **Back office**: appointments, expenses, budgets, customer loans, settings

## Authentication

Sign in with `POST /api/v1/auth/login` and send the returned token:

```
Authorization: Bearer <token>
```

## Errors

Failures use one shape with an HTTP status that matches the `error` field:

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "details": ["email: Invalid email"]
}
```

## Pagination

List endpoints take `page` (default 1) and `limit` (default 20, capped by configuration).
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    modifiers(&BearerSecurity),
    tags(
        (name = "auth", description = "Sign in and own account"),
        (name = "workers", description = "Staff accounts and roles"),
        (name = "locations", description = "Shop locations"),
        (name = "customers", description = "Customer records"),
        (name = "devices", description = "Repair tickets"),
        (name = "tracking", description = "Public repair status lookup"),
        (name = "inventory", description = "Parts stock and reorder predictions"),
        (name = "sales", description = "Point of sale"),
        (name = "appointments", description = "Scheduled drop-offs and pickups"),
        (name = "finance", description = "Expenses and budgets"),
        (name = "loans", description = "Customer loan invoices"),
        (name = "notifications", description = "In-app notifications"),
        (name = "sms", description = "SMS campaigns and recipient groups"),
        (name = "settings", description = "Business and advanced settings"),
        (name = "dashboard", description = "Shop overview")
    ),
    paths(
        // Auth
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::change_own_password,

        // Workers
        crate::handlers::workers::list_workers,
        crate::handlers::workers::get_worker,
        crate::handlers::workers::create_worker,
        crate::handlers::workers::update_worker,
        crate::handlers::workers::deactivate_worker,
        crate::handlers::workers::reset_password,

        // Locations
        crate::handlers::locations::list_locations,
        crate::handlers::locations::get_location,
        crate::handlers::locations::create_location,
        crate::handlers::locations::update_location,
        crate::handlers::locations::delete_location,

        // Customers
        crate::handlers::customers::list_customers,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::list_customer_devices,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,

        // Devices
        crate::handlers::devices::track_device,
        crate::handlers::devices::list_devices,
        crate::handlers::devices::get_device_by_tracking_code,
        crate::handlers::devices::get_device,
        crate::handlers::devices::get_device_history,
        crate::handlers::devices::get_device_receipt,
        crate::handlers::devices::register_device,
        crate::handlers::devices::update_device,
        crate::handlers::devices::change_device_status,
        crate::handlers::devices::assign_technician,
        crate::handlers::devices::delete_device,

        // Inventory
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::list_low_stock,
        crate::handlers::inventory::get_predictions,
        crate::handlers::inventory::get_inventory_item,
        crate::handlers::inventory::get_item_usage,
        crate::handlers::inventory::list_adjustments,
        crate::handlers::inventory::create_inventory_item,
        crate::handlers::inventory::update_inventory_item,
        crate::handlers::inventory::delete_inventory_item,
        crate::handlers::inventory::adjust_stock,

        // Sales
        crate::handlers::sales::list_sales,
        crate::handlers::sales::get_sale,
        crate::handlers::sales::create_sale,

        // Appointments
        crate::handlers::appointments::list_appointments,
        crate::handlers::appointments::get_appointment,
        crate::handlers::appointments::create_appointment,
        crate::handlers::appointments::update_appointment,
        crate::handlers::appointments::delete_appointment,

        // Finance
        crate::handlers::finance::list_expenses,
        crate::handlers::finance::create_expense,
        crate::handlers::finance::update_expense,
        crate::handlers::finance::delete_expense,
        crate::handlers::finance::list_budgets,
        crate::handlers::finance::budget_summary,
        crate::handlers::finance::create_budget,
        crate::handlers::finance::update_budget,
        crate::handlers::finance::delete_budget,

        // Loans
        crate::handlers::loans::list_loans,
        crate::handlers::loans::get_loan,
        crate::handlers::loans::create_loan,
        crate::handlers::loans::delete_loan,
        crate::handlers::loans::record_payment,

        // Notifications
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::unread_count,
        crate::handlers::notifications::mark_read,
        crate::handlers::notifications::mark_all_read,
        crate::handlers::notifications::create_notification,

        // SMS
        crate::handlers::sms::list_campaigns,
        crate::handlers::sms::get_campaign,
        crate::handlers::sms::preview_campaign,
        crate::handlers::sms::create_campaign,
        crate::handlers::sms::update_campaign,
        crate::handlers::sms::delete_campaign,
        crate::handlers::sms::send_campaign,
        crate::handlers::sms::send_single,
        crate::handlers::recipient_groups::list_groups,
        crate::handlers::recipient_groups::get_group,
        crate::handlers::recipient_groups::create_group,
        crate::handlers::recipient_groups::update_group,
        crate::handlers::recipient_groups::delete_group,
        crate::handlers::recipient_groups::add_members,
        crate::handlers::recipient_groups::remove_member,

        // Settings
        crate::handlers::settings::get_business_settings,
        crate::handlers::settings::update_business_settings,
        crate::handlers::settings::list_advanced_settings,
        crate::handlers::settings::get_advanced_setting,
        crate::handlers::settings::put_advanced_setting,
        crate::handlers::settings::delete_advanced_setting,

        // Dashboard
        crate::handlers::dashboard::get_stats,
    ),
    components(schemas(crate::errors::ErrorResponse, crate::ListQuery))
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_repair_endpoints() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("RepairDesk API"));
        assert!(json.contains("/api/v1/devices/{id}/status"));
        assert!(json.contains("/api/v1/sms/campaigns/{id}/send"));
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let openapi = ApiDocV1::openapi();
        let schemes = &openapi
            .components
            .expect("components present")
            .security_schemes;
        assert!(schemes.contains_key("Bearer"));
    }
}
