/*!
 * # Permissions Module
 *
 * Permissions are `resource:action` strings. Each worker role owns a fixed
 * set; admins bypass the check entirely.
 */

use crate::entities::user::UserRole;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Common permission string constants for compile-time safety
pub mod consts {
    // Customers
    pub const CUSTOMERS_READ: &str = "customers:read";
    pub const CUSTOMERS_CREATE: &str = "customers:create";
    pub const CUSTOMERS_UPDATE: &str = "customers:update";
    pub const CUSTOMERS_DELETE: &str = "customers:delete";

    // Devices
    pub const DEVICES_READ: &str = "devices:read";
    pub const DEVICES_CREATE: &str = "devices:create";
    pub const DEVICES_UPDATE: &str = "devices:update";
    pub const DEVICES_DELETE: &str = "devices:delete";

    // Inventory
    pub const INVENTORY_READ: &str = "inventory:read";
    pub const INVENTORY_MANAGE: &str = "inventory:manage";
    pub const INVENTORY_ADJUST: &str = "inventory:adjust";

    // Sales
    pub const SALES_READ: &str = "sales:read";
    pub const SALES_CREATE: &str = "sales:create";

    // Appointments
    pub const APPOINTMENTS_READ: &str = "appointments:read";
    pub const APPOINTMENTS_MANAGE: &str = "appointments:manage";

    // Finance
    pub const FINANCE_READ: &str = "finance:read";
    pub const FINANCE_MANAGE: &str = "finance:manage";

    // Loans
    pub const LOANS_READ: &str = "loans:read";
    pub const LOANS_MANAGE: &str = "loans:manage";

    // Notifications
    pub const NOTIFICATIONS_CREATE: &str = "notifications:create";

    // SMS
    pub const SMS_READ: &str = "sms:read";
    pub const SMS_MANAGE: &str = "sms:manage";
    pub const SMS_SEND: &str = "sms:send";

    // Settings
    pub const SETTINGS_READ: &str = "settings:read";
    pub const SETTINGS_UPDATE: &str = "settings:update";

    // Workers
    pub const USERS_READ: &str = "users:read";
    pub const USERS_MANAGE: &str = "users:manage";

    // Locations
    pub const LOCATIONS_READ: &str = "locations:read";
    pub const LOCATIONS_MANAGE: &str = "locations:manage";

    // Dashboard
    pub const DASHBOARD_READ: &str = "dashboard:read";
}

use consts::*;

/// Every permission known to the system.
pub const ALL_PERMISSIONS: &[&str] = &[
    CUSTOMERS_READ,
    CUSTOMERS_CREATE,
    CUSTOMERS_UPDATE,
    CUSTOMERS_DELETE,
    DEVICES_READ,
    DEVICES_CREATE,
    DEVICES_UPDATE,
    DEVICES_DELETE,
    INVENTORY_READ,
    INVENTORY_MANAGE,
    INVENTORY_ADJUST,
    SALES_READ,
    SALES_CREATE,
    APPOINTMENTS_READ,
    APPOINTMENTS_MANAGE,
    FINANCE_READ,
    FINANCE_MANAGE,
    LOANS_READ,
    LOANS_MANAGE,
    NOTIFICATIONS_CREATE,
    SMS_READ,
    SMS_MANAGE,
    SMS_SEND,
    SETTINGS_READ,
    SETTINGS_UPDATE,
    USERS_READ,
    USERS_MANAGE,
    LOCATIONS_READ,
    LOCATIONS_MANAGE,
    DASHBOARD_READ,
];

lazy_static! {
    static ref ROLE_PERMISSIONS: HashMap<UserRole, Vec<&'static str>> = {
        let mut map = HashMap::new();

        map.insert(UserRole::Admin, ALL_PERMISSIONS.to_vec());

        map.insert(
            UserRole::Manager,
            ALL_PERMISSIONS
                .iter()
                .copied()
                .filter(|p| *p != USERS_MANAGE && *p != LOCATIONS_MANAGE)
                .collect(),
        );

        map.insert(
            UserRole::Technician,
            vec![
                CUSTOMERS_READ,
                CUSTOMERS_CREATE,
                DEVICES_READ,
                DEVICES_CREATE,
                DEVICES_UPDATE,
                INVENTORY_READ,
                INVENTORY_ADJUST,
                APPOINTMENTS_READ,
                APPOINTMENTS_MANAGE,
                SETTINGS_READ,
                USERS_READ,
                LOCATIONS_READ,
                DASHBOARD_READ,
            ],
        );

        map.insert(
            UserRole::Sales,
            vec![
                CUSTOMERS_READ,
                CUSTOMERS_CREATE,
                CUSTOMERS_UPDATE,
                DEVICES_READ,
                DEVICES_CREATE,
                INVENTORY_READ,
                SALES_READ,
                SALES_CREATE,
                APPOINTMENTS_READ,
                APPOINTMENTS_MANAGE,
                LOANS_READ,
                LOANS_MANAGE,
                SMS_READ,
                SMS_MANAGE,
                SMS_SEND,
                SETTINGS_READ,
                USERS_READ,
                LOCATIONS_READ,
                DASHBOARD_READ,
            ],
        );

        map
    };
}

/// Permission set granted to a role.
pub fn permissions_for_role(role: UserRole) -> Vec<String> {
    ROLE_PERMISSIONS
        .get(&role)
        .map(|perms| perms.iter().map(|p| p.to_string()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_everything() {
        assert_eq!(
            permissions_for_role(UserRole::Admin).len(),
            ALL_PERMISSIONS.len()
        );
    }

    #[test]
    fn manager_cannot_manage_workers() {
        let perms = permissions_for_role(UserRole::Manager);
        assert!(perms.iter().any(|p| p == SETTINGS_UPDATE));
        assert!(!perms.iter().any(|p| p == USERS_MANAGE));
    }

    #[test]
    fn technician_cannot_sell_or_text() {
        let perms = permissions_for_role(UserRole::Technician);
        assert!(perms.iter().any(|p| p == DEVICES_UPDATE));
        assert!(!perms.iter().any(|p| p == SALES_CREATE));
        assert!(!perms.iter().any(|p| p == SMS_SEND));
    }

    #[test]
    fn every_permission_is_resource_action() {
        for perm in ALL_PERMISSIONS {
            let (resource, action) = perm.split_once(':').expect("resource:action");
            assert!(!resource.is_empty() && !action.is_empty());
        }
    }
}
