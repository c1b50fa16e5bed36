//! Uniform authorization for every order-touching operation.
//!
//! Services describe *what* is being touched ([`Resource`]) and *how*
//! ([`Action`]); a [`Policy`] decides whether the caller may do it.

use uuid::Uuid;

use crate::{
    entity::orders::Model as OrderModel,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Role,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read an order and its items.
    ViewOrder,
    /// Edit one's own cart and place orders from it.
    ManageCart,
    /// Kitchen-side transitions: accept, prepare, ready, pickup hand-over, cancel.
    RestaurantTransition,
    /// Self-service cancellation by the ordering customer.
    CustomerCancel,
    /// Claim an eligible order as a driver.
    AcceptDelivery,
    /// Progress an order already bound to the calling driver.
    DriverTransition,
    Pay,
    Refund,
    ViewRestaurantOrders,
    ManageDriverProfile,
    /// Platform-wide listings.
    Administer,
}

/// Ownership facts about the thing being acted on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resource {
    pub customer_id: Option<Uuid>,
    pub restaurant_owner_id: Option<Uuid>,
    /// User id of the driver bound to the order, if any.
    pub driver_user_id: Option<Uuid>,
}

impl Resource {
    pub fn platform() -> Self {
        Self::default()
    }

    pub fn customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    pub fn restaurant(owner_id: Uuid) -> Self {
        Self {
            restaurant_owner_id: Some(owner_id),
            ..Self::default()
        }
    }

    pub fn order(
        order: &OrderModel,
        restaurant_owner_id: Uuid,
        driver_user_id: Option<Uuid>,
    ) -> Self {
        Self {
            customer_id: Some(order.customer_id),
            restaurant_owner_id: Some(restaurant_owner_id),
            driver_user_id,
        }
    }
}

pub trait Policy: Send + Sync {
    fn authorize(&self, actor: &AuthUser, resource: &Resource, action: Action) -> AppResult<()>;

    fn allows(&self, actor: &AuthUser, resource: &Resource, action: Action) -> bool {
        self.authorize(actor, resource, action).is_ok()
    }
}

/// Default rules: admins and staff act for restaurants and the platform,
/// everyone else only on what they own.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl Policy for RolePolicy {
    fn authorize(&self, actor: &AuthUser, resource: &Resource, action: Action) -> AppResult<()> {
        let is_customer = resource.customer_id == Some(actor.user_id);
        let is_owner = resource.restaurant_owner_id == Some(actor.user_id);
        let is_driver = resource.driver_user_id == Some(actor.user_id);
        let admin = actor.is_admin();

        let allowed = match action {
            Action::ViewOrder => admin || is_customer || is_owner || is_driver,
            Action::ManageCart => actor.role == Role::Customer && is_customer,
            Action::RestaurantTransition | Action::ViewRestaurantOrders => admin || is_owner,
            Action::CustomerCancel => is_customer,
            Action::AcceptDelivery | Action::ManageDriverProfile => actor.role == Role::Driver,
            Action::DriverTransition => actor.role == Role::Driver && is_driver,
            Action::Pay | Action::Refund => admin || is_customer,
            Action::Administer => admin,
        };

        if allowed {
            Ok(())
        } else {
            tracing::debug!(user_id = %actor.user_id, ?action, "authorization denied");
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser::new(Uuid::new_v4(), role)
    }

    #[test]
    fn customers_only_touch_their_own_orders() {
        let customer = user(Role::Customer);
        let stranger = user(Role::Customer);
        let resource = Resource {
            customer_id: Some(customer.user_id),
            restaurant_owner_id: Some(Uuid::new_v4()),
            driver_user_id: None,
        };

        assert!(RolePolicy.allows(&customer, &resource, Action::CustomerCancel));
        assert!(RolePolicy.allows(&customer, &resource, Action::Pay));
        assert!(!RolePolicy.allows(&stranger, &resource, Action::ViewOrder));
        assert!(!RolePolicy.allows(&customer, &resource, Action::RestaurantTransition));
    }

    #[test]
    fn staff_flag_grants_admin_rights() {
        let mut staff = user(Role::Customer);
        staff.is_staff = true;

        assert!(RolePolicy.allows(&staff, &Resource::platform(), Action::Administer));
        assert!(RolePolicy.allows(&staff, &Resource::customer(Uuid::new_v4()), Action::Refund));
    }

    #[test]
    fn drivers_progress_only_orders_bound_to_them() {
        let driver = user(Role::Driver);
        let other = user(Role::Driver);
        let resource = Resource {
            driver_user_id: Some(driver.user_id),
            ..Resource::default()
        };

        assert!(RolePolicy.allows(&driver, &resource, Action::DriverTransition));
        assert!(!RolePolicy.allows(&other, &resource, Action::DriverTransition));
        assert!(RolePolicy.allows(&other, &Resource::platform(), Action::AcceptDelivery));
    }
}
