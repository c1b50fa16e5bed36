//! Order status transition table.

use crate::{
    authz::Action,
    error::{AppError, AppResult},
    models::{DeliveryMode, OrderStatus},
};

/// Who may drive a given edge of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Performer {
    /// Restaurant owner, or an admin acting for the restaurant.
    Restaurant,
    /// The ordering customer, self-service.
    Customer,
    /// The driver claiming (assignment) or carrying the order.
    Driver,
    /// Refund workflow; never reachable through a status request.
    Payments,
}

impl Performer {
    /// The authorization check a caller must pass to act as this performer.
    pub fn action(self, to: OrderStatus) -> Action {
        match (self, to) {
            (Performer::Driver, OrderStatus::DriverAssigned) => Action::AcceptDelivery,
            (Performer::Driver, _) => Action::DriverTransition,
            (Performer::Restaurant, _) => Action::RestaurantTransition,
            (Performer::Customer, _) => Action::CustomerCancel,
            (Performer::Payments, _) => Action::Refund,
        }
    }
}

const RESTAURANT: &[Performer] = &[Performer::Restaurant];
const RESTAURANT_OR_CUSTOMER: &[Performer] = &[Performer::Restaurant, Performer::Customer];
const DRIVER: &[Performer] = &[Performer::Driver];
const PAYMENTS: &[Performer] = &[Performer::Payments];

/// Performers allowed to move an order from `from` to `to`, or `None` when
/// the edge does not exist for this delivery mode.
pub fn performers(
    from: OrderStatus,
    to: OrderStatus,
    mode: DeliveryMode,
) -> Option<&'static [Performer]> {
    use OrderStatus::*;

    match (from, to) {
        (Pending, Accepted) | (Accepted, Preparing) | (Preparing, ReadyForPickup) => {
            Some(RESTAURANT)
        }
        (Pending | Accepted | Preparing, Cancelled) => Some(RESTAURANT_OR_CUSTOMER),
        (ReadyForPickup, DriverAssigned) if mode == DeliveryMode::Delivery => Some(DRIVER),
        (ReadyForPickup, Delivered) if mode == DeliveryMode::Pickup => Some(RESTAURANT),
        (DriverAssigned, OnTheWay) | (OnTheWay, Delivered) => Some(DRIVER),
        (current, Refunded) if !current.is_terminal() => Some(PAYMENTS),
        _ => None,
    }
}

/// Looks up the edge, failing with `InvalidTransition` when it is not in the table.
pub fn edge(
    from: OrderStatus,
    to: OrderStatus,
    mode: DeliveryMode,
) -> AppResult<&'static [Performer]> {
    performers(from, to, mode).ok_or(AppError::InvalidTransition {
        current: from,
        requested: to,
    })
}
