use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{DeliveryMode, Order, OrderItem, OrderStatus, PaymentMethod};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub restaurant_id: Uuid,
    /// Defaults to the mode stored on the cart.
    pub delivery_mode: Option<DeliveryMode>,
    /// Required for delivery orders.
    pub address_id: Option<Uuid>,
    #[serde(default)]
    pub tip_amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub delivery_note: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
