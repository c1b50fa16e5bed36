use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderCommission, PaymentMethod, PaymentTransaction, Refund};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PayOrderRequest {
    /// Overrides the method chosen at checkout.
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RefundRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentReceipt {
    pub order: Order,
    pub transaction: PaymentTransaction,
    pub commission: OrderCommission,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefundReceipt {
    pub order: Order,
    pub refund: Refund,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionList {
    pub items: Vec<PaymentTransaction>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefundList {
    pub items: Vec<Refund>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommissionList {
    pub items: Vec<OrderCommission>,
}
