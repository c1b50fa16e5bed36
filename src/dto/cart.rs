use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::DeliveryMode;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub menu_item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetDeliveryModeRequest {
    pub delivery_mode: DeliveryMode,
}
