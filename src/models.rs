use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Declares a status-like enum stored as a snake_case string column.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(AppError::Internal(anyhow::anyhow!(
                        "unknown {} value {other:?}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

text_enum!(
    /// Lifecycle of a placed order.
    OrderStatus {
        Pending => "pending",
        Accepted => "accepted",
        Preparing => "preparing",
        ReadyForPickup => "ready_for_pickup",
        DriverAssigned => "driver_assigned",
        OnTheWay => "on_the_way",
        Delivered => "delivered",
        Cancelled => "cancelled",
        Refunded => "refunded",
    }
);

impl OrderStatus {
    /// Absorbing states: nothing leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }
}

text_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

text_enum!(PaymentMethod {
    Paypal => "paypal",
    Mastercard => "mastercard",
    Bank => "bank",
});

text_enum!(DeliveryMode {
    Pickup => "pickup",
    Delivery => "delivery",
});

text_enum!(VehicleType {
    Bike => "bike",
    Car => "car",
});

text_enum!(TransactionStatus {
    Pending => "pending",
    Success => "success",
    Failed => "failed",
});

text_enum!(RefundStatus {
    Pending => "pending",
    Success => "success",
    Failed => "failed",
});

text_enum!(RestaurantStatus {
    Pending => "pending",
    Active => "active",
    Rejected => "rejected",
    Suspended => "suspended",
});

text_enum!(
    /// Platform role carried in the caller's token.
    Role {
        Customer => "customer",
        RestaurantOwner => "restaurant_owner",
        Driver => "driver",
        Admin => "admin",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Restaurant {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: RestaurantStatus,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub delivery_mode: DeliveryMode,
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    pub service_fee: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub item_name: String,
    pub item_price: Decimal,
    pub item_image_url: Option<String>,
    pub quantity: i32,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Address fields frozen into the order at checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AddressSnapshot {
    pub full_name: String,
    pub phone_number: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub delivery_mode: DeliveryMode,
    pub address: AddressSnapshot,
    pub delivery_note: String,
    pub food_subtotal: Decimal,
    pub service_fee: Decimal,
    pub delivery_fee: Decimal,
    pub tip_amount: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_reference: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Option<Uuid>,
    pub item_name: String,
    pub item_description: String,
    pub item_ingredients: String,
    pub item_price: Decimal,
    pub item_image_url: Option<String>,
    pub quantity: i32,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_type: VehicleType,
    pub is_active: bool,
    pub hourly_rate: Decimal,
    pub per_km_rate: Decimal,
    pub service_area_city: String,
    pub service_radius_km: f64,
    pub home_latitude: Option<f64>,
    pub home_longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverShift {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_minutes: Option<i32>,
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryAssignment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub driver_id: Uuid,
    pub distance_km: f64,
    /// Set when coordinates were missing and the vehicle range was not checked.
    pub distance_unverified: bool,
    pub per_km_rate: Decimal,
    pub distance_pay: Decimal,
    pub bonus_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: TransactionStatus,
    pub provider_reference: String,
    pub raw_response: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderCommission {
    pub id: Uuid,
    pub order_id: Uuid,
    pub restaurant_id: Uuid,
    pub commission_rate: Decimal,
    pub food_subtotal: Decimal,
    pub commission_amount: Decimal,
    pub restaurant_net_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Refund {
    pub id: Uuid,
    pub order_id: Uuid,
    pub payment_transaction_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub status: RefundStatus,
    pub reason: String,
    pub provider_reference: String,
    pub created_at: DateTime<Utc>,
}
