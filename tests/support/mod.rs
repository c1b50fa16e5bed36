#![allow(dead_code)]

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use food_delivery_api::{
    config::FulfillmentConfig,
    db::{create_orm_conn, run_migrations},
    dto::{
        cart::AddCartItemRequest,
        delivery::UpdateDriverProfileRequest,
        orders::CheckoutRequest,
    },
    entity::{
        addresses::ActiveModel as AddressActive, menu_items::ActiveModel as MenuItemActive,
        restaurants::ActiveModel as RestaurantActive,
    },
    middleware::auth::AuthUser,
    models::{
        DeliveryMode, Order, OrderStatus, PaymentMethod, PaymentTransaction, RestaurantStatus,
        Role, VehicleType,
    },
    services::{
        cart_service, delivery_service,
        gateway::{CaptureRequest, GatewayError, GatewayReceipt, PaymentGateway},
        order_service,
    },
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use serde_json::json;
use uuid::Uuid;

pub const RESTAURANT_LAT: f64 = 52.5200;
pub const RESTAURANT_LON: f64 = 13.4050;

/// In-memory SQLite with the schema applied. One connection, so every test
/// gets its own database and concurrent callers queue for the pool.
pub async fn setup_state() -> anyhow::Result<AppState> {
    setup_state_with(FulfillmentConfig::default()).await
}

/// A fresh SQLite file in WAL mode behind a pool of eight connections, for
/// tests where concurrent callers must really overlap inside the database.
pub async fn setup_shared_state() -> anyhow::Result<AppState> {
    let path = std::env::temp_dir().join(format!("food-delivery-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let orm = create_orm_conn(&url, 8).await?;
    orm.execute(Statement::from_string(
        orm.get_database_backend(),
        "PRAGMA journal_mode = WAL",
    ))
    .await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, "test-secret", FulfillmentConfig::default()))
}

pub async fn setup_state_with(config: FulfillmentConfig) -> anyhow::Result<AppState> {
    let orm = create_orm_conn("sqlite::memory:", 1).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, "test-secret", config))
}

pub fn customer() -> AuthUser {
    AuthUser::new(Uuid::new_v4(), Role::Customer)
}

pub fn driver() -> AuthUser {
    AuthUser::new(Uuid::new_v4(), Role::Driver)
}

pub fn admin() -> AuthUser {
    AuthUser::new(Uuid::new_v4(), Role::Admin)
}

pub struct Fixture {
    pub owner: AuthUser,
    pub restaurant_id: Uuid,
    pub menu_item_id: Uuid,
}

/// A Berlin restaurant with one active 9.50 menu item.
pub async fn seed_restaurant(state: &AppState) -> anyhow::Result<Fixture> {
    let owner = AuthUser::new(Uuid::new_v4(), Role::RestaurantOwner);
    let now = Utc::now();

    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner.user_id),
        name: Set("Pizzeria Test".into()),
        city: Set("Berlin".into()),
        latitude: Set(Some(RESTAURANT_LAT)),
        longitude: Set(Some(RESTAURANT_LON)),
        status: Set(RestaurantStatus::Active.as_str().into()),
        is_active: Set(true),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    let menu_item = seed_menu_item(state, restaurant.id, 950).await?;

    Ok(Fixture {
        owner,
        restaurant_id: restaurant.id,
        menu_item_id: menu_item,
    })
}

pub async fn seed_menu_item(
    state: &AppState,
    restaurant_id: Uuid,
    price_cents: i64,
) -> anyhow::Result<Uuid> {
    let item = MenuItemActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set("Margherita".into()),
        description: Set("Classic".into()),
        ingredients: Set("Tomato, mozzarella".into()),
        price_cents: Set(price_cents),
        image_url: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(item.id)
}

/// Customer address `km_north` kilometres due north of the restaurant, or
/// without coordinates when `None`.
pub async fn seed_address(
    state: &AppState,
    customer: &AuthUser,
    km_north: Option<f64>,
) -> anyhow::Result<Uuid> {
    // One degree of latitude is ~111.195 km on the mean-radius sphere.
    let latitude = km_north.map(|km| RESTAURANT_LAT + km / 111.195);
    let longitude = km_north.map(|_| RESTAURANT_LON);
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer.user_id),
        full_name: Set("Test Customer".into()),
        phone_number: Set("+49 30 123456".into()),
        street: Set("Teststrasse 1".into()),
        city: Set("Berlin".into()),
        postal_code: Set("10115".into()),
        country: Set("DE".into()),
        latitude: Set(latitude),
        longitude: Set(longitude),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(address.id)
}

/// Adds `quantity` of the fixture's item and checks out a delivery order.
pub async fn place_delivery_order(
    state: &AppState,
    fixture: &Fixture,
    customer: &AuthUser,
    quantity: i32,
    km_north: Option<f64>,
) -> anyhow::Result<Order> {
    let address_id = seed_address(state, customer, km_north).await?;
    cart_service::add_item(
        state,
        customer,
        fixture.restaurant_id,
        AddCartItemRequest {
            menu_item_id: fixture.menu_item_id,
            quantity,
        },
    )
    .await?;

    let placed = order_service::checkout(
        state,
        customer,
        CheckoutRequest {
            restaurant_id: fixture.restaurant_id,
            delivery_mode: Some(DeliveryMode::Delivery),
            address_id: Some(address_id),
            tip_amount: Decimal::ZERO,
            payment_method: PaymentMethod::Paypal,
            delivery_note: String::new(),
        },
    )
    .await?;
    Ok(placed.data.expect("order").order)
}

/// Walks an order from pending to ready_for_pickup as the restaurant owner.
pub async fn make_ready(state: &AppState, fixture: &Fixture, order_id: Uuid) -> anyhow::Result<()> {
    for status in [
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::ReadyForPickup,
    ] {
        order_service::advance_status(state, &fixture.owner, order_id, status).await?;
    }
    Ok(())
}

pub async fn set_vehicle(
    state: &AppState,
    driver: &AuthUser,
    vehicle: VehicleType,
    city: &str,
) -> anyhow::Result<()> {
    delivery_service::update_profile(
        state,
        driver,
        UpdateDriverProfileRequest {
            vehicle_type: Some(vehicle),
            service_area_city: Some(city.into()),
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}

/// Refuses every capture.
pub struct DecliningGateway;

#[async_trait]
impl PaymentGateway for DecliningGateway {
    async fn capture(&self, _request: CaptureRequest) -> Result<GatewayReceipt, GatewayError> {
        Err(GatewayError::Declined("card declined".into()))
    }

    async fn refund(
        &self,
        _transaction: &PaymentTransaction,
    ) -> Result<GatewayReceipt, GatewayError> {
        Err(GatewayError::Declined("refund declined".into()))
    }
}

/// Answers only after `delay`.
pub struct SlowGateway {
    pub delay: Duration,
}

#[async_trait]
impl PaymentGateway for SlowGateway {
    async fn capture(&self, _request: CaptureRequest) -> Result<GatewayReceipt, GatewayError> {
        tokio::time::sleep(self.delay).await;
        Ok(GatewayReceipt {
            reference: "LATE".into(),
            raw_response: Some(json!({ "late": true })),
        })
    }

    async fn refund(
        &self,
        _transaction: &PaymentTransaction,
    ) -> Result<GatewayReceipt, GatewayError> {
        tokio::time::sleep(self.delay).await;
        Ok(GatewayReceipt {
            reference: "LATE".into(),
            raw_response: None,
        })
    }
}
