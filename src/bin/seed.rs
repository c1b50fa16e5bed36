//! Seeds one demo restaurant with a menu, a customer address and a driver,
//! and prints bearer tokens for each role.

use chrono::{Duration, Utc};
use food_delivery_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        Restaurants, addresses::ActiveModel as AddressActive,
        driver_profiles::ActiveModel as DriverProfileActive,
        menu_items::ActiveModel as MenuItemActive, restaurants::ActiveModel as RestaurantActive,
    },
    middleware::auth::Claims,
    models::{RestaurantStatus, Role, VehicleType},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

const RESTAURANT_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0001);
const OWNER_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0002);
const CUSTOMER_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0003);
const DRIVER_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0004);
const ADMIN_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0005);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url, 1).await?;
    run_migrations(&orm).await?;

    if Restaurants::find_by_id(RESTAURANT_ID).one(&orm).await?.is_some() {
        println!("Seed data already present");
    } else {
        seed_restaurant(&orm).await?;
        seed_customer(&orm).await?;
        seed_driver(&orm).await?;
        println!("Seed completed. Restaurant ID: {RESTAURANT_ID}");
    }

    for (label, user_id, role) in [
        ("customer", CUSTOMER_ID, Role::Customer),
        ("owner", OWNER_ID, Role::RestaurantOwner),
        ("driver", DRIVER_ID, Role::Driver),
        ("admin", ADMIN_ID, Role::Admin),
    ] {
        let token = issue_token(&config.jwt_secret, user_id, role)?;
        println!("{label} ({user_id}): Bearer {token}");
    }
    Ok(())
}

async fn seed_restaurant(orm: &OrmConn) -> anyhow::Result<()> {
    let now = Utc::now();
    RestaurantActive {
        id: Set(RESTAURANT_ID),
        owner_id: Set(OWNER_ID),
        name: Set("Trattoria Demo".into()),
        city: Set("Berlin".into()),
        latitude: Set(Some(52.5200)),
        longitude: Set(Some(13.4050)),
        status: Set(RestaurantStatus::Active.as_str().into()),
        is_active: Set(true),
        created_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    let menu = [
        ("Margherita", "Tomato, mozzarella, basil", 950),
        ("Tiramisu", "Mascarpone, espresso, cocoa", 650),
        ("Lemonade", "Fresh lemons, mint", 350),
    ];
    for (name, ingredients, price_cents) in menu {
        MenuItemActive {
            id: Set(Uuid::new_v4()),
            restaurant_id: Set(RESTAURANT_ID),
            name: Set(name.into()),
            description: Set(String::new()),
            ingredients: Set(ingredients.into()),
            price_cents: Set(price_cents),
            image_url: Set(None),
            is_active: Set(true),
            created_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
        println!("Seeded menu item {name}");
    }
    Ok(())
}

async fn seed_customer(orm: &OrmConn) -> anyhow::Result<()> {
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(CUSTOMER_ID),
        full_name: Set("Demo Customer".into()),
        phone_number: Set("+49 30 000000".into()),
        street: Set("Alexanderplatz 1".into()),
        city: Set("Berlin".into()),
        postal_code: Set("10178".into()),
        country: Set("DE".into()),
        latitude: Set(Some(52.5219)),
        longitude: Set(Some(13.4132)),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    println!("Seeded address {}", address.id);
    Ok(())
}

async fn seed_driver(orm: &OrmConn) -> anyhow::Result<()> {
    let now = Utc::now();
    DriverProfileActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(DRIVER_ID),
        vehicle_type: Set(VehicleType::Bike.as_str().into()),
        is_active: Set(true),
        hourly_rate_cents: Set(1200),
        per_km_rate_cents: Set(15),
        service_area_city: Set("Berlin".into()),
        service_radius_km: Set(15.0),
        home_latitude: Set(None),
        home_longitude: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;
    Ok(())
}

fn issue_token(secret: &str, user_id: Uuid, role: Role) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        is_staff: false,
        exp: (Utc::now() + Duration::days(30)).timestamp() as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}
