use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    sea_query::{Expr, LockType, OnConflict},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    authz::{Action, Resource},
    dto::cart::{AddCartItemRequest, SetDeliveryModeRequest},
    entity::{
        CartItems, Carts,
        cart_items::{
            ActiveModel as CartItemActive, Column as CartItemCol, Model as CartItemModel,
        },
        carts::{ActiveModel as CartActive, Column as CartCol, Model as CartModel},
        restaurants::Model as RestaurantModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, DeliveryMode},
    money::from_cents,
    response::ApiResponse,
    services::{
        directory,
        mapping::cart_item_from_entity,
        pricing::{self, FeePolicy, PricedLine},
    },
    state::AppState,
};

/// Returns the caller's cart for a restaurant, creating an empty one first.
pub async fn get_cart(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    authorize(state, user)?;
    let restaurant = directory::find_restaurant(&state.orm, restaurant_id).await?;
    let cart = ensure_cart(&state.orm, user.user_id, restaurant_id).await?;
    let cart = cart_view(&state.orm, state.fees.as_ref(), &restaurant, cart).await?;
    Ok(ApiResponse::ok("OK", cart))
}

pub async fn set_delivery_mode(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: SetDeliveryModeRequest,
) -> AppResult<ApiResponse<Cart>> {
    authorize(state, user)?;
    let restaurant = directory::find_restaurant(&state.orm, restaurant_id).await?;
    let cart = ensure_cart(&state.orm, user.user_id, restaurant_id).await?;

    let mut active: CartActive = cart.into();
    active.delivery_mode = Set(payload.delivery_mode.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let cart = active.update(&state.orm).await?;

    let cart = cart_view(&state.orm, state.fees.as_ref(), &restaurant, cart).await?;
    Ok(ApiResponse::ok("Delivery mode updated", cart))
}

/// Adds a menu item or sets the quantity of an existing line. Either way the
/// line's name, price and image are re-copied from the catalog.
pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: AddCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    authorize(state, user)?;
    if payload.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }

    let restaurant = directory::find_restaurant(&state.orm, restaurant_id).await?;
    let menu_item = directory::find_menu_item(&state.orm, payload.menu_item_id).await?;
    if !menu_item.is_active {
        return Err(AppError::NotFound);
    }
    if menu_item.restaurant_id != restaurant_id {
        return Err(AppError::Validation(
            "menu item does not belong to this restaurant".to_string(),
        ));
    }

    let cart = ensure_cart(&state.orm, user.user_id, restaurant_id).await?;
    let now = Utc::now();

    let line = CartItemActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart.id),
        menu_item_id: Set(menu_item.id),
        quantity: Set(payload.quantity),
        item_name: Set(menu_item.name.clone()),
        item_price_cents: Set(menu_item.price_cents),
        item_image_url: Set(menu_item.image_url.clone()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    // An existing line keeps its id and position and takes the new quantity.
    CartItems::insert(line)
        .on_conflict(
            OnConflict::columns([CartItemCol::CartId, CartItemCol::MenuItemId])
                .update_columns([
                    CartItemCol::Quantity,
                    CartItemCol::ItemName,
                    CartItemCol::ItemPriceCents,
                    CartItemCol::ItemImageUrl,
                    CartItemCol::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;

    touch(&state.orm, &cart).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "cart_update",
        "cart_items",
        json!({ "cart_id": cart.id, "menu_item_id": menu_item.id, "quantity": payload.quantity }),
    )
    .await;

    let cart = cart_view(&state.orm, state.fees.as_ref(), &restaurant, cart).await?;
    Ok(ApiResponse::ok("OK", cart))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    item_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    authorize(state, user)?;
    let restaurant = directory::find_restaurant(&state.orm, restaurant_id).await?;
    let cart = ensure_cart(&state.orm, user.user_id, restaurant_id).await?;

    let result = CartItems::delete_many()
        .filter(CartItemCol::Id.eq(item_id))
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    touch(&state.orm, &cart).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "cart_remove",
        "cart_items",
        json!({ "cart_id": cart.id, "item_id": item_id }),
    )
    .await;

    let cart = cart_view(&state.orm, state.fees.as_ref(), &restaurant, cart).await?;
    Ok(ApiResponse::ok("Removed from cart", cart))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    authorize(state, user)?;
    let restaurant = directory::find_restaurant(&state.orm, restaurant_id).await?;
    let cart = ensure_cart(&state.orm, user.user_id, restaurant_id).await?;

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&state.orm)
        .await?;
    touch(&state.orm, &cart).await?;

    let cart = cart_view(&state.orm, state.fees.as_ref(), &restaurant, cart).await?;
    Ok(ApiResponse::ok("Cart cleared", cart))
}

fn authorize(state: &AppState, user: &AuthUser) -> AppResult<()> {
    state
        .policy
        .authorize(user, &Resource::customer(user.user_id), Action::ManageCart)
}

/// One cart per (customer, restaurant); concurrent first access converges on
/// the same row through the unique index.
pub(crate) async fn ensure_cart<C: ConnectionTrait>(
    conn: &C,
    customer_id: Uuid,
    restaurant_id: Uuid,
) -> AppResult<CartModel> {
    let now = Utc::now();
    let fresh = CartActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer_id),
        restaurant_id: Set(restaurant_id),
        delivery_mode: Set(DeliveryMode::Delivery.as_str().to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Carts::insert(fresh)
        .on_conflict(
            OnConflict::columns([CartCol::CustomerId, CartCol::RestaurantId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    find_cart(conn, customer_id, restaurant_id)
        .await?
        .ok_or(AppError::NotFound)
}

async fn find_cart<C: ConnectionTrait>(
    conn: &C,
    customer_id: Uuid,
    restaurant_id: Uuid,
) -> AppResult<Option<CartModel>> {
    Ok(Carts::find()
        .filter(CartCol::CustomerId.eq(customer_id))
        .filter(CartCol::RestaurantId.eq(restaurant_id))
        .one(conn)
        .await?)
}

/// Locks the cart row for the rest of `txn`. `None` when the customer never
/// opened a cart at this restaurant.
///
/// Writes before reading so SQLite, which ignores `FOR UPDATE`, takes its
/// write lock up front.
pub(crate) async fn lock_cart(
    txn: &DatabaseTransaction,
    customer_id: Uuid,
    restaurant_id: Uuid,
) -> AppResult<Option<CartModel>> {
    let touched = Carts::update_many()
        .col_expr(CartCol::UpdatedAt, Expr::col(CartCol::UpdatedAt).into())
        .filter(CartCol::CustomerId.eq(customer_id))
        .filter(CartCol::RestaurantId.eq(restaurant_id))
        .exec(txn)
        .await?;
    if touched.rows_affected == 0 {
        return Ok(None);
    }

    Ok(Carts::find()
        .filter(CartCol::CustomerId.eq(customer_id))
        .filter(CartCol::RestaurantId.eq(restaurant_id))
        .lock(LockType::Update)
        .one(txn)
        .await?)
}

pub(crate) async fn cart_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
) -> AppResult<Vec<CartItemModel>> {
    Ok(CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::CreatedAt)
        .all(conn)
        .await?)
}

pub(crate) fn priced_line(line: &CartItemModel) -> PricedLine {
    PricedLine {
        unit_price: from_cents(line.item_price_cents),
        quantity: line.quantity,
    }
}

async fn touch<C: ConnectionTrait>(conn: &C, cart: &CartModel) -> AppResult<()> {
    let mut active: CartActive = cart.clone().into();
    active.updated_at = Set(Utc::now().into());
    active.update(conn).await?;
    Ok(())
}

async fn cart_view<C: ConnectionTrait>(
    conn: &C,
    fees: &dyn FeePolicy,
    restaurant: &RestaurantModel,
    cart: CartModel,
) -> AppResult<Cart> {
    let lines = cart_lines(conn, cart.id).await?;
    let priced: Vec<PricedLine> = lines.iter().map(priced_line).collect();
    let delivery_mode: DeliveryMode = cart.delivery_mode.parse()?;
    let breakdown = pricing::price(restaurant.id, &restaurant.city, delivery_mode, &priced, fees);

    Ok(Cart {
        id: cart.id,
        customer_id: cart.customer_id,
        restaurant_id: cart.restaurant_id,
        delivery_mode,
        items: lines.into_iter().map(cart_item_from_entity).collect(),
        subtotal: breakdown.subtotal,
        service_fee: breakdown.service_fee,
        delivery_fee: breakdown.delivery_fee,
        total: breakdown.total,
        created_at: cart.created_at.with_timezone(&Utc),
        updated_at: cart.updated_at.with_timezone(&Utc),
    })
}
