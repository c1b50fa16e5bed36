use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    authz::{Action, Resource},
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        CartItems, DriverProfiles, MenuItems, OrderItems, Orders,
        cart_items::Column as CartItemCol,
        menu_items::{Column as MenuItemCol, Model as MenuItemModel},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol},
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as OrderEntity,
            Model as OrderModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{AddressSnapshot, DeliveryMode, Order, OrderStatus, PaymentStatus},
    money::{round_money, to_cents},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        cart_service, delivery_service, directory,
        lifecycle::{self, Performer},
        mapping::{order_from_entity, order_item_from_entity, orders_from_entities},
        pricing::{self, PricedLine},
    },
    state::AppState,
};

/// Turns the caller's cart for a restaurant into a pending order.
///
/// Prices are taken from the cart's snapshot, never re-read from the catalog.
/// The order, its items and the emptied cart commit together.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    state
        .policy
        .authorize(user, &Resource::customer(user.user_id), Action::ManageCart)?;
    if payload.tip_amount < Decimal::ZERO {
        return Err(AppError::Validation("tip_amount cannot be negative".into()));
    }

    let restaurant = directory::find_restaurant(&state.orm, payload.restaurant_id).await?;

    let txn = state.orm.begin().await?;

    // Concurrent checkouts of one cart queue here; the ones that get the lock
    // after the winner committed find no lines left.
    let cart = cart_service::lock_cart(&txn, user.user_id, restaurant.id)
        .await?
        .ok_or_else(|| AppError::Validation("Cart is empty".into()))?;
    let lines = cart_service::cart_lines(&txn, cart.id).await?;
    if lines.is_empty() {
        return Err(AppError::Validation("Cart is empty".into()));
    }

    let delivery_mode = match payload.delivery_mode {
        Some(mode) => mode,
        None => cart.delivery_mode.parse()?,
    };

    let address = match delivery_mode {
        DeliveryMode::Delivery => {
            let address_id = payload.address_id.ok_or_else(|| {
                AppError::Validation("address_id is required for delivery orders".into())
            })?;
            let address = directory::customer_address(&txn, user.user_id, address_id).await?;
            directory::snapshot_address(address)
        }
        DeliveryMode::Pickup => AddressSnapshot::default(),
    };

    let priced: Vec<PricedLine> = lines.iter().map(cart_service::priced_line).collect();
    let breakdown = pricing::price(
        restaurant.id,
        &restaurant.city,
        delivery_mode,
        &priced,
        state.fees.as_ref(),
    );
    let tip = round_money(payload.tip_amount);
    let total = breakdown
        .total
        .checked_add(tip)
        .ok_or_else(|| AppError::Validation("tip_amount is out of range".into()))?;

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(user.user_id),
        restaurant_id: Set(restaurant.id),
        driver_id: Set(None),
        delivery_mode: Set(delivery_mode.as_str().to_string()),
        address_full_name: Set(address.full_name),
        address_phone_number: Set(address.phone_number),
        address_street: Set(address.street),
        address_city: Set(address.city),
        address_postal_code: Set(address.postal_code),
        address_country: Set(address.country),
        address_latitude: Set(address.latitude),
        address_longitude: Set(address.longitude),
        delivery_note: Set(payload.delivery_note),
        food_subtotal_cents: Set(to_cents(breakdown.subtotal)?),
        service_fee_cents: Set(to_cents(breakdown.service_fee)?),
        delivery_fee_cents: Set(to_cents(breakdown.delivery_fee)?),
        tip_cents: Set(to_cents(tip)?),
        total_cents: Set(to_cents(total)?),
        currency: Set(state.config.currency.clone()),
        payment_method: Set(payload.payment_method.as_str().to_string()),
        payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
        payment_reference: Set(String::new()),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    // Description and ingredients are only kept on the catalog entry.
    let catalog: HashMap<Uuid, MenuItemModel> = MenuItems::find()
        .filter(MenuItemCol::Id.is_in(lines.iter().map(|line| line.menu_item_id)))
        .all(&txn)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let mut items = Vec::with_capacity(lines.len());
    for (line, priced_line) in lines.iter().zip(&priced) {
        let menu_item = catalog.get(&line.menu_item_id);
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            menu_item_id: Set(Some(line.menu_item_id)),
            item_name: Set(line.item_name.clone()),
            item_description: Set(menu_item.map(|m| m.description.clone()).unwrap_or_default()),
            item_ingredients: Set(menu_item.map(|m| m.ingredients.clone()).unwrap_or_default()),
            item_price_cents: Set(line.item_price_cents),
            item_image_url: Set(line.item_image_url.clone()),
            quantity: Set(line.quantity),
            line_total_cents: Set(to_cents(priced_line.line_total())?),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    // The cart row stays; only its lines go.
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        customer_id = %user.user_id,
        restaurant_id = %restaurant.id,
        total = %total,
        "order placed"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "checkout",
        "orders",
        json!({ "order_id": order.id, "total": total.to_string() }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Checkout success",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
    ))
}

/// The caller's own orders.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::CustomerId.eq(user.user_id));
    paginate_orders(state, condition, &query).await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = load_order(&state.orm, id).await?;
    let resource = order_resource(&state.orm, &order).await?;
    state.policy.authorize(user, &resource, Action::ViewOrder)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::ok(
        "OK",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
    ))
}

pub async fn list_restaurant_orders(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let restaurant = directory::find_restaurant(&state.orm, restaurant_id).await?;
    state.policy.authorize(
        user,
        &Resource::restaurant(restaurant.owner_id),
        Action::ViewRestaurantOrders,
    )?;

    let condition = Condition::all().add(OrderCol::RestaurantId.eq(restaurant.id));
    paginate_orders(state, condition, &query).await
}

/// Moves an order along the lifecycle table on behalf of the caller.
///
/// The edge must exist for the order's delivery mode, and the caller must
/// qualify as one of the edge's performers. The write is conditional on the
/// status read here, so a concurrent transition makes this one fail with
/// `InvalidTransition` instead of overwriting it.
pub async fn advance_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    requested: OrderStatus,
) -> AppResult<ApiResponse<Order>> {
    let order = load_order(&state.orm, id).await?;
    let current: OrderStatus = order.status.parse()?;
    let mode: DeliveryMode = order.delivery_mode.parse()?;

    // Outsiders learn nothing about the order's state. Drivers are not yet
    // parties to an order they are claiming.
    let resource = order_resource(&state.orm, &order).await?;
    let claiming = requested == OrderStatus::DriverAssigned
        && state.policy.allows(user, &resource, Action::AcceptDelivery);
    if !claiming {
        state.policy.authorize(user, &resource, Action::ViewOrder)?;
    }

    let performers = lifecycle::edge(current, requested, mode)?;
    let performer = performers
        .iter()
        .copied()
        .filter(|p| *p != Performer::Payments)
        .find(|p| state.policy.allows(user, &resource, p.action(requested)))
        .ok_or(AppError::Forbidden)?;

    if performer == Performer::Driver && requested == OrderStatus::DriverAssigned {
        let accepted = delivery_service::accept_order(state, user, id).await?;
        let order = accepted
            .data
            .map(|d| d.order)
            .ok_or_else(|| anyhow::anyhow!("accept returned no order"))?;
        return Ok(ApiResponse::ok("Status updated", order));
    }

    let cancelling = requested == OrderStatus::Cancelled;
    if cancelling && order.payment_status == PaymentStatus::Paid.as_str() {
        return Err(AppError::RefundRequired);
    }

    let now = Utc::now();
    let mut update = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(requested.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now.fixed_offset()))
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::Status.eq(current.as_str()));
    if cancelling {
        // A payment landing in between must not be cancelled away unrefunded.
        update = update.filter(OrderCol::PaymentStatus.ne(PaymentStatus::Paid.as_str()));
    }
    let result = update.exec(&state.orm).await?;

    if result.rows_affected == 0 {
        let latest = load_order(&state.orm, id).await?;
        if latest.status == current.as_str() && cancelling {
            return Err(AppError::RefundRequired);
        }
        return Err(AppError::InvalidTransition {
            current: latest.status.parse()?,
            requested,
        });
    }

    tracing::info!(
        order_id = %id,
        from = %current,
        to = %requested,
        performer = ?performer,
        "order status changed"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "order_status_update",
        "orders",
        json!({ "order_id": id, "from": current, "to": requested }),
    )
    .await;

    let order = load_order(&state.orm, id).await?;
    Ok(ApiResponse::ok("Status updated", order_from_entity(order)?))
}

/// Customer self-service cancellation.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = load_order(&state.orm, id).await?;
    state
        .policy
        .authorize(user, &Resource::customer(order.customer_id), Action::CustomerCancel)?;
    advance_status(state, user, id, OrderStatus::Cancelled).await
}

/// Reads the order under a row lock held until `txn` ends.
///
/// The no-op update goes first: SQLite ignores `FOR UPDATE` and only hands
/// out its write lock to a transaction that writes before it reads.
pub(crate) async fn lock_order(txn: &DatabaseTransaction, id: Uuid) -> AppResult<OrderModel> {
    let touched = Orders::update_many()
        .col_expr(OrderCol::UpdatedAt, Expr::col(OrderCol::UpdatedAt).into())
        .filter(OrderCol::Id.eq(id))
        .exec(txn)
        .await?;
    if touched.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)
}

pub(crate) async fn load_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Ownership facts for an order: its customer, the restaurant's owner and
/// the user behind the bound driver profile.
pub(crate) async fn order_resource<C: ConnectionTrait>(
    conn: &C,
    order: &OrderModel,
) -> AppResult<Resource> {
    let restaurant = directory::find_restaurant(conn, order.restaurant_id).await?;
    let driver_user_id = match order.driver_id {
        Some(driver_id) => DriverProfiles::find_by_id(driver_id)
            .one(conn)
            .await?
            .map(|profile| profile.user_id),
        None => None,
    };
    Ok(Resource::order(order, restaurant.owner_id, driver_user_id))
}

pub(crate) async fn paginate_orders(
    state: &AppState,
    mut condition: Condition,
    query: &OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let finder: Select<OrderEntity> = Orders::find().filter(condition);
    let finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList {
            items: orders_from_entities(orders)?,
        },
        Some(meta),
    ))
}
