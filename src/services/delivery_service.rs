use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Func, OnConflict},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    authz::{Action, Resource},
    dto::{
        delivery::{AcceptedDelivery, ShiftList, UpdateDriverProfileRequest},
        orders::OrderList,
    },
    entity::{
        DriverProfiles, DriverShifts, Orders, Restaurants,
        delivery_assignments::ActiveModel as AssignmentActive,
        driver_profiles::{
            ActiveModel as DriverProfileActive, Column as DriverProfileCol,
            Model as DriverProfileModel,
        },
        driver_shifts::{ActiveModel as ShiftActive, Column as ShiftCol, Model as ShiftModel},
        orders::Column as OrderCol,
        restaurants::Column as RestaurantCol,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{DeliveryMode, DriverProfile, DriverShift, Order, OrderStatus, VehicleType},
    money::{from_cents, to_cents},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{
        directory,
        mapping::{
            assignment_from_entity, driver_profile_from_entity, order_from_entity,
            orders_from_entities, shift_from_entity,
        },
        matching::{self, GeoPoint, PayoutContext, TripDistance},
        order_service,
    },
    state::AppState,
};

const DEFAULT_HOURLY_RATE_CENTS: i64 = 1200;
const DEFAULT_PER_KM_RATE_CENTS: i64 = 15;
const DEFAULT_SERVICE_RADIUS_KM: f64 = 15.0;

pub async fn get_profile(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DriverProfile>> {
    authorize(state, user, Action::ManageDriverProfile)?;
    let profile = ensure_profile(&state.orm, user.user_id).await?;
    Ok(ApiResponse::ok("OK", driver_profile_from_entity(profile)?))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateDriverProfileRequest,
) -> AppResult<ApiResponse<DriverProfile>> {
    authorize(state, user, Action::ManageDriverProfile)?;
    validate_profile_update(&payload)?;
    let profile = ensure_profile(&state.orm, user.user_id).await?;

    let mut active: DriverProfileActive = profile.into();
    if let Some(vehicle_type) = payload.vehicle_type {
        active.vehicle_type = Set(vehicle_type.as_str().to_string());
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(rate) = payload.hourly_rate {
        active.hourly_rate_cents = Set(to_cents(rate)?);
    }
    if let Some(rate) = payload.per_km_rate {
        active.per_km_rate_cents = Set(to_cents(rate)?);
    }
    if let Some(city) = payload.service_area_city {
        active.service_area_city = Set(city.trim().to_string());
    }
    if let Some(radius) = payload.service_radius_km {
        active.service_radius_km = Set(radius);
    }
    if let Some(lat) = payload.home_latitude {
        active.home_latitude = Set(Some(lat));
    }
    if let Some(lon) = payload.home_longitude {
        active.home_longitude = Set(Some(lon));
    }
    active.updated_at = Set(Utc::now().into());
    let profile = active.update(&state.orm).await?;

    tracing::info!(driver_id = %profile.id, "driver profile updated");
    audit::record(
        &state.orm,
        user.user_id,
        "driver_profile_update",
        "driver_profiles",
        json!({ "driver_id": profile.id }),
    )
    .await;

    Ok(ApiResponse::ok("Profile updated", driver_profile_from_entity(profile)?))
}

pub async fn start_shift(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<DriverShift>> {
    authorize(state, user, Action::ManageDriverProfile)?;
    let profile = ensure_profile(&state.orm, user.user_id).await?;

    if open_shift(&state.orm, profile.id).await?.is_some() {
        return Err(AppError::Validation("You already have an open shift".into()));
    }

    let now = Utc::now();
    let shift = ShiftActive {
        id: Set(Uuid::new_v4()),
        driver_id: Set(profile.id),
        start_time: Set(now.into()),
        end_time: Set(None),
        total_minutes: Set(None),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(driver_id = %profile.id, shift_id = %shift.id, "shift started");
    Ok(ApiResponse::ok("Shift started", shift_from_entity(shift)))
}

pub async fn end_shift(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<DriverShift>> {
    authorize(state, user, Action::ManageDriverProfile)?;
    let profile = ensure_profile(&state.orm, user.user_id).await?;

    let shift = open_shift(&state.orm, profile.id)
        .await?
        .ok_or_else(|| AppError::Validation("You do not have an open shift".into()))?;

    let end = Utc::now();
    let minutes = shift_minutes(shift.start_time.with_timezone(&Utc), end);
    let mut active: ShiftActive = shift.into();
    active.end_time = Set(Some(end.into()));
    active.total_minutes = Set(Some(minutes));
    let shift = active.update(&state.orm).await?;

    tracing::info!(driver_id = %profile.id, shift_id = %shift.id, minutes, "shift ended");
    Ok(ApiResponse::ok("Shift ended", shift_from_entity(shift)))
}

pub async fn list_shifts(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ShiftList>> {
    authorize(state, user, Action::ManageDriverProfile)?;
    let profile = ensure_profile(&state.orm, user.user_id).await?;
    let (page, limit, offset) = pagination.normalize();

    let finder = DriverShifts::find()
        .filter(ShiftCol::DriverId.eq(profile.id))
        .order_by_desc(ShiftCol::StartTime);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(shift_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        ShiftList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Delivery orders waiting for a driver, restricted to the driver's city
/// when one is configured.
pub async fn list_eligible_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(state, user, Action::AcceptDelivery)?;
    let profile = ensure_profile(&state.orm, user.user_id).await?;

    let mut finder = Orders::find()
        .filter(OrderCol::DeliveryMode.eq(DeliveryMode::Delivery.as_str()))
        .filter(OrderCol::Status.eq(OrderStatus::ReadyForPickup.as_str()))
        .filter(OrderCol::DriverId.is_null());

    let city = profile.service_area_city.trim();
    if !city.is_empty() {
        finder = finder
            .inner_join(Restaurants)
            .filter(
                Expr::expr(Func::lower(Expr::col((Restaurants, RestaurantCol::City))))
                    .eq(city.to_lowercase()),
            );
    }

    let orders = finder
        .order_by_asc(OrderCol::UpdatedAt)
        .all(&state.orm)
        .await?;
    let total = orders.len() as i64;

    Ok(ApiResponse::success(
        "OK",
        OrderList {
            items: orders_from_entities(orders)?,
        },
        Some(Meta::all(total)),
    ))
}

/// Claims an eligible order for the calling driver.
///
/// Everything is re-validated against the stored order, and the binding is a
/// conditional update on "no driver and ready for pickup": when drivers race
/// for one order exactly one update matches and the rest get `AlreadyAssigned`.
pub async fn accept_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<AcceptedDelivery>> {
    authorize(state, user, Action::AcceptDelivery)?;
    let profile = ensure_profile(&state.orm, user.user_id).await?;
    if !profile.is_active {
        return Err(AppError::Forbidden);
    }
    let vehicle: VehicleType = profile.vehicle_type.parse()?;

    let txn = state.orm.begin().await?;

    let order = order_service::lock_order(&txn, order_id).await?;

    if order.delivery_mode != DeliveryMode::Delivery.as_str() {
        return Err(AppError::Validation(
            "Only delivery orders can be assigned to drivers".into(),
        ));
    }
    if order.driver_id.is_some() {
        return Err(AppError::AlreadyAssigned);
    }
    if order.status != OrderStatus::ReadyForPickup.as_str() {
        return Err(AppError::NotReady);
    }

    let restaurant = directory::find_restaurant(&txn, order.restaurant_id).await?;
    if !matching::serves_city(&profile.service_area_city, &restaurant.city) {
        return Err(AppError::OutOfServiceArea);
    }

    let distance = TripDistance::between(
        GeoPoint::from_parts(restaurant.latitude, restaurant.longitude),
        GeoPoint::from_parts(order.address_latitude, order.address_longitude),
    );
    if distance.is_unverified() {
        tracing::warn!(
            order_id = %order.id,
            restaurant_id = %restaurant.id,
            "missing coordinates, vehicle range not checked"
        );
    }
    matching::check_range(&state.config, vehicle, distance)?;

    let now = Utc::now();
    let payout = matching::payout(
        distance.km(),
        from_cents(profile.per_km_rate_cents),
        state.bonus.as_ref(),
        &PayoutContext {
            distance_km: distance.km(),
            vehicle,
            accepted_at: now,
        },
    )?;

    let bound = Orders::update_many()
        .col_expr(OrderCol::DriverId, Expr::value(Some(profile.id)))
        .col_expr(
            OrderCol::Status,
            Expr::value(OrderStatus::DriverAssigned.as_str()),
        )
        .col_expr(OrderCol::UpdatedAt, Expr::value(now.fixed_offset()))
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::DriverId.is_null())
        .filter(OrderCol::Status.eq(OrderStatus::ReadyForPickup.as_str()))
        .filter(OrderCol::DeliveryMode.eq(DeliveryMode::Delivery.as_str()))
        .exec(&txn)
        .await?;

    if bound.rows_affected == 0 {
        let latest = order_service::load_order(&txn, order.id).await?;
        tracing::debug!(order_id = %order.id, driver_id = %profile.id, "lost accept race");
        return Err(if latest.driver_id.is_some() {
            AppError::AlreadyAssigned
        } else {
            AppError::NotReady
        });
    }

    let assignment = AssignmentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        driver_id: Set(profile.id),
        distance_km: Set(distance.km()),
        distance_unverified: Set(distance.is_unverified()),
        per_km_rate_cents: Set(to_cents(payout.per_km_rate)?),
        distance_pay_cents: Set(to_cents(payout.distance_pay)?),
        bonus_cents: Set(to_cents(payout.bonus)?),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let order = order_service::load_order(&txn, order.id).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        driver_id = %profile.id,
        distance_km = assignment.distance_km,
        distance_pay = %payout.distance_pay,
        "order accepted by driver"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "driver_accept",
        "delivery_assignments",
        json!({ "order_id": order.id, "driver_id": profile.id, "assignment_id": assignment.id }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Order accepted",
        AcceptedDelivery {
            order: order_from_entity(order)?,
            assignment: assignment_from_entity(assignment),
        },
    ))
}

/// Driver-side progress on an order bound to the caller: `on_the_way`, then
/// `delivered`.
pub async fn update_delivery_status(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    requested: OrderStatus,
) -> AppResult<ApiResponse<Order>> {
    authorize(state, user, Action::ManageDriverProfile)?;
    if !matches!(requested, OrderStatus::OnTheWay | OrderStatus::Delivered) {
        return Err(AppError::Validation(
            "Drivers can only set status to on_the_way or delivered".into(),
        ));
    }

    let profile = ensure_profile(&state.orm, user.user_id).await?;
    let order = order_service::load_order(&state.orm, order_id).await?;
    if order.driver_id != Some(profile.id) {
        return Err(AppError::NotFound);
    }

    order_service::advance_status(state, user, order_id, requested).await
}

fn authorize(state: &AppState, user: &AuthUser, action: Action) -> AppResult<()> {
    state.policy.authorize(user, &Resource::platform(), action)
}

/// Driver profile for a user, created with launch defaults on first use.
pub(crate) async fn ensure_profile<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<DriverProfileModel> {
    let now = Utc::now();
    let fresh = DriverProfileActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        vehicle_type: Set(VehicleType::Bike.as_str().to_string()),
        is_active: Set(true),
        hourly_rate_cents: Set(DEFAULT_HOURLY_RATE_CENTS),
        per_km_rate_cents: Set(DEFAULT_PER_KM_RATE_CENTS),
        service_area_city: Set(String::new()),
        service_radius_km: Set(DEFAULT_SERVICE_RADIUS_KM),
        home_latitude: Set(None),
        home_longitude: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    DriverProfiles::insert(fresh)
        .on_conflict(
            OnConflict::column(DriverProfileCol::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    DriverProfiles::find()
        .filter(DriverProfileCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn open_shift<C: ConnectionTrait>(conn: &C, driver_id: Uuid) -> AppResult<Option<ShiftModel>> {
    Ok(DriverShifts::find()
        .filter(ShiftCol::DriverId.eq(driver_id))
        .filter(ShiftCol::EndTime.is_null())
        .order_by_desc(ShiftCol::StartTime)
        .one(conn)
        .await?)
}

fn shift_minutes(start: chrono::DateTime<Utc>, end: chrono::DateTime<Utc>) -> i32 {
    let minutes = (end - start).num_minutes().max(0);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

fn validate_profile_update(payload: &UpdateDriverProfileRequest) -> AppResult<()> {
    for (field, rate) in [
        ("hourly_rate", payload.hourly_rate),
        ("per_km_rate", payload.per_km_rate),
    ] {
        if rate.is_some_and(|r| r < Decimal::ZERO) {
            return Err(AppError::Validation(format!("{field} cannot be negative")));
        }
    }
    if payload.service_radius_km.is_some_and(|r| !(r > 0.0)) {
        return Err(AppError::Validation(
            "service_radius_km must be positive".into(),
        ));
    }
    if payload
        .home_latitude
        .is_some_and(|lat| !(-90.0..=90.0).contains(&lat))
    {
        return Err(AppError::Validation("home_latitude is out of range".into()));
    }
    if payload
        .home_longitude
        .is_some_and(|lon| !(-180.0..=180.0).contains(&lon))
    {
        return Err(AppError::Validation("home_longitude is out of range".into()));
    }
    Ok(())
}
