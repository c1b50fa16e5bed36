use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddCartItemRequest, SetDeliveryModeRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Cart,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{restaurant_id}", get(get_cart).delete(clear_cart))
        .route("/{restaurant_id}/mode", patch(set_delivery_mode))
        .route("/{restaurant_id}/items", post(add_item))
        .route("/{restaurant_id}/items/{item_id}", delete(remove_item))
}

#[utoipa::path(
    get,
    path = "/api/cart/{restaurant_id}",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Cart for this restaurant with its fee breakdown", body = ApiResponse<Cart>),
        (status = 404, description = "Restaurant not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::get_cart(&state, &user, restaurant_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/{restaurant_id}/mode",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant ID")),
    request_body = SetDeliveryModeRequest,
    responses(
        (status = 200, description = "Delivery mode updated", body = ApiResponse<Cart>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn set_delivery_mode(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
    Json(payload): Json<SetDeliveryModeRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::set_delivery_mode(&state, &user, restaurant_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/{restaurant_id}/items",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant ID")),
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Item added or quantity set", body = ApiResponse<Cart>),
        (status = 400, description = "Invalid quantity or item from another restaurant"),
        (status = 404, description = "Menu item not found or inactive"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
    Json(payload): Json<AddCartItemRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::add_item(&state, &user, restaurant_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{restaurant_id}/items/{item_id}",
    params(
        ("restaurant_id" = Uuid, Path, description = "Restaurant ID"),
        ("item_id" = Uuid, Path, description = "Cart line ID")
    ),
    responses(
        (status = 200, description = "Removed from cart", body = ApiResponse<Cart>),
        (status = 404, description = "Cart line not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((restaurant_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::remove_item(&state, &user, restaurant_id, item_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{restaurant_id}",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Cart cleared", body = ApiResponse<Cart>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::clear_cart(&state, &user, restaurant_id).await?;
    Ok(Json(resp))
}
