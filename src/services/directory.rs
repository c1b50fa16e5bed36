//! Read-only lookups against the collaborator tables: restaurant directory,
//! catalog and address book.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::{
        Addresses, MenuItems, Restaurants,
        addresses::{Column as AddressCol, Model as AddressModel},
        menu_items::Model as MenuItemModel,
        restaurants::Model as RestaurantModel,
    },
    error::{AppError, AppResult},
    models::AddressSnapshot,
};

pub async fn find_restaurant<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: Uuid,
) -> AppResult<RestaurantModel> {
    Restaurants::find_by_id(restaurant_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn find_menu_item<C: ConnectionTrait>(
    conn: &C,
    menu_item_id: Uuid,
) -> AppResult<MenuItemModel> {
    MenuItems::find_by_id(menu_item_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Address owned by the customer; someone else's address reads as missing.
pub async fn customer_address<C: ConnectionTrait>(
    conn: &C,
    customer_id: Uuid,
    address_id: Uuid,
) -> AppResult<AddressModel> {
    Addresses::find_by_id(address_id)
        .filter(AddressCol::CustomerId.eq(customer_id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub fn snapshot_address(address: AddressModel) -> AddressSnapshot {
    AddressSnapshot {
        full_name: address.full_name,
        phone_number: address.phone_number,
        street: address.street,
        city: address.city,
        postal_code: address.postal_code,
        country: address.country,
        latitude: address.latitude,
        longitude: address.longitude,
    }
}
