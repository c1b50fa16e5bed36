//! Entity rows to API models.
//!
//! Status columns are stored as text, so decoding can fail on a row written
//! by something other than this service; that surfaces as an internal error.

use chrono::Utc;

use crate::{
    entity::{
        cart_items::Model as CartItemModel, delivery_assignments::Model as AssignmentModel,
        driver_profiles::Model as DriverProfileModel, driver_shifts::Model as ShiftModel,
        order_commissions::Model as CommissionModel, order_items::Model as OrderItemModel,
        orders::Model as OrderModel, payment_transactions::Model as TransactionModel,
        refunds::Model as RefundModel, restaurants::Model as RestaurantModel,
    },
    error::AppResult,
    models::{
        AddressSnapshot, CartItem, DeliveryAssignment, DriverProfile, DriverShift, Order,
        OrderCommission, OrderItem, PaymentTransaction, Refund, Restaurant,
    },
    money::{bp_to_rate, from_cents},
};

pub fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        customer_id: model.customer_id,
        restaurant_id: model.restaurant_id,
        driver_id: model.driver_id,
        delivery_mode: model.delivery_mode.parse()?,
        address: AddressSnapshot {
            full_name: model.address_full_name,
            phone_number: model.address_phone_number,
            street: model.address_street,
            city: model.address_city,
            postal_code: model.address_postal_code,
            country: model.address_country,
            latitude: model.address_latitude,
            longitude: model.address_longitude,
        },
        delivery_note: model.delivery_note,
        food_subtotal: from_cents(model.food_subtotal_cents),
        service_fee: from_cents(model.service_fee_cents),
        delivery_fee: from_cents(model.delivery_fee_cents),
        tip_amount: from_cents(model.tip_cents),
        total_amount: from_cents(model.total_cents),
        currency: model.currency,
        payment_method: model.payment_method.parse()?,
        payment_status: model.payment_status.parse()?,
        payment_reference: model.payment_reference,
        status: model.status.parse()?,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn orders_from_entities(models: Vec<OrderModel>) -> AppResult<Vec<Order>> {
    models.into_iter().map(order_from_entity).collect()
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        menu_item_id: model.menu_item_id,
        item_name: model.item_name,
        item_description: model.item_description,
        item_ingredients: model.item_ingredients,
        item_price: from_cents(model.item_price_cents),
        item_image_url: model.item_image_url,
        quantity: model.quantity,
        line_total: from_cents(model.line_total_cents),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn cart_item_from_entity(model: CartItemModel) -> CartItem {
    let item_price = from_cents(model.item_price_cents);
    CartItem {
        id: model.id,
        menu_item_id: model.menu_item_id,
        item_name: model.item_name,
        line_total: from_cents(model.item_price_cents * i64::from(model.quantity)),
        item_price,
        item_image_url: model.item_image_url,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn restaurant_from_entity(model: RestaurantModel) -> AppResult<Restaurant> {
    Ok(Restaurant {
        id: model.id,
        owner_id: model.owner_id,
        name: model.name,
        city: model.city,
        latitude: model.latitude,
        longitude: model.longitude,
        status: model.status.parse()?,
        is_active: model.is_active,
    })
}

pub fn driver_profile_from_entity(model: DriverProfileModel) -> AppResult<DriverProfile> {
    Ok(DriverProfile {
        id: model.id,
        user_id: model.user_id,
        vehicle_type: model.vehicle_type.parse()?,
        is_active: model.is_active,
        hourly_rate: from_cents(model.hourly_rate_cents),
        per_km_rate: from_cents(model.per_km_rate_cents),
        service_area_city: model.service_area_city,
        service_radius_km: model.service_radius_km,
        home_latitude: model.home_latitude,
        home_longitude: model.home_longitude,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn shift_from_entity(model: ShiftModel) -> DriverShift {
    DriverShift {
        id: model.id,
        driver_id: model.driver_id,
        start_time: model.start_time.with_timezone(&Utc),
        end_time: model.end_time.map(|dt| dt.with_timezone(&Utc)),
        total_minutes: model.total_minutes,
        is_open: model.end_time.is_none(),
    }
}

pub fn assignment_from_entity(model: AssignmentModel) -> DeliveryAssignment {
    DeliveryAssignment {
        id: model.id,
        order_id: model.order_id,
        driver_id: model.driver_id,
        distance_km: model.distance_km,
        distance_unverified: model.distance_unverified,
        per_km_rate: from_cents(model.per_km_rate_cents),
        distance_pay: from_cents(model.distance_pay_cents),
        bonus_amount: from_cents(model.bonus_cents),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn transaction_from_entity(model: TransactionModel) -> AppResult<PaymentTransaction> {
    Ok(PaymentTransaction {
        id: model.id,
        order_id: model.order_id,
        amount: from_cents(model.amount_cents),
        currency: model.currency,
        method: model.method.parse()?,
        status: model.status.parse()?,
        provider_reference: model.provider_reference,
        raw_response: model.raw_response,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

pub fn commission_from_entity(model: CommissionModel) -> OrderCommission {
    OrderCommission {
        id: model.id,
        order_id: model.order_id,
        restaurant_id: model.restaurant_id,
        commission_rate: bp_to_rate(model.commission_rate_bp),
        food_subtotal: from_cents(model.food_subtotal_cents),
        commission_amount: from_cents(model.commission_cents),
        restaurant_net_amount: from_cents(model.restaurant_net_cents),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn refund_from_entity(model: RefundModel) -> AppResult<Refund> {
    Ok(Refund {
        id: model.id,
        order_id: model.order_id,
        payment_transaction_id: model.payment_transaction_id,
        amount: from_cents(model.amount_cents),
        currency: model.currency,
        status: model.status.parse()?,
        reason: model.reason,
        provider_reference: model.provider_reference,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
