mod support;

use food_delivery_api::{
    dto::{
        cart::{AddCartItemRequest, SetDeliveryModeRequest},
        orders::CheckoutRequest,
        payments::PayOrderRequest,
    },
    entity::{Orders, orders::Model as OrderModel},
    error::AppError,
    models::{DeliveryMode, OrderStatus, PaymentMethod},
    services::{cart_service, delivery_service, order_service, payment_service},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use uuid::Uuid;

use support::{
    admin, customer, driver, make_ready, place_delivery_order, seed_restaurant,
    setup_shared_state, setup_state,
};

#[tokio::test]
async fn restaurant_walks_the_kitchen_steps_in_order() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let order = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;

    let skipped =
        order_service::advance_status(&state, &fixture.owner, order.id, OrderStatus::Preparing)
            .await;
    assert!(matches!(
        skipped,
        Err(AppError::InvalidTransition {
            current: OrderStatus::Pending,
            requested: OrderStatus::Preparing,
        })
    ));

    make_ready(&state, &fixture, order.id).await?;
    let stored = order_service::get_order(&state, &customer, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(stored.order.status, OrderStatus::ReadyForPickup);

    // Delivery orders leave the kitchen with a driver, not a hand-over.
    let handover =
        order_service::advance_status(&state, &fixture.owner, order.id, OrderStatus::Delivered)
            .await;
    assert!(matches!(handover, Err(AppError::InvalidTransition { .. })));
    Ok(())
}

#[tokio::test]
async fn only_performers_of_an_edge_may_take_it() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let order = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;

    let by_customer =
        order_service::advance_status(&state, &customer, order.id, OrderStatus::Accepted).await;
    assert!(matches!(by_customer, Err(AppError::Forbidden)));

    let stranger = support::customer();
    let cancel_by_stranger = order_service::cancel_order(&state, &stranger, order.id).await;
    assert!(matches!(cancel_by_stranger, Err(AppError::Forbidden)));

    // Admins act for the restaurant.
    let accepted =
        order_service::advance_status(&state, &admin(), order.id, OrderStatus::Accepted).await?;
    assert_eq!(accepted.data.expect("order").status, OrderStatus::Accepted);

    // Outsiders are turned away before the order's state is consulted.
    let skip_by_stranger =
        order_service::advance_status(&state, &stranger, order.id, OrderStatus::Delivered).await;
    assert!(matches!(skip_by_stranger, Err(AppError::Forbidden)));

    // Refunds only happen through the payment workflow.
    let refunded =
        order_service::advance_status(&state, &admin(), order.id, OrderStatus::Refunded).await;
    assert!(matches!(refunded, Err(AppError::Forbidden)));
    Ok(())
}

#[tokio::test]
async fn customer_cancels_before_pickup_only() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();

    let early = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;
    let cancelled = order_service::cancel_order(&state, &customer, early.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let again = order_service::cancel_order(&state, &customer, early.id).await;
    assert!(matches!(
        again,
        Err(AppError::InvalidTransition {
            current: OrderStatus::Cancelled,
            ..
        })
    ));

    let late = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;
    make_ready(&state, &fixture, late.id).await?;
    let too_late = order_service::cancel_order(&state, &customer, late.id).await;
    assert!(matches!(too_late, Err(AppError::InvalidTransition { .. })));
    Ok(())
}

#[tokio::test]
async fn paid_orders_need_a_refund_instead_of_a_cancel() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let order = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;

    payment_service::pay(&state, &customer, order.id, PayOrderRequest::default()).await?;

    let cancel = order_service::cancel_order(&state, &customer, order.id).await;
    assert!(matches!(cancel, Err(AppError::RefundRequired)));

    let by_restaurant =
        order_service::advance_status(&state, &fixture.owner, order.id, OrderStatus::Cancelled)
            .await;
    assert!(matches!(by_restaurant, Err(AppError::RefundRequired)));

    let stored = order_service::get_order(&state, &customer, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(stored.order.status, OrderStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn pickup_orders_are_handed_over_by_the_restaurant() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();

    cart_service::set_delivery_mode(
        &state,
        &customer,
        fixture.restaurant_id,
        SetDeliveryModeRequest {
            delivery_mode: DeliveryMode::Pickup,
        },
    )
    .await?;
    cart_service::add_item(
        &state,
        &customer,
        fixture.restaurant_id,
        AddCartItemRequest {
            menu_item_id: fixture.menu_item_id,
            quantity: 1,
        },
    )
    .await?;
    let order = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            restaurant_id: fixture.restaurant_id,
            delivery_mode: None,
            address_id: None,
            tip_amount: Decimal::ZERO,
            payment_method: PaymentMethod::Bank,
            delivery_note: String::new(),
        },
    )
    .await?
    .data
    .expect("order")
    .order;

    make_ready(&state, &fixture, order.id).await?;
    let delivered =
        order_service::advance_status(&state, &fixture.owner, order.id, OrderStatus::Delivered)
            .await?
            .data
            .expect("order");
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.driver_id, None);

    let reopen =
        order_service::advance_status(&state, &fixture.owner, order.id, OrderStatus::Accepted)
            .await;
    assert!(matches!(reopen, Err(AppError::InvalidTransition { .. })));
    Ok(())
}

#[tokio::test]
async fn concurrent_transitions_from_the_same_status_have_one_winner() -> anyhow::Result<()> {
    let state = setup_shared_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let order = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let state = state.clone();
        let owner = fixture.owner.clone();
        handles.push(tokio::spawn(async move {
            order_service::advance_status(&state, &owner, order.id, OrderStatus::Accepted).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => winners += 1,
            Err(AppError::InvalidTransition { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(winners, 1);
    Ok(())
}

async fn stored_order(state: &AppState, id: Uuid) -> anyhow::Result<OrderModel> {
    Ok(Orders::find_by_id(id).one(&state.orm).await?.expect("order row"))
}

/// Asserts that `after` differs from `before` in status and timestamp only.
fn assert_only_status_moved(before: &OrderModel, after: &OrderModel, to: OrderStatus) {
    assert_eq!(after.status, to.as_str());
    let mut expected = before.clone();
    expected.status = after.status.clone();
    expected.updated_at = after.updated_at;
    assert_eq!(*after, expected, "more than the status changed on {to}");
}

#[tokio::test]
async fn transitions_change_nothing_but_the_status() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();

    let order = place_delivery_order(&state, &fixture, &customer, 2, Some(2.0)).await?;
    for status in [
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::ReadyForPickup,
    ] {
        let before = stored_order(&state, order.id).await?;
        order_service::advance_status(&state, &fixture.owner, order.id, status).await?;
        assert_only_status_moved(&before, &stored_order(&state, order.id).await?, status);
    }

    // Claiming also binds the driver; nothing else may move.
    let courier = driver();
    let before = stored_order(&state, order.id).await?;
    order_service::advance_status(&state, &courier, order.id, OrderStatus::DriverAssigned).await?;
    let mut after = stored_order(&state, order.id).await?;
    assert!(after.driver_id.is_some());
    after.driver_id = before.driver_id;
    assert_only_status_moved(&before, &after, OrderStatus::DriverAssigned);

    for status in [OrderStatus::OnTheWay, OrderStatus::Delivered] {
        let before = stored_order(&state, order.id).await?;
        delivery_service::update_delivery_status(&state, &courier, order.id, status).await?;
        assert_only_status_moved(&before, &stored_order(&state, order.id).await?, status);
    }

    let cancelled = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;
    let before = stored_order(&state, cancelled.id).await?;
    order_service::cancel_order(&state, &customer, cancelled.id).await?;
    let after = stored_order(&state, cancelled.id).await?;
    assert_only_status_moved(&before, &after, OrderStatus::Cancelled);

    let declined = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;
    order_service::advance_status(&state, &fixture.owner, declined.id, OrderStatus::Accepted)
        .await?;
    let before = stored_order(&state, declined.id).await?;
    order_service::advance_status(&state, &fixture.owner, declined.id, OrderStatus::Cancelled)
        .await?;
    let after = stored_order(&state, declined.id).await?;
    assert_only_status_moved(&before, &after, OrderStatus::Cancelled);
    Ok(())
}
