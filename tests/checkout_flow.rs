mod support;

use food_delivery_api::{
    dto::{
        cart::{AddCartItemRequest, SetDeliveryModeRequest},
        orders::CheckoutRequest,
    },
    entity::{
        CartItems, MenuItems, Orders, menu_items::ActiveModel as MenuItemActive,
        orders::Column as OrderCol,
    },
    error::AppError,
    models::{DeliveryMode, OrderStatus, PaymentMethod, PaymentStatus},
    routes::params::OrderListQuery,
    services::{cart_service, order_service},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use support::{
    customer, place_delivery_order, seed_address, seed_menu_item, seed_restaurant,
    setup_shared_state, setup_state,
};

fn checkout_request(restaurant_id: uuid::Uuid, address_id: Option<uuid::Uuid>) -> CheckoutRequest {
    CheckoutRequest {
        restaurant_id,
        delivery_mode: None,
        address_id,
        tip_amount: Decimal::ZERO,
        payment_method: PaymentMethod::Mastercard,
        delivery_note: "Ring twice".into(),
    }
}

#[tokio::test]
async fn checkout_snapshots_prices_and_empties_the_cart() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let address_id = seed_address(&state, &customer, Some(3.0)).await?;

    let cart = cart_service::add_item(
        &state,
        &customer,
        fixture.restaurant_id,
        AddCartItemRequest {
            menu_item_id: fixture.menu_item_id,
            quantity: 2,
        },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(cart.subtotal.to_string(), "19.00");
    assert_eq!(cart.total.to_string(), "19.00");
    assert_eq!(cart.items.len(), 1);

    let placed = order_service::checkout(
        &state,
        &customer,
        checkout_request(fixture.restaurant_id, Some(address_id)),
    )
    .await?
    .data
    .expect("order");

    let order = &placed.order;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.delivery_mode, DeliveryMode::Delivery);
    assert_eq!(order.food_subtotal.to_string(), "19.00");
    assert_eq!(order.total_amount.to_string(), "19.00");
    assert_eq!(order.currency, "EUR");
    assert_eq!(order.address.city, "Berlin");
    assert_eq!(order.delivery_note, "Ring twice");
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].item_price.to_string(), "9.50");
    assert_eq!(placed.items[0].item_ingredients, "Tomato, mozzarella");
    assert_eq!(placed.items[0].line_total.to_string(), "19.00");

    let cart = cart_service::get_cart(&state, &customer, fixture.restaurant_id)
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);

    // Catalog changes after checkout never reach the order.
    let menu_item = MenuItems::find_by_id(fixture.menu_item_id)
        .one(&state.orm)
        .await?
        .expect("menu item");
    let mut active: MenuItemActive = menu_item.into();
    active.price_cents = Set(1200);
    active.update(&state.orm).await?;

    let stored = order_service::get_order(&state, &customer, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(stored.items[0].item_price.to_string(), "9.50");
    assert_eq!(stored.order.total_amount.to_string(), "19.00");
    Ok(())
}

#[tokio::test]
async fn tip_is_added_on_top_of_the_breakdown() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let address_id = seed_address(&state, &customer, Some(1.0)).await?;
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

    let mut request = checkout_request(fixture.restaurant_id, Some(address_id));
    request.tip_amount = Decimal::new(250, 2);
    let order = order_service::checkout(&state, &customer, request)
        .await?
        .data
        .expect("order")
        .order;

    assert_eq!(order.food_subtotal.to_string(), "9.50");
    assert_eq!(order.tip_amount.to_string(), "2.50");
    assert_eq!(order.total_amount.to_string(), "12.00");
    Ok(())
}

#[tokio::test]
async fn checkout_rejects_bad_requests() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();

    let empty = order_service::checkout(
        &state,
        &customer,
        checkout_request(fixture.restaurant_id, None),
    )
    .await;
    assert!(matches!(empty, Err(AppError::Validation(_))));

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

    let no_address = order_service::checkout(
        &state,
        &customer,
        checkout_request(fixture.restaurant_id, None),
    )
    .await;
    assert!(matches!(no_address, Err(AppError::Validation(_))));

    let address_id = seed_address(&state, &customer, Some(2.0)).await?;
    let mut negative_tip = checkout_request(fixture.restaurant_id, Some(address_id));
    negative_tip.tip_amount = Decimal::new(-100, 2);
    let negative_tip = order_service::checkout(&state, &customer, negative_tip).await;
    assert!(matches!(negative_tip, Err(AppError::Validation(_))));

    let mut huge_tip = checkout_request(fixture.restaurant_id, Some(address_id));
    huge_tip.tip_amount = Decimal::MAX;
    let huge_tip = order_service::checkout(&state, &customer, huge_tip).await;
    assert!(matches!(huge_tip, Err(AppError::Validation(_))));

    // Another customer's address book is invisible.
    let stranger = support::customer();
    let foreign_address = seed_address(&state, &stranger, Some(2.0)).await?;
    let foreign = order_service::checkout(
        &state,
        &customer,
        checkout_request(fixture.restaurant_id, Some(foreign_address)),
    )
    .await;
    assert!(matches!(foreign, Err(AppError::NotFound)));

    // Nothing was placed, so the cart still holds its line.
    let cart = cart_service::get_cart(&state, &customer, fixture.restaurant_id)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn pickup_checkout_needs_no_address() -> anyhow::Result<()> {
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

    let order = order_service::checkout(&state, &customer, checkout_request(fixture.restaurant_id, None))
        .await?
        .data
        .expect("order")
        .order;
    assert_eq!(order.delivery_mode, DeliveryMode::Pickup);
    assert!(order.address.street.is_empty());
    assert_eq!(order.address.latitude, None);
    Ok(())
}

#[tokio::test]
async fn adding_an_item_again_sets_its_quantity() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();

    for quantity in [2, 3] {
        cart_service::add_item(
            &state,
            &customer,
            fixture.restaurant_id,
            AddCartItemRequest {
                menu_item_id: fixture.menu_item_id,
                quantity,
            },
        )
        .await?;
    }

    let cart = cart_service::get_cart(&state, &customer, fixture.restaurant_id)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.subtotal.to_string(), "28.50");

    let zero = cart_service::add_item(
        &state,
        &customer,
        fixture.restaurant_id,
        AddCartItemRequest {
            menu_item_id: fixture.menu_item_id,
            quantity: 0,
        },
    )
    .await;
    assert!(matches!(zero, Err(AppError::Validation(_))));

    let line_id = cart.items[0].id;
    cart_service::remove_item(&state, &customer, fixture.restaurant_id, line_id).await?;
    let missing = cart_service::remove_item(&state, &customer, fixture.restaurant_id, line_id).await;
    assert!(matches!(missing, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn carts_are_scoped_to_one_restaurant() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let first = seed_restaurant(&state).await?;
    let second = seed_restaurant(&state).await?;
    let other_item = seed_menu_item(&state, second.restaurant_id, 400).await?;
    let customer = customer();

    let wrong = cart_service::add_item(
        &state,
        &customer,
        first.restaurant_id,
        AddCartItemRequest {
            menu_item_id: other_item,
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::Validation(_))));

    cart_service::add_item(
        &state,
        &customer,
        second.restaurant_id,
        AddCartItemRequest {
            menu_item_id: other_item,
            quantity: 1,
        },
    )
    .await?;
    let first_cart = cart_service::get_cart(&state, &customer, first.restaurant_id)
        .await?
        .data
        .expect("cart");
    assert!(first_cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn customers_list_only_their_own_orders() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let alice = customer();
    let bob = customer();

    let alice_order = place_delivery_order(&state, &fixture, &alice, 1, Some(2.0)).await?;
    place_delivery_order(&state, &fixture, &bob, 1, Some(2.0)).await?;

    let listed = order_service::list_orders(&state, &alice, OrderListQuery::default()).await?;
    let items = listed.data.expect("orders").items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, alice_order.id);
    assert_eq!(listed.meta.expect("meta").total, Some(1));

    let peek = order_service::get_order(&state, &bob, alice_order.id).await;
    assert!(matches!(peek, Err(AppError::Forbidden)));

    let owner_view = order_service::list_restaurant_orders(
        &state,
        &fixture.owner,
        fixture.restaurant_id,
        OrderListQuery::default(),
    )
    .await?;
    assert_eq!(owner_view.data.expect("orders").items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn concurrent_checkouts_of_one_cart_place_one_order() -> anyhow::Result<()> {
    let state = setup_shared_state().await?;
    let fixture = seed_restaurant(&state).await?;

    for _ in 0..5 {
        let customer = customer();
        let address_id = seed_address(&state, &customer, Some(2.0)).await?;
        cart_service::add_item(
            &state,
            &customer,
            fixture.restaurant_id,
            AddCartItemRequest {
                menu_item_id: fixture.menu_item_id,
                quantity: 2,
            },
        )
        .await?;

        let mut handles = Vec::new();
        for _ in 0..4 {
            let state = state.clone();
            let customer = customer.clone();
            let request = checkout_request(fixture.restaurant_id, Some(address_id));
            handles.push(tokio::spawn(async move {
                order_service::checkout(&state, &customer, request).await
            }));
        }

        let mut placed = 0;
        for handle in handles {
            match handle.await? {
                Ok(_) => placed += 1,
                Err(AppError::Validation(_)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(placed, 1);

        let orders = Orders::find()
            .filter(OrderCol::CustomerId.eq(customer.user_id))
            .count(&state.orm)
            .await?;
        assert_eq!(orders, 1);
    }
    Ok(())
}

#[tokio::test]
async fn concurrent_adds_of_one_item_share_a_line() -> anyhow::Result<()> {
    let state = setup_shared_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();

    let mut handles = Vec::new();
    for quantity in 1..=4 {
        let state = state.clone();
        let customer = customer.clone();
        let menu_item_id = fixture.menu_item_id;
        let restaurant_id = fixture.restaurant_id;
        handles.push(tokio::spawn(async move {
            cart_service::add_item(
                &state,
                &customer,
                restaurant_id,
                AddCartItemRequest {
                    menu_item_id,
                    quantity,
                },
            )
            .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let cart = cart_service::get_cart(&state, &customer, fixture.restaurant_id)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert!((1..=4).contains(&cart.items[0].quantity));
    assert_eq!(CartItems::find().count(&state.orm).await?, 1);
    Ok(())
}
