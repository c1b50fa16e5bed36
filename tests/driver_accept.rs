mod support;

use food_delivery_api::{
    dto::delivery::UpdateDriverProfileRequest,
    entity::{DeliveryAssignments, delivery_assignments::Column as AssignmentCol},
    error::AppError,
    models::{OrderStatus, VehicleType},
    routes::params::Pagination,
    services::{delivery_service, order_service},
};

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use support::{
    customer, driver, make_ready, place_delivery_order, seed_restaurant, set_vehicle,
    setup_shared_state, setup_state,
};

#[tokio::test]
async fn accept_binds_the_driver_and_prices_the_trip() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let order = place_delivery_order(&state, &fixture, &customer, 2, Some(5.0)).await?;
    make_ready(&state, &fixture, order.id).await?;

    let driver = driver();
    let accepted = delivery_service::accept_order(&state, &driver, order.id)
        .await?
        .data
        .expect("accepted");
    let profile = delivery_service::get_profile(&state, &driver)
        .await?
        .data
        .expect("profile");

    assert_eq!(accepted.order.status, OrderStatus::DriverAssigned);
    assert_eq!(accepted.order.driver_id, Some(profile.id));
    assert_eq!(accepted.assignment.driver_id, profile.id);
    assert!((accepted.assignment.distance_km - 5.0).abs() < 0.01);
    assert!(!accepted.assignment.distance_unverified);
    assert_eq!(accepted.assignment.per_km_rate.to_string(), "0.15");
    assert_eq!(accepted.assignment.distance_pay.to_string(), "0.75");

    let again = delivery_service::accept_order(&state, &driver, order.id).await;
    assert!(matches!(again, Err(AppError::AlreadyAssigned)));
    Ok(())
}

#[tokio::test]
async fn racing_drivers_get_exactly_one_assignment() -> anyhow::Result<()> {
    let state = setup_shared_state().await?;
    let fixture = seed_restaurant(&state).await?;

    for _ in 0..5 {
        let customer = customer();
        let order = place_delivery_order(&state, &fixture, &customer, 1, Some(3.0)).await?;
        make_ready(&state, &fixture, order.id).await?;

        let mut handles = Vec::new();
        for _ in 0..5 {
            let state = state.clone();
            let driver = driver();
            handles.push(tokio::spawn(async move {
                delivery_service::accept_order(&state, &driver, order.id).await
            }));
        }

        let mut winner = None;
        let mut losers = 0;
        for handle in handles {
            match handle.await? {
                Ok(accepted) => {
                    assert!(winner.is_none(), "two drivers won order {}", order.id);
                    winner = accepted.data.map(|d| d.assignment.driver_id);
                }
                Err(AppError::AlreadyAssigned) => losers += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(losers, 4);

        let assignments = DeliveryAssignments::find()
            .filter(AssignmentCol::OrderId.eq(order.id))
            .all(&state.orm)
            .await?;
        assert_eq!(assignments.len(), 1);
        assert_eq!(Some(assignments[0].driver_id), winner);

        let stored = order_service::get_order(&state, &customer, order.id)
            .await?
            .data
            .expect("order");
        assert_eq!(stored.order.driver_id, winner);
    }
    Ok(())
}

#[tokio::test]
async fn vehicle_range_limits_who_can_accept() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let order = place_delivery_order(&state, &fixture, &customer, 1, Some(10.0)).await?;
    make_ready(&state, &fixture, order.id).await?;

    let cyclist = driver();
    let too_far = delivery_service::accept_order(&state, &cyclist, order.id).await;
    assert!(matches!(too_far, Err(AppError::DistanceExceeded { .. })));

    let motorist = driver();
    set_vehicle(&state, &motorist, VehicleType::Car, "").await?;
    let accepted = delivery_service::accept_order(&state, &motorist, order.id).await?;
    assert_eq!(
        accepted.data.expect("accepted").order.status,
        OrderStatus::DriverAssigned
    );
    Ok(())
}

#[tokio::test]
async fn drivers_stay_inside_their_city() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let order = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;
    make_ready(&state, &fixture, order.id).await?;

    let munich = driver();
    set_vehicle(&state, &munich, VehicleType::Bike, "Munich").await?;
    let eligible = delivery_service::list_eligible_orders(&state, &munich).await?;
    assert!(eligible.data.expect("orders").items.is_empty());
    let outside = delivery_service::accept_order(&state, &munich, order.id).await;
    assert!(matches!(outside, Err(AppError::OutOfServiceArea)));

    let berlin = driver();
    set_vehicle(&state, &berlin, VehicleType::Bike, "berlin").await?;
    let eligible = delivery_service::list_eligible_orders(&state, &berlin)
        .await?
        .data
        .expect("orders");
    assert_eq!(eligible.items.len(), 1);
    assert_eq!(eligible.items[0].id, order.id);

    delivery_service::accept_order(&state, &berlin, order.id).await?;
    let eligible = delivery_service::list_eligible_orders(&state, &berlin).await?;
    assert!(eligible.data.expect("orders").items.is_empty());
    Ok(())
}

#[tokio::test]
async fn orders_must_be_ready_before_a_driver_takes_them() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let order = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;

    let early = delivery_service::accept_order(&state, &driver(), order.id).await;
    assert!(matches!(early, Err(AppError::NotReady)));
    Ok(())
}

#[tokio::test]
async fn missing_coordinates_are_accepted_but_flagged() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let order = place_delivery_order(&state, &fixture, &customer, 1, None).await?;
    make_ready(&state, &fixture, order.id).await?;

    let accepted = delivery_service::accept_order(&state, &driver(), order.id)
        .await?
        .data
        .expect("accepted");
    assert_eq!(accepted.assignment.distance_km, 0.0);
    assert!(accepted.assignment.distance_unverified);
    assert_eq!(accepted.assignment.distance_pay.to_string(), "0.00");
    Ok(())
}

#[tokio::test]
async fn inactive_drivers_cannot_accept() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let order = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;
    make_ready(&state, &fixture, order.id).await?;

    let resting = driver();
    delivery_service::update_profile(
        &state,
        &resting,
        UpdateDriverProfileRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?;
    let refused = delivery_service::accept_order(&state, &resting, order.id).await;
    assert!(matches!(refused, Err(AppError::Forbidden)));
    Ok(())
}

#[tokio::test]
async fn assigned_driver_carries_the_order_to_the_door() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let fixture = seed_restaurant(&state).await?;
    let customer = customer();
    let order = place_delivery_order(&state, &fixture, &customer, 1, Some(2.0)).await?;
    make_ready(&state, &fixture, order.id).await?;

    // Claiming through the generic status endpoint goes through the same checks.
    let courier = driver();
    let assigned =
        order_service::advance_status(&state, &courier, order.id, OrderStatus::DriverAssigned)
            .await?;
    assert_eq!(assigned.data.expect("order").status, OrderStatus::DriverAssigned);

    let bystander = driver();
    let not_theirs =
        delivery_service::update_delivery_status(&state, &bystander, order.id, OrderStatus::OnTheWay)
            .await;
    assert!(matches!(not_theirs, Err(AppError::NotFound)));

    let sideways =
        delivery_service::update_delivery_status(&state, &courier, order.id, OrderStatus::Preparing)
            .await;
    assert!(matches!(sideways, Err(AppError::Validation(_))));

    let skipped =
        delivery_service::update_delivery_status(&state, &courier, order.id, OrderStatus::Delivered)
            .await;
    assert!(matches!(skipped, Err(AppError::InvalidTransition { .. })));

    for status in [OrderStatus::OnTheWay, OrderStatus::Delivered] {
        let moved = delivery_service::update_delivery_status(&state, &courier, order.id, status)
            .await?
            .data
            .expect("order");
        assert_eq!(moved.status, status);
    }

    // The driver can read the order they carried.
    let seen = order_service::get_order(&state, &courier, order.id).await?;
    assert_eq!(seen.data.expect("order").order.status, OrderStatus::Delivered);
    Ok(())
}

#[tokio::test]
async fn shifts_open_and_close_one_at_a_time() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let courier = driver();

    let started = delivery_service::start_shift(&state, &courier)
        .await?
        .data
        .expect("shift");
    assert!(started.is_open);

    let twice = delivery_service::start_shift(&state, &courier).await;
    assert!(matches!(twice, Err(AppError::Validation(_))));

    let ended = delivery_service::end_shift(&state, &courier)
        .await?
        .data
        .expect("shift");
    assert_eq!(ended.id, started.id);
    assert!(!ended.is_open);
    assert_eq!(ended.total_minutes, Some(0));

    let none_open = delivery_service::end_shift(&state, &courier).await;
    assert!(matches!(none_open, Err(AppError::Validation(_))));

    let history = delivery_service::list_shifts(&state, &courier, Pagination::default())
        .await?
        .data
        .expect("shifts");
    assert_eq!(history.items.len(), 1);

    let customer_tries = delivery_service::start_shift(&state, &customer()).await;
    assert!(matches!(customer_tries, Err(AppError::Forbidden)));
    Ok(())
}
