use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddCartItemRequest, SetDeliveryModeRequest},
        delivery::{AcceptedDelivery, ShiftList, UpdateDriverProfileRequest},
        orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        payments::{
            CommissionList, PayOrderRequest, PaymentReceipt, RefundList, RefundReceipt,
            RefundRequest, TransactionList,
        },
    },
    models::{
        AddressSnapshot, Cart, CartItem, DeliveryAssignment, DeliveryMode, DriverProfile,
        DriverShift, Order, OrderCommission, OrderItem, OrderStatus, PaymentMethod,
        PaymentStatus, PaymentTransaction, Refund, RefundStatus, TransactionStatus, VehicleType,
    },
    response::{ApiResponse, Meta},
    routes::{admin, cart, delivery, health, orders, params, restaurants},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        cart::get_cart,
        cart::set_delivery_mode,
        cart::add_item,
        cart::remove_item,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::update_status,
        orders::cancel_order,
        orders::pay_order,
        orders::refund_order,
        restaurants::list_restaurant_orders,
        delivery::get_profile,
        delivery::update_profile,
        delivery::list_eligible_orders,
        delivery::accept_order,
        delivery::update_delivery_status,
        delivery::start_shift,
        delivery::end_shift,
        delivery::list_shifts,
        admin::list_all_orders,
        admin::list_transactions,
        admin::list_refunds,
        admin::list_commissions
    ),
    components(
        schemas(
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            DeliveryMode,
            VehicleType,
            TransactionStatus,
            RefundStatus,
            AddressSnapshot,
            Cart,
            CartItem,
            Order,
            OrderItem,
            DriverProfile,
            DriverShift,
            DeliveryAssignment,
            PaymentTransaction,
            OrderCommission,
            Refund,
            AddCartItemRequest,
            SetDeliveryModeRequest,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            UpdateDriverProfileRequest,
            PayOrderRequest,
            RefundRequest,
            OrderList,
            OrderWithItems,
            AcceptedDelivery,
            ShiftList,
            PaymentReceipt,
            RefundReceipt,
            TransactionList,
            RefundList,
            CommissionList,
            params::Pagination,
            params::OrderListQuery,
            params::PaymentListQuery,
            Meta,
            ApiResponse<Cart>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<PaymentReceipt>,
            ApiResponse<RefundReceipt>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Cart", description = "Per-restaurant carts"),
        (name = "Orders", description = "Checkout and order lifecycle"),
        (name = "Payments", description = "Capture and refund"),
        (name = "Restaurants", description = "Restaurant-side order views"),
        (name = "Driver", description = "Driver profile, shifts and deliveries"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
