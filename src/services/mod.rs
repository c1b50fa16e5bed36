pub mod admin_service;
pub mod cart_service;
pub mod delivery_service;
pub mod directory;
pub mod gateway;
pub mod lifecycle;
pub mod mapping;
pub mod matching;
pub mod order_service;
pub mod payment_service;
pub mod pricing;
