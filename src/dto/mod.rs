pub mod cart;
pub mod delivery;
pub mod orders;
pub mod payments;
