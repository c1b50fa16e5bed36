pub mod addresses;
pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod delivery_assignments;
pub mod driver_profiles;
pub mod driver_shifts;
pub mod menu_items;
pub mod order_commissions;
pub mod order_items;
pub mod orders;
pub mod payment_transactions;
pub mod refunds;
pub mod restaurants;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use delivery_assignments::Entity as DeliveryAssignments;
pub use driver_profiles::Entity as DriverProfiles;
pub use driver_shifts::Entity as DriverShifts;
pub use menu_items::Entity as MenuItems;
pub use order_commissions::Entity as OrderCommissions;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payment_transactions::Entity as PaymentTransactions;
pub use refunds::Entity as Refunds;
pub use restaurants::Entity as Restaurants;
