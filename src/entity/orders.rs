use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub delivery_mode: String,
    pub address_full_name: String,
    pub address_phone_number: String,
    pub address_street: String,
    pub address_city: String,
    pub address_postal_code: String,
    pub address_country: String,
    pub address_latitude: Option<f64>,
    pub address_longitude: Option<f64>,
    pub delivery_note: String,
    pub food_subtotal_cents: i64,
    pub service_fee_cents: i64,
    pub delivery_fee_cents: i64,
    pub tip_cents: i64,
    pub total_cents: i64,
    pub currency: String,
    pub payment_method: String,
    pub payment_status: String,
    pub payment_reference: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::restaurants::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurants::Column::Id"
    )]
    Restaurants,
    #[sea_orm(
        belongs_to = "super::driver_profiles::Entity",
        from = "Column::DriverId",
        to = "super::driver_profiles::Column::Id"
    )]
    DriverProfiles,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(has_one = "super::delivery_assignments::Entity")]
    DeliveryAssignments,
    #[sea_orm(has_many = "super::payment_transactions::Entity")]
    PaymentTransactions,
    #[sea_orm(has_many = "super::refunds::Entity")]
    Refunds,
    #[sea_orm(has_one = "super::order_commissions::Entity")]
    OrderCommissions,
}

impl Related<super::restaurants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurants.def()
    }
}

impl Related<super::driver_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DriverProfiles.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::delivery_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryAssignments.def()
    }
}

impl Related<super::payment_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentTransactions.def()
    }
}

impl Related<super::refunds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Refunds.def()
    }
}

impl Related<super::order_commissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderCommissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
