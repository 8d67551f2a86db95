//! Line snapshot of an order. Rows are written once with the order and never updated.

use super::inventory_item::ItemUnit;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    /// Not a foreign key: the item may be deleted later.
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit: ItemUnit,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Snapshot as it appears inside an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit: ItemUnit,
}

impl From<Model> for OrderLine {
    fn from(m: Model) -> Self {
        Self {
            item_id: m.item_id,
            name: m.name,
            quantity: m.quantity,
            unit: m.unit,
        }
    }
}
