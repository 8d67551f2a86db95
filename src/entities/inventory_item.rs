use crate::db::query_builder::{FieldKind, FieldSpec, FilterSchema};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Denormalized category label
    pub category: String,
    pub quantity: i32,
    pub unit: ItemUnit,
    pub reorder_threshold: i32,
    pub last_updated: DateTime<Utc>,
    pub forecast_predicted_usage: Option<i32>,
    pub forecast_date: Option<DateTime<Utc>>,
    /// Bumped on every stock mutation
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        self.updated_at = Set(now);
        if insert {
            if self.id.is_not_set() {
                self.id = Set(Uuid::new_v4());
            }
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
            if self.version.is_not_set() {
                self.version = Set(0);
            }
        }
        Ok(self)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemUnit {
    #[default]
    #[sea_orm(string_value = "pcs")]
    Pcs,
    #[sea_orm(string_value = "box")]
    Box,
    #[sea_orm(string_value = "kg")]
    Kg,
    #[sea_orm(string_value = "liters")]
    Liters,
    #[sea_orm(string_value = "meters")]
    Meters,
}

/// Latest demand forecast attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub predicted_usage: i32,
    pub forecast_date: Option<DateTime<Utc>>,
}

/// API shape of an inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub quantity: i32,
    pub unit: ItemUnit,
    pub reorder_threshold: i32,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Forecast>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Model> for InventoryItemView {
    fn from(m: Model) -> Self {
        let forecast = m.forecast_predicted_usage.map(|predicted_usage| Forecast {
            predicted_usage,
            forecast_date: m.forecast_date,
        });
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            category: m.category,
            quantity: m.quantity,
            unit: m.unit,
            reorder_threshold: m.reorder_threshold,
            last_updated: m.last_updated,
            forecast,
            version: m.version,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl Model {
    /// Predicted usage, treating a missing forecast as zero.
    pub fn predicted_usage(&self) -> i32 {
        self.forecast_predicted_usage.unwrap_or(0)
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity < self.reorder_threshold
    }

    pub fn expected_remaining(&self) -> i32 {
        self.quantity - self.predicted_usage()
    }

    pub fn is_forecast_low_stock(&self) -> bool {
        self.expected_remaining() < self.reorder_threshold
    }
}

impl FilterSchema for Entity {
    type View = InventoryItemView;

    fn fields() -> Vec<FieldSpec<Column>> {
        vec![
            FieldSpec::new("id", Column::Id, FieldKind::Id),
            FieldSpec::new("name", Column::Name, FieldKind::Text),
            FieldSpec::new("description", Column::Description, FieldKind::Text),
            FieldSpec::new("category", Column::Category, FieldKind::Text),
            FieldSpec::new("quantity", Column::Quantity, FieldKind::Integer),
            FieldSpec::new("unit", Column::Unit, FieldKind::Enum),
            FieldSpec::new("reorderThreshold", Column::ReorderThreshold, FieldKind::Integer),
            FieldSpec::new("lastUpdated", Column::LastUpdated, FieldKind::Timestamp),
            FieldSpec::new(
                "forecast.predictedUsage",
                Column::ForecastPredictedUsage,
                FieldKind::Integer,
            ),
            FieldSpec::new("forecast.forecastDate", Column::ForecastDate, FieldKind::Timestamp),
            FieldSpec::new("createdAt", Column::CreatedAt, FieldKind::Timestamp),
            FieldSpec::new("updatedAt", Column::UpdatedAt, FieldKind::Timestamp),
        ]
    }

    fn search_columns() -> Vec<Column> {
        vec![Column::Name, Column::Description, Column::Category]
    }
}
