use crate::db::query_builder::{FieldKind, FieldSpec, FilterSchema};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "alerts")]
#[serde(rename_all = "camelCase")]
#[schema(as = Alert)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub message: String,
    pub status: AlertStatus,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
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
            if self.status.is_not_set() {
                self.status = Set(AlertStatus::New);
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
pub enum AlertStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "dismissed")]
    Dismissed,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertType {
    #[sea_orm(string_value = "manual_threshold")]
    ManualThreshold,
    #[sea_orm(string_value = "forecast_based")]
    ForecastBased,
}

impl FilterSchema for Entity {
    type View = Model;

    fn fields() -> Vec<FieldSpec<Column>> {
        vec![
            FieldSpec::new("id", Column::Id, FieldKind::Id),
            FieldSpec::new("itemId", Column::ItemId, FieldKind::Id),
            FieldSpec::new("itemName", Column::ItemName, FieldKind::Text),
            FieldSpec::new("message", Column::Message, FieldKind::Text),
            FieldSpec::new("status", Column::Status, FieldKind::Enum),
            FieldSpec::new("type", Column::AlertType, FieldKind::Enum),
            FieldSpec::new("createdAt", Column::CreatedAt, FieldKind::Timestamp),
            FieldSpec::new("updatedAt", Column::UpdatedAt, FieldKind::Timestamp),
        ]
    }

    fn search_columns() -> Vec<Column> {
        vec![Column::ItemName, Column::Message]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_type_wire_names() {
        assert_eq!(
            serde_json::to_value(AlertType::ForecastBased).unwrap(),
            "forecast_based"
        );
        assert_eq!(
            "manual_threshold".parse::<AlertType>().unwrap(),
            AlertType::ManualThreshold
        );
    }
}
