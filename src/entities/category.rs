use crate::db::query_builder::{FieldKind, FieldSpec, FilterSchema};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "categories")]
#[serde(rename_all = "camelCase")]
#[schema(as = Category)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub is_active: bool,
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
            if self.is_active.is_not_set() {
                self.is_active = Set(true);
            }
        }
        Ok(self)
    }
}

impl FilterSchema for Entity {
    type View = Model;

    fn fields() -> Vec<FieldSpec<Column>> {
        vec![
            FieldSpec::new("id", Column::Id, FieldKind::Id),
            FieldSpec::new("name", Column::Name, FieldKind::Text),
            FieldSpec::new("description", Column::Description, FieldKind::Text),
            FieldSpec::new("isActive", Column::IsActive, FieldKind::Boolean),
            FieldSpec::new("createdAt", Column::CreatedAt, FieldKind::Timestamp),
            FieldSpec::new("updatedAt", Column::UpdatedAt, FieldKind::Timestamp),
        ]
    }

    fn search_columns() -> Vec<Column> {
        vec![Column::Name, Column::Description]
    }
}
