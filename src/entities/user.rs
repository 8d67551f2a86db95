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
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
#[schema(as = User)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub username: String,
    #[serde(skip_serializing, default)]
    #[schema(ignore)]
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub can_login: bool,
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
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[default]
    #[sea_orm(string_value = "staff")]
    Staff,
}

impl FilterSchema for Entity {
    type View = Model;

    fn fields() -> Vec<FieldSpec<Column>> {
        vec![
            FieldSpec::new("id", Column::Id, FieldKind::Id),
            FieldSpec::new("name", Column::Name, FieldKind::Text),
            FieldSpec::new("username", Column::Username, FieldKind::Text),
            FieldSpec::new("role", Column::Role, FieldKind::Enum),
            FieldSpec::new("canLogin", Column::CanLogin, FieldKind::Boolean),
            FieldSpec::new("isActive", Column::IsActive, FieldKind::Boolean),
            FieldSpec::new("createdAt", Column::CreatedAt, FieldKind::Timestamp),
            FieldSpec::new("updatedAt", Column::UpdatedAt, FieldKind::Timestamp),
        ]
    }

    fn search_columns() -> Vec<Column> {
        vec![Column::Name, Column::Username]
    }

    fn hidden_fields() -> &'static [&'static str] {
        &["passwordHash"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_never_serializes() {
        let now = Utc::now();
        let user = Model {
            id: Uuid::new_v4(),
            name: "Admin".into(),
            username: "admin".into(),
            password_hash: Some("$argon2id$v=19$secret".into()),
            role: UserRole::Admin,
            can_login: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "admin");
        assert_eq!(json["canLogin"], true);
    }
}
