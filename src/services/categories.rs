use crate::{
    entities::category::{self, Entity as CategoryEntity},
    errors::{ServiceError, ServiceResult},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Tools")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "🔧")]
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct CategoryService {
    db_pool: Arc<DatabaseConnection>,
}

fn duplicate(name: &str) -> ServiceError {
    ServiceError::Conflict(format!("Category '{name}' already exists"))
}

impl CategoryService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateCategoryRequest) -> ServiceResult<category::Model> {
        request.validate()?;
        let name = request.name.trim().to_string();
        if self.find_by_name(&name).await?.is_some() {
            return Err(duplicate(&name));
        }

        let created = category::ActiveModel {
            name: Set(name.clone()),
            description: Set(request.description),
            icon: Set(request.icon),
            is_active: Set(request.is_active.unwrap_or(true)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| match ServiceError::from(e) {
            ServiceError::Conflict(_) => duplicate(&name),
            other => other,
        })?;

        info!(category_id = %created.id, "category created");
        Ok(created)
    }

    /// Categories sorted by name.
    pub async fn list(&self, active_only: bool) -> ServiceResult<Vec<category::Model>> {
        let mut select = CategoryEntity::find();
        if active_only {
            select = select.filter(category::Column::IsActive.eq(true));
        }
        Ok(select
            .order_by_asc(category::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn find_one(&self, id: Uuid) -> ServiceResult<category::Model> {
        CategoryEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    pub async fn find_by_name(&self, name: &str) -> ServiceResult<Option<category::Model>> {
        Ok(CategoryEntity::find()
            .filter(category::Column::Name.eq(name))
            .one(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request), fields(category_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateCategoryRequest,
    ) -> ServiceResult<category::Model> {
        request.validate()?;
        let mut active = self.find_one(id).await?.into_active_model();

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if let Some(other) = self.find_by_name(&name).await? {
                if other.id != id {
                    return Err(duplicate(&name));
                }
            }
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(icon) = request.icon {
            active.icon = Set(Some(icon));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let result = CategoryEntity::delete_by_id(id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Category", id));
        }
        info!(category_id = %id, "category deleted");
        Ok(())
    }
}
