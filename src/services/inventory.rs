use crate::{
    db::{query_builder::escape_like, ListQuery, ListResult},
    entities::inventory_item::{self, Entity as InventoryItemEntity, InventoryItemView, ItemUnit},
    errors::{ServiceError, ServiceResult},
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const DEFAULT_REORDER_THRESHOLD: i32 = 5;

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryItemRequest {
    #[validate(custom = "not_blank", length(max = 200))]
    #[schema(example = "10mm Wrench")]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "not_blank")]
    #[schema(example = "Tools")]
    pub category: String,
    #[validate(range(min = 0, message = "must be greater than or equal to 0"))]
    pub quantity: Option<i32>,
    pub unit: Option<ItemUnit>,
    #[validate(range(min = 0, message = "must be greater than or equal to 0"))]
    pub reorder_threshold: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryItemRequest {
    #[validate(custom = "not_blank", length(max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "not_blank")]
    pub category: Option<String>,
    #[validate(range(min = 0, message = "must be greater than or equal to 0"))]
    pub quantity: Option<i32>,
    pub unit: Option<ItemUnit>,
    #[validate(range(min = 0, message = "must be greater than or equal to 0"))]
    pub reorder_threshold: Option<i32>,
}

/// Service for managing inventory items
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateInventoryItemRequest) -> ServiceResult<InventoryItemView> {
        request.validate()?;
        let now = Utc::now();

        let item = inventory_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            category: Set(request.category.trim().to_string()),
            quantity: Set(request.quantity.unwrap_or(0)),
            unit: Set(request.unit.unwrap_or_default()),
            reorder_threshold: Set(request.reorder_threshold.unwrap_or(DEFAULT_REORDER_THRESHOLD)),
            last_updated: Set(now),
            forecast_predicted_usage: Set(None),
            forecast_date: Set(None),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(item_id = %item.id, "inventory item created");
        Ok(self.publish(item))
    }

    /// Query-string driven listing. `category` and `search` behave as in [`find_all`](Self::find_all).
    #[instrument(skip(self, query))]
    pub async fn list(&self, query: ListQuery) -> ServiceResult<ListResult<Value>> {
        query
            .with_default_sort("name", false)
            .fetch::<InventoryItemEntity, _>(&*self.db_pool)
            .await
    }

    /// All items sorted by name, optionally narrowed by exact category and a name substring.
    pub async fn find_all(
        &self,
        category: Option<&str>,
        search: Option<&str>,
    ) -> ServiceResult<Vec<inventory_item::Model>> {
        let mut select = InventoryItemEntity::find();
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            select = select.filter(inventory_item::Column::Category.eq(category));
        }
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            select = select.filter(name_contains(term));
        }
        Ok(select
            .order_by_asc(inventory_item::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn find_one(&self, id: Uuid) -> ServiceResult<inventory_item::Model> {
        InventoryItemEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory item", id))
    }

    #[instrument(skip(self, request), fields(item_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateInventoryItemRequest,
    ) -> ServiceResult<InventoryItemView> {
        request.validate()?;
        let existing = self.find_one(id).await?;
        let version = existing.version;
        let mut item = existing.into_active_model();

        if let Some(name) = request.name {
            item.name = Set(name.trim().to_string());
        }
        if let Some(description) = request.description {
            item.description = Set(Some(description));
        }
        if let Some(category) = request.category {
            item.category = Set(category.trim().to_string());
        }
        if let Some(quantity) = request.quantity {
            item.quantity = Set(quantity);
            item.version = Set(version + 1);
        }
        if let Some(unit) = request.unit {
            item.unit = Set(unit);
        }
        if let Some(threshold) = request.reorder_threshold {
            item.reorder_threshold = Set(threshold);
        }
        item.last_updated = Set(Utc::now());

        let item = item.update(&*self.db_pool).await?;
        Ok(self.publish(item))
    }

    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let result = InventoryItemEntity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Inventory item", id));
        }
        info!(item_id = %id, "inventory item deleted");
        self.event_sender.notify(Event::InventoryUpdated {
            item_id: id,
            data: Value::Null,
        });
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn update_forecast(
        &self,
        id: Uuid,
        predicted_usage: i32,
    ) -> ServiceResult<inventory_item::Model> {
        let mut item = self.find_one(id).await?.into_active_model();
        item.forecast_predicted_usage = Set(Some(predicted_usage));
        item.forecast_date = Set(Some(Utc::now()));
        Ok(item.update(&*self.db_pool).await?)
    }

    /// Items strictly below their reorder threshold.
    pub async fn find_low_stock(&self) -> ServiceResult<Vec<inventory_item::Model>> {
        Ok(InventoryItemEntity::find()
            .filter(
                Expr::col(inventory_item::Column::Quantity)
                    .lt(Expr::col(inventory_item::Column::ReorderThreshold)),
            )
            .order_by_asc(inventory_item::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    /// Items whose expected remaining stock (quantity minus predicted usage, missing forecast
    /// counted as zero) is below the reorder threshold.
    pub async fn find_forecast_based_low_stock(&self) -> ServiceResult<Vec<inventory_item::Model>> {
        let remaining = Expr::col(inventory_item::Column::Quantity).sub(Func::coalesce([
            Expr::col(inventory_item::Column::ForecastPredictedUsage).into(),
            Expr::val(0).into(),
        ]));
        Ok(InventoryItemEntity::find()
            .filter(Expr::expr(remaining).lt(Expr::col(inventory_item::Column::ReorderThreshold)))
            .order_by_asc(inventory_item::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    /// First item (by name) whose name contains `term`, ignoring case.
    pub async fn search_by_name(&self, term: &str) -> ServiceResult<Option<inventory_item::Model>> {
        Ok(InventoryItemEntity::find()
            .filter(name_contains(term))
            .order_by_asc(inventory_item::Column::Name)
            .one(&*self.db_pool)
            .await?)
    }

    fn publish(&self, item: inventory_item::Model) -> InventoryItemView {
        let view = InventoryItemView::from(item);
        self.event_sender.notify(Event::InventoryUpdated {
            item_id: view.id,
            data: serde_json::to_value(&view).unwrap_or(Value::Null),
        });
        view
    }
}

fn name_contains(term: &str) -> sea_orm::sea_query::SimpleExpr {
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    Expr::expr(Func::lower(Expr::col((
        InventoryItemEntity,
        inventory_item::Column::Name,
    ))))
    .like(LikeExpr::new(pattern).escape('\\'))
}
