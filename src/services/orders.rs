use crate::{
    db::{
        query_builder::{end_of_day, parse_date_param},
        transaction::with_transaction,
        FilterOp, ListQuery, ListResult, Pipeline,
    },
    entities::{
        inventory_item::{self, Entity as InventoryItemEntity},
        order::{self, Entity as OrderEntity, OrderStatus, OrderType},
        order_item::{self, Entity as OrderItemEntity, OrderLine},
        user::{self, Entity as UserEntity},
    },
    errors::{FieldError, ServiceError, ServiceResult},
    events::{Event, EventSender},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub item_id: Uuid,
    #[schema(example = 2, minimum = 1)]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub items: Vec<OrderLineRequest>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    fn check_lines(&self) -> ServiceResult<()> {
        let mut errors = Vec::new();
        if self.items.is_empty() {
            errors.push(FieldError::new("items", "must contain at least one item"));
        }
        for (i, line) in self.items.iter().enumerate() {
            if line.quantity < 1 {
                errors.push(FieldError::new(
                    format!("items[{i}].quantity"),
                    "must be greater than or equal to 1",
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::InvalidFields(errors))
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Convenience filters accepted by the order listing on top of the generic query keys.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub order_type: Option<OrderType>,
    pub status: Option<OrderStatus>,
    pub user_id: Option<Uuid>,
    pub start_date: Option<String>,
    /// Inclusive through 23:59:59.999 of that day.
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderCreator {
    pub id: Uuid,
    pub name: String,
    pub username: String,
}

impl From<user::Model> for OrderCreator {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            username: u.username,
        }
    }
}

/// Order as returned by the API, with its line snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub items: Vec<OrderLine>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<OrderCreator>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    fn assemble(order: order::Model, items: Vec<OrderLine>, creator: Option<OrderCreator>) -> Self {
        Self {
            id: order.id,
            order_type: order.order_type,
            status: order.status,
            items,
            notes: order.notes,
            created_by: order.created_by,
            creator,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub total_usage: i64,
}

/// Service for stock orders
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

fn aborted(err: DbErr) -> ServiceError {
    error!(error = %err, "storage failure inside order transaction");
    ServiceError::TransactionAborted(err.to_string())
}

/// Applies one line's stock effect inside `txn` and returns the updated item.
async fn apply_line(
    txn: &DatabaseTransaction,
    order_type: OrderType,
    line: &OrderLineRequest,
) -> ServiceResult<inventory_item::Model> {
    let item = InventoryItemEntity::find_by_id(line.item_id)
        .one(txn)
        .await
        .map_err(aborted)?
        .ok_or_else(|| ServiceError::not_found("Inventory item", line.item_id))?;

    let insufficient = |available: i32| {
        ServiceError::InsufficientStock(format!(
            "Not enough stock for {}. Available: {}, Requested: {}",
            item.name, available, line.quantity
        ))
    };

    let mut update = InventoryItemEntity::update_many()
        .col_expr(
            inventory_item::Column::Version,
            Expr::col(inventory_item::Column::Version).add(1),
        )
        .col_expr(inventory_item::Column::LastUpdated, Expr::value(Utc::now()))
        .col_expr(inventory_item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(inventory_item::Column::Id.eq(item.id));

    update = match order_type {
        OrderType::Outgoing => {
            if line.quantity > item.quantity {
                return Err(insufficient(item.quantity));
            }
            update
                .col_expr(
                    inventory_item::Column::Quantity,
                    Expr::col(inventory_item::Column::Quantity).sub(line.quantity),
                )
                .filter(inventory_item::Column::Quantity.gte(line.quantity))
        }
        OrderType::Incoming => update.col_expr(
            inventory_item::Column::Quantity,
            Expr::col(inventory_item::Column::Quantity).add(line.quantity),
        ),
    };

    let result = update.exec(txn).await.map_err(aborted)?;
    if result.rows_affected == 0 {
        // Another order consumed the stock between the read and the guarded update.
        let current = InventoryItemEntity::find_by_id(item.id)
            .one(txn)
            .await
            .map_err(aborted)?
            .map(|m| m.quantity)
            .unwrap_or(0);
        return Err(insufficient(current));
    }

    InventoryItemEntity::find_by_id(item.id)
        .one(txn)
        .await
        .map_err(aborted)?
        .ok_or_else(|| ServiceError::not_found("Inventory item", item.id))
}

impl OrderService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a completed order and applies its stock effect atomically.
    #[instrument(skip(self, request), fields(order_type = %request.order_type, lines = request.items.len()))]
    pub async fn create(
        &self,
        request: CreateOrderRequest,
        created_by: Option<Uuid>,
    ) -> ServiceResult<OrderView> {
        request.validate()?;
        request.check_lines()?;

        let CreateOrderRequest {
            order_type,
            items,
            notes,
        } = request;

        let (order, lines, touched) = with_transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let now = Utc::now();
                let mut lines = Vec::with_capacity(items.len());
                let mut touched = Vec::with_capacity(items.len());

                for line in &items {
                    let item = apply_line(txn, order_type, line).await?;
                    lines.push(OrderLine {
                        item_id: item.id,
                        name: item.name.clone(),
                        quantity: line.quantity,
                        unit: item.unit,
                    });
                    touched.push(item);
                }

                let order = order::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_type: Set(order_type),
                    status: Set(OrderStatus::Completed),
                    notes: Set(notes),
                    created_by: Set(created_by),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await
                .map_err(aborted)?;

                for (position, line) in lines.iter().enumerate() {
                    order_item::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        order_id: Set(order.id),
                        item_id: Set(line.item_id),
                        name: Set(line.name.clone()),
                        quantity: Set(line.quantity),
                        unit: Set(line.unit),
                        position: Set(position as i32),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(aborted)?;
                }

                Ok((order, lines, touched))
            })
        })
        .await?;

        info!(order_id = %order.id, "order created");

        let view = OrderView::assemble(order, lines, None);
        self.event_sender
            .notify(Event::OrderCreated(serde_json::to_value(&view).unwrap_or(Value::Null)));
        for item in touched {
            let item_id = item.id;
            let data = serde_json::to_value(inventory_item::InventoryItemView::from(item))
                .unwrap_or(Value::Null);
            self.event_sender
                .notify(Event::InventoryUpdated { item_id, data });
        }
        Ok(view)
    }

    /// Lists orders newest first; each result carries its `items` and `creator`.
    #[instrument(skip(self, query))]
    pub async fn list(
        &self,
        filter: OrderFilter,
        query: ListQuery,
    ) -> ServiceResult<ListResult<Value>> {
        let mut query = query.with_default_sort("createdAt", true);
        if let Some(order_type) = filter.order_type {
            query = query.with_and("type", FilterOp::Eq, order_type.to_string());
        }
        if let Some(status) = filter.status {
            query = query.with_and("status", FilterOp::Eq, status.to_string());
        }
        if let Some(user_id) = filter.user_id {
            query = query.with_and("createdBy", FilterOp::Eq, user_id.to_string());
        }
        if let Some(start) = filter.start_date.as_deref() {
            let start = parse_date_param(start, "startDate")?;
            query = query.with_and("createdAt", FilterOp::Gte, start.to_rfc3339());
        }
        if let Some(end) = filter.end_date.as_deref() {
            let end = end_of_day(parse_date_param(end, "endDate")?);
            query = query.with_and("createdAt", FilterOp::Lte, end.to_rfc3339());
        }

        let mut list = Pipeline::from_query(&query)
            .execute::<OrderEntity, _>(&*self.db_pool)
            .await?;
        self.attach_details(&mut list.results).await?;
        Ok(list)
    }

    /// Completed orders, newest first.
    pub async fn history(&self, query: ListQuery) -> ServiceResult<ListResult<Value>> {
        let filter = OrderFilter {
            status: Some(OrderStatus::Completed),
            ..Default::default()
        };
        self.list(filter, query).await
    }

    pub async fn find_model(&self, id: Uuid) -> ServiceResult<order::Model> {
        OrderEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))
    }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn find_one(&self, id: Uuid) -> ServiceResult<OrderView> {
        let order = self.find_model(id).await?;
        self.view(order).await
    }

    #[instrument(skip(self, request), fields(order_id = %id))]
    pub async fn update(&self, id: Uuid, request: UpdateOrderRequest) -> ServiceResult<OrderView> {
        request.validate()?;
        let order = self.find_model(id).await?;
        let current = order.status;
        let mut active = order.into_active_model();

        if let Some(next) = request.status.filter(|next| *next != current) {
            if !current.can_transition_to(next) {
                return Err(ServiceError::BadRequest(format!(
                    "Cannot change order status from {current} to {next}"
                )));
            }
            active.status = Set(next);
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }

        let order = active.update(&*self.db_pool).await?;
        info!(order_id = %order.id, status = %order.status, "order updated");
        self.view(order).await
    }

    pub async fn cancel(&self, id: Uuid) -> ServiceResult<OrderView> {
        self.update(
            id,
            UpdateOrderRequest {
                status: Some(OrderStatus::Cancelled),
                notes: None,
            },
        )
        .await
    }

    /// Daily totals of `item_id` consumed by completed outgoing orders in `[start, end]`.
    #[instrument(skip(self))]
    pub async fn historical_usage(
        &self,
        item_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Vec<DailyUsage>> {
        let rows = OrderItemEntity::find()
            .find_also_related(OrderEntity)
            .filter(order_item::Column::ItemId.eq(item_id))
            .filter(order::Column::OrderType.eq(OrderType::Outgoing))
            .filter(order::Column::Status.eq(OrderStatus::Completed))
            .filter(order::Column::CreatedAt.gte(start))
            .filter(order::Column::CreatedAt.lte(end))
            .all(&*self.db_pool)
            .await?;

        let mut per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for (line, order) in rows {
            if let Some(order) = order {
                *per_day.entry(order.created_at.date_naive()).or_default() += i64::from(line.quantity);
            }
        }

        Ok(per_day
            .into_iter()
            .map(|(date, total_usage)| DailyUsage { date, total_usage })
            .collect())
    }

    /// Most recent orders of any status, for summaries.
    pub async fn recent(&self, limit: u64) -> ServiceResult<Vec<OrderView>> {
        let query = ListQuery::default()
            .with_sort("createdAt", true)
            .with_window(1, limit);
        let list = self.list(OrderFilter::default(), query).await?;
        list.results
            .into_iter()
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| ServiceError::InternalError(format!("Failed to read order: {e}")))
            })
            .collect()
    }

    async fn view(&self, order: order::Model) -> ServiceResult<OrderView> {
        let lines = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::Position)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(OrderLine::from)
            .collect();
        let creator = match order.created_by {
            Some(user_id) => UserEntity::find_by_id(user_id)
                .one(&*self.db_pool)
                .await?
                .map(OrderCreator::from),
            None => None,
        };
        Ok(OrderView::assemble(order, lines, creator))
    }

    async fn attach_details(&self, results: &mut [Value]) -> ServiceResult<()> {
        let order_ids: Vec<Uuid> = results.iter().filter_map(|r| json_uuid(r, "id")).collect();
        if order_ids.is_empty() {
            return Ok(());
        }

        let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for line in OrderItemEntity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids.clone()))
            .order_by_asc(order_item::Column::Position)
            .all(&*self.db_pool)
            .await?
        {
            lines.entry(line.order_id).or_default().push(line.into());
        }

        let order_owners: HashMap<Uuid, Uuid> = OrderEntity::find()
            .filter(order::Column::Id.is_in(order_ids))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .filter_map(|o| o.created_by.map(|u| (o.id, u)))
            .collect();
        let creators: HashMap<Uuid, OrderCreator> = UserEntity::find()
            .filter(user::Column::Id.is_in(order_owners.values().copied().collect::<Vec<_>>()))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|u| (u.id, OrderCreator::from(u)))
            .collect();

        for result in results.iter_mut() {
            let Some(id) = json_uuid(result, "id") else {
                continue;
            };
            if let Value::Object(map) = result {
                let items = lines.remove(&id).unwrap_or_default();
                map.insert(
                    "items".into(),
                    serde_json::to_value(items).unwrap_or(Value::Array(Vec::new())),
                );
                if let Some(creator) = order_owners.get(&id).and_then(|u| creators.get(u)) {
                    map.insert(
                        "creator".into(),
                        serde_json::to_value(creator).unwrap_or(Value::Null),
                    );
                }
            }
        }
        Ok(())
    }
}

fn json_uuid(value: &Value, key: &str) -> Option<Uuid> {
    value.get(key)?.as_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn invalid_dates_are_validation_errors() {
        assert_matches!(
            parse_date_param("yesterday", "startDate"),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn empty_and_zero_quantity_lines_are_rejected() {
        let empty = CreateOrderRequest {
            order_type: OrderType::Outgoing,
            items: vec![],
            notes: None,
        };
        assert_matches!(empty.check_lines(), Err(ServiceError::InvalidFields(f)) if f[0].field == "items");

        let zero = CreateOrderRequest {
            order_type: OrderType::Incoming,
            items: vec![OrderLineRequest {
                item_id: Uuid::new_v4(),
                quantity: 0,
            }],
            notes: None,
        };
        assert_matches!(
            zero.check_lines(),
            Err(ServiceError::InvalidFields(f)) if f[0].field == "items[0].quantity"
        );
    }
}
