use crate::{
    db::{
        query_builder::{end_of_day, parse_date_param},
        FilterOp, ListQuery, ListResult,
    },
    entities::alert::{self, AlertStatus, AlertType, Entity as AlertEntity},
    errors::{ServiceError, ServiceResult},
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    error::SqlErr, sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub item_id: Uuid,
    pub item_name: String,
    pub message: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
}

#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AlertCount {
    pub count: u64,
}

/// Service for stock alerts
#[derive(Clone)]
pub struct AlertService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl AlertService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Raises an alert. While a `new` alert of the same type exists for the item, that row is
    /// refreshed (message and createdAt) instead of inserting another one.
    #[instrument(skip(self, request), fields(item_id = %request.item_id, alert_type = %request.alert_type))]
    pub async fn create(&self, request: CreateAlertRequest) -> ServiceResult<alert::Model> {
        if let Some(existing) = self.find_open(&request).await? {
            return self.refresh(existing, request).await;
        }

        let inserted = alert::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_id: Set(request.item_id),
            item_name: Set(request.item_name.clone()),
            message: Set(request.message.clone()),
            status: Set(AlertStatus::New),
            alert_type: Set(request.alert_type),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await;

        match inserted {
            Ok(created) => {
                info!(alert_id = %created.id, "alert created");
                self.event_sender.notify(Event::AlertCreated(created.clone()));
                Ok(created)
            }
            // A concurrent create won the open-alert unique index; fold into its row.
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                match self.find_open(&request).await? {
                    Some(existing) => self.refresh(existing, request).await,
                    None => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_open(&self, request: &CreateAlertRequest) -> ServiceResult<Option<alert::Model>> {
        Ok(AlertEntity::find()
            .filter(alert::Column::ItemId.eq(request.item_id))
            .filter(alert::Column::Status.eq(AlertStatus::New))
            .filter(alert::Column::AlertType.eq(request.alert_type))
            .one(&*self.db_pool)
            .await?)
    }

    async fn refresh(&self, existing: alert::Model, request: CreateAlertRequest) -> ServiceResult<alert::Model> {
        let mut active = existing.into_active_model();
        active.message = Set(request.message);
        active.item_name = Set(request.item_name);
        active.created_at = Set(Utc::now());
        let updated = active.update(&*self.db_pool).await?;
        debug!(alert_id = %updated.id, "refreshed open alert");
        Ok(updated)
    }

    /// Alerts newest first, optionally by status and creation window.
    pub async fn list(&self, filter: AlertFilter, query: ListQuery) -> ServiceResult<ListResult<Value>> {
        let mut query = query.with_default_sort("createdAt", true);
        if let Some(status) = filter.status {
            query = query.with_and("status", FilterOp::Eq, status.to_string());
        }
        if let Some(start) = filter.start_date.as_deref() {
            let start = parse_date_param(start, "startDate")?;
            query = query.with_and("createdAt", FilterOp::Gte, start.to_rfc3339());
        }
        if let Some(end) = filter.end_date.as_deref() {
            let end = end_of_day(parse_date_param(end, "endDate")?);
            query = query.with_and("createdAt", FilterOp::Lte, end.to_rfc3339());
        }
        query.fetch::<AlertEntity, _>(&*self.db_pool).await
    }

    pub async fn find_one(&self, id: Uuid) -> ServiceResult<alert::Model> {
        AlertEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Alert", id))
    }

    #[instrument(skip(self), fields(alert_id = %id))]
    pub async fn dismiss(&self, id: Uuid) -> ServiceResult<alert::Model> {
        let alert = self.find_one(id).await?;
        if alert.status == AlertStatus::Dismissed {
            return Ok(alert);
        }
        let mut active = alert.into_active_model();
        active.status = Set(AlertStatus::Dismissed);
        Ok(active.update(&*self.db_pool).await?)
    }

    /// Dismisses every open alert of an item; returns how many changed.
    pub async fn dismiss_all_for_item(&self, item_id: Uuid) -> ServiceResult<u64> {
        let result = AlertEntity::update_many()
            .col_expr(alert::Column::Status, Expr::value(AlertStatus::Dismissed))
            .col_expr(alert::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(alert::Column::ItemId.eq(item_id))
            .filter(alert::Column::Status.eq(AlertStatus::New))
            .exec(&*self.db_pool)
            .await?;
        Ok(result.rows_affected)
    }

    /// Number of alerts still `new`.
    pub async fn active_count(&self) -> ServiceResult<u64> {
        Ok(AlertEntity::find()
            .filter(alert::Column::Status.eq(AlertStatus::New))
            .count(&*self.db_pool)
            .await?)
    }
}
