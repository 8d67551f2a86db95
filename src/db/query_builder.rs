//! Query-string driven filtering, sorting, projection and pagination for list endpoints.
//!
//! A [`ListQuery`] is parsed once from the raw query parameters and never mutated afterwards;
//! each refinement returns a new value. Compilation against an entity happens through its
//! [`FilterSchema`], which declares the API field names a caller may filter and sort on.

use crate::errors::{ServiceError, ServiceResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Value,
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

/// Keys that never become filter predicates.
pub const RESERVED_KEYS: [&str; 6] = ["page", "sort", "limit", "fields", "search", "operations"];

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Offsets and limits are bound as signed 64-bit integers.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Field every entity sorts on when the caller gives no usable sort.
pub const CREATED_AT: &str = "createdAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive substring match
    Regex,
    /// Case-insensitive prefix match
    Prefix,
}

impl FromStr for FilterOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(FilterOp::Eq),
            "ne" => Ok(FilterOp::Ne),
            "gt" => Ok(FilterOp::Gt),
            "gte" => Ok(FilterOp::Gte),
            "lt" => Ok(FilterOp::Lt),
            "lte" => Ok(FilterOp::Lte),
            "regex" => Ok(FilterOp::Regex),
            "regex^" => Ok(FilterOp::Prefix),
            _ => Err(()),
        }
    }
}

/// How a query-string value is cast before it reaches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    /// String-backed enumeration stored as text
    Enum,
    /// Record identifier; string values are converted to UUIDs
    Id,
}

/// A filterable field: public name, backing column and value kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec<C> {
    pub name: &'static str,
    pub column: C,
    pub kind: FieldKind,
}

impl<C> FieldSpec<C> {
    pub const fn new(name: &'static str, column: C, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }
}

/// Declares which fields of an entity are visible to list queries.
pub trait FilterSchema: EntityTrait {
    /// JSON representation returned by list endpoints
    type View: From<Self::Model> + Serialize;

    fn fields() -> Vec<FieldSpec<Self::Column>>;

    /// Columns matched by the free-text `search` parameter
    fn search_columns() -> Vec<Self::Column> {
        Vec::new()
    }

    /// Fields stripped from results unless explicitly projected
    fn hidden_fields() -> &'static [&'static str] {
        &["version"]
    }

    fn field(name: &str) -> Option<FieldSpec<Self::Column>> {
        Self::fields().into_iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Rows before this page, saturating at the largest offset SQL accepts.
    pub fn skip(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(MAX_OFFSET)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

/// Parsed list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub(crate) filters: Vec<Predicate>,
    pub(crate) any_of: Vec<Predicate>,
    pub(crate) sort: Vec<SortKey>,
    pub(crate) fields: Option<Vec<String>>,
    pub(crate) search: Option<String>,
    pub(crate) window: Option<PageWindow>,
}

impl ListQuery {
    /// Parses raw query-string pairs. Keys are processed in sorted order.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params: BTreeMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut query = ListQuery::default();

        for (key, value) in &params {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(inner) = key
                .strip_prefix("or[")
                .and_then(|rest| rest.strip_suffix(']'))
            {
                query.any_of.push(parse_or_key(inner, value));
            } else {
                query.filters.push(parse_and_key(key, value));
            }
        }

        query.sort = params
            .get("sort")
            .map(|raw| parse_sort(raw))
            .unwrap_or_default();

        query.fields = params.get("fields").and_then(|raw| {
            let fields: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
            (!fields.is_empty()).then_some(fields)
        });

        query.search = params
            .get("search")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let page = params.get("page").filter(|v| !v.trim().is_empty());
        let limit = params.get("limit").filter(|v| !v.trim().is_empty());
        if page.is_some() || limit.is_some() {
            query.window = Some(PageWindow {
                page: positive_or(page, DEFAULT_PAGE),
                limit: positive_or(limit, DEFAULT_LIMIT),
            });
        }

        query
    }

    /// Adds an AND-ed predicate.
    pub fn with_and(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        self.filters.push(Predicate::new(field, op, value));
        self
    }

    /// Replaces the sort keys with a single key.
    pub fn with_sort(mut self, field: &str, descending: bool) -> Self {
        self.sort = vec![SortKey {
            field: field.to_string(),
            descending,
        }];
        self
    }

    /// Uses `sort` only when the caller supplied no sort of their own.
    pub fn with_default_sort(mut self, field: &str, descending: bool) -> Self {
        if self.sort.is_empty() {
            self.sort = vec![SortKey {
                field: field.to_string(),
                descending,
            }];
        }
        self
    }

    pub fn with_window(mut self, page: u64, limit: u64) -> Self {
        self.window = Some(PageWindow {
            page: page.max(1),
            limit: limit.max(1),
        });
        self
    }

    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    pub fn any_of(&self) -> &[Predicate] {
        &self.any_of
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn window(&self) -> Option<PageWindow> {
        self.window
    }

    pub fn projection(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    /// Builds the WHERE condition for entity `E`.
    pub fn condition<E: FilterSchema>(&self) -> ServiceResult<Condition> {
        compile_condition::<E>(&self.filters, &self.any_of, self.search.as_deref())
    }

    /// Resolves sort keys against `E`; unknown fields are dropped, `createdAt desc` is the fallback.
    pub fn order_columns<E: FilterSchema>(&self) -> Vec<(E::Column, Order)> {
        resolve_sort::<E>(&self.sort)
    }

    /// Runs the query as a find plus a count over the same filter.
    pub async fn fetch<E, C>(&self, db: &C) -> ServiceResult<ListResult<JsonValue>>
    where
        E: FilterSchema,
        E::Model: Sync,
        C: ConnectionTrait,
    {
        let condition = self.condition::<E>()?;

        let mut select = E::find().filter(condition.clone());
        for (column, order) in self.order_columns::<E>() {
            select = select.order_by(column, order);
        }
        if let Some(window) = self.window {
            select = select.offset(window.skip()).limit(window.limit);
        }

        let models = select.all(db).await?;
        let total = E::find().filter(condition).count(db).await?;

        let results = models
            .into_iter()
            .map(|model| project::<E>(model, self.fields.as_deref()))
            .collect::<ServiceResult<Vec<_>>>()?;

        Ok(ListResult::new(results, total, self.window))
    }
}

fn positive_or(raw: Option<&String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(|v| v as u64)
        .unwrap_or(default)
}

fn parse_or_key(inner: &str, value: &str) -> Predicate {
    match inner.split_once("][") {
        Some((field, op)) => {
            let op = op.parse().unwrap_or(FilterOp::Eq);
            Predicate::new(field, op, value)
        }
        None => Predicate::new(inner, FilterOp::Eq, value),
    }
}

fn parse_and_key(key: &str, value: &str) -> Predicate {
    if let Some((field, rest)) = key.split_once('[') {
        if let Some(op) = rest.strip_suffix(']').and_then(|op| op.parse().ok()) {
            return Predicate::new(field, op, value);
        }
    }
    Predicate::new(key, FilterOp::Eq, value)
}

fn parse_sort(raw: &str) -> Vec<SortKey> {
    raw.split(',')
        .filter_map(|token| {
            let token = token.trim();
            let (field, order) = match token.split_once(':') {
                Some((field, order)) => (field.trim(), order.trim()),
                None => (token, ""),
            };
            if field.is_empty() {
                return None;
            }
            Some(SortKey {
                field: field.to_string(),
                descending: order == "desc",
            })
        })
        .collect()
}

pub(crate) fn resolve_sort<E: FilterSchema>(keys: &[SortKey]) -> Vec<(E::Column, Order)> {
    let resolved: Vec<_> = keys
        .iter()
        .filter_map(|key| {
            E::field(&key.field).map(|spec| {
                let order = if key.descending { Order::Desc } else { Order::Asc };
                (spec.column, order)
            })
        })
        .collect();

    if !resolved.is_empty() {
        return resolved;
    }
    E::field(CREATED_AT)
        .map(|spec| vec![(spec.column, Order::Desc)])
        .unwrap_or_default()
}

pub(crate) fn compile_condition<E: FilterSchema>(
    filters: &[Predicate],
    any_of: &[Predicate],
    search: Option<&str>,
) -> ServiceResult<Condition> {
    let mut condition = Condition::all();
    for predicate in filters {
        condition = condition.add(predicate_condition::<E>(predicate)?);
    }

    if !any_of.is_empty() {
        let mut group = Condition::any();
        for predicate in any_of {
            group = group.add(predicate_condition::<E>(predicate)?);
        }
        condition = condition.add(group);
    }

    if let Some(term) = search {
        let columns = E::search_columns();
        if !columns.is_empty() {
            let mut group = Condition::any();
            for column in columns {
                group = group.add(ilike(column, &format!("%{}%", escape_like(term))));
            }
            condition = condition.add(group);
        }
    }

    Ok(condition)
}

fn predicate_condition<E: FilterSchema>(predicate: &Predicate) -> ServiceResult<Condition> {
    let Some(spec) = E::field(&predicate.field) else {
        // Unknown field names match nothing.
        return Ok(Condition::all().add(Expr::val(1).eq(0)));
    };

    let column = spec.column;
    let pattern = |wrap: fn(String) -> String| -> ServiceResult<Condition> {
        if !matches!(spec.kind, FieldKind::Text | FieldKind::Enum) {
            return Err(ServiceError::ValidationError(format!(
                "Pattern operators are only supported on text fields, not '{}'",
                spec.name
            )));
        }
        Ok(Condition::all().add(ilike(column, &wrap(escape_like(&predicate.value)))))
    };
    let value = || cast_value(spec.name, spec.kind, &predicate.value);

    let condition = match predicate.op {
        FilterOp::Regex => pattern(|term| format!("%{term}%"))?,
        FilterOp::Prefix => pattern(|term| format!("{term}%"))?,
        FilterOp::Eq => Condition::all().add(column.eq(value()?)),
        // Rows without a value are "not equal" too.
        FilterOp::Ne => Condition::any().add(column.ne(value()?)).add(column.is_null()),
        FilterOp::Gt => Condition::all().add(column.gt(value()?)),
        FilterOp::Gte => Condition::all().add(column.gte(value()?)),
        FilterOp::Lt => Condition::all().add(column.lt(value()?)),
        FilterOp::Lte => Condition::all().add(column.lte(value()?)),
    };
    Ok(condition)
}

fn ilike<C: ColumnTrait>(column: C, pattern: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col((column.entity_name(), column))))
        .like(LikeExpr::new(pattern.to_lowercase()).escape('\\'))
}

/// Escapes LIKE wildcards so the term matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Casts a raw query-string value according to the field kind.
pub(crate) fn cast_value(field: &str, kind: FieldKind, raw: &str) -> ServiceResult<Value> {
    let invalid = |expected: &str| {
        ServiceError::ValidationError(format!(
            "Invalid value \"{raw}\" for {field}: expected {expected}"
        ))
    };
    let trimmed = raw.trim();
    let value = match kind {
        FieldKind::Text | FieldKind::Enum => Value::from(raw.to_string()),
        FieldKind::Integer => Value::from(trimmed.parse::<i64>().map_err(|_| invalid("an integer"))?),
        FieldKind::Float => Value::from(trimmed.parse::<f64>().map_err(|_| invalid("a number"))?),
        FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" => Value::from(true),
            "false" | "0" => Value::from(false),
            _ => return Err(invalid("true or false")),
        },
        FieldKind::Timestamp => Value::from(parse_timestamp(trimmed).ok_or_else(|| invalid("a date"))?),
        FieldKind::Id => Value::from(Uuid::parse_str(trimmed).map_err(|_| invalid("an id"))?),
    };
    Ok(value)
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses a date query parameter; a bad value is a validation error naming `field`.
pub fn parse_date_param(raw: &str, field: &str) -> ServiceResult<DateTime<Utc>> {
    parse_timestamp(raw.trim())
        .ok_or_else(|| ServiceError::ValidationError(format!("Invalid value \"{raw}\" for {field}")))
}

/// Last millisecond of the UTC day containing `ts`; inclusive `endDate` bounds use it.
pub fn end_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .map(|naive| naive.and_utc())
        .unwrap_or(ts)
}

/// Serializes a model through its view and applies the projection.
pub(crate) fn project<E: FilterSchema>(
    model: E::Model,
    fields: Option<&[String]>,
) -> ServiceResult<JsonValue> {
    let value = serde_json::to_value(E::View::from(model))
        .map_err(|e| ServiceError::InternalError(format!("Failed to serialize record: {e}")))?;
    Ok(apply_projection(value, fields, E::hidden_fields()))
}

pub(crate) fn apply_projection(
    value: JsonValue,
    fields: Option<&[String]>,
    hidden: &[&str],
) -> JsonValue {
    let JsonValue::Object(mut map) = value else {
        return value;
    };
    match fields {
        Some(fields) => {
            map.retain(|key, _| key == "id" || fields.iter().any(|f| f == key));
        }
        None => {
            for key in hidden {
                map.remove(*key);
            }
        }
    }
    JsonValue::Object(map)
}

/// Result envelope of list endpoints. Pagination metadata appears only when paging was requested.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub results: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    pub total_results: u64,
}

impl<T> ListResult<T> {
    pub fn new(results: Vec<T>, total_results: u64, window: Option<PageWindow>) -> Self {
        Self {
            results,
            page: window.map(|w| w.page),
            limit: window.map(|w| w.limit),
            total_pages: window.map(|w| w.total_pages(total_results)),
            total_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn q(pairs: &[(&str, &str)]) -> ListQuery {
        ListQuery::from_params(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn reserved_keys_are_not_filters() {
        let query = q(&[
            ("page", "2"),
            ("sort", "name"),
            ("limit", "5"),
            ("fields", "name"),
            ("search", "bolt"),
            ("operations", "x"),
        ]);
        assert!(query.filters().is_empty());
        assert!(query.any_of().is_empty());
    }

    #[rstest]
    #[case("quantity[gte]", FilterOp::Gte, "quantity")]
    #[case("quantity[gt]", FilterOp::Gt, "quantity")]
    #[case("quantity[lte]", FilterOp::Lte, "quantity")]
    #[case("quantity[lt]", FilterOp::Lt, "quantity")]
    #[case("unit[eq]", FilterOp::Eq, "unit")]
    #[case("unit[ne]", FilterOp::Ne, "unit")]
    #[case("name[regex]", FilterOp::Regex, "name")]
    #[case("name[regex^]", FilterOp::Prefix, "name")]
    #[case("name", FilterOp::Eq, "name")]
    #[case("name[like]", FilterOp::Eq, "name[like]")]
    fn operator_keys_parse(#[case] key: &str, #[case] op: FilterOp, #[case] field: &str) {
        let query = q(&[(key, "v")]);
        assert_eq!(query.filters(), &[Predicate::new(field, op, "v")]);
    }

    #[test]
    fn or_groups_collect_separately() {
        let query = q(&[
            ("or[name][regex]", "drill"),
            ("or[category]", "Tools"),
            ("unit", "pcs"),
        ]);
        assert_eq!(
            query.any_of(),
            &[
                Predicate::new("category", FilterOp::Eq, "Tools"),
                Predicate::new("name", FilterOp::Regex, "drill"),
            ]
        );
        assert_eq!(query.filters(), &[Predicate::new("unit", FilterOp::Eq, "pcs")]);
    }

    #[test]
    fn sort_tokens_default_to_ascending_and_skip_blanks() {
        let query = q(&[("sort", "name:desc, quantity ,,:asc,createdAt:sideways")]);
        assert_eq!(
            query.sort_keys(),
            &[
                SortKey { field: "name".into(), descending: true },
                SortKey { field: "quantity".into(), descending: false },
                SortKey { field: "createdAt".into(), descending: false },
            ]
        );
    }

    #[test]
    fn pagination_only_when_requested() {
        assert_eq!(q(&[]).window(), None);
        assert_eq!(q(&[("page", "")]).window(), None);
        assert_eq!(
            q(&[("limit", "25")]).window(),
            Some(PageWindow { page: 1, limit: 25 })
        );
        assert_eq!(
            q(&[("page", "3")]).window(),
            Some(PageWindow { page: 3, limit: 10 })
        );
        assert_eq!(
            q(&[("page", "abc"), ("limit", "-4")]).window(),
            Some(PageWindow { page: 1, limit: 10 })
        );
    }

    #[test]
    fn fields_projection_keeps_id() {
        let value = serde_json::json!({"id": "1", "name": "Drill", "quantity": 3, "version": 2});
        let projected = apply_projection(value.clone(), Some(&["name".to_string()]), &["version"]);
        assert_eq!(projected, serde_json::json!({"id": "1", "name": "Drill"}));

        let default = apply_projection(value, None, &["version"]);
        assert_eq!(
            default,
            serde_json::json!({"id": "1", "name": "Drill", "quantity": 3})
        );
    }

    #[test]
    fn builder_steps_return_new_values() {
        let base = q(&[("unit", "kg")]);
        let refined = base.clone().with_and("quantity", FilterOp::Gt, "0");
        assert_eq!(base.filters().len(), 1);
        assert_eq!(refined.filters().len(), 2);

        let sorted = refined.clone().with_default_sort("name", false);
        assert_eq!(sorted.sort_keys()[0].field, "name");
        let caller_sorted = q(&[("sort", "quantity:desc")]).with_default_sort("name", false);
        assert_eq!(caller_sorted.sort_keys()[0].field, "quantity");
    }

    #[test]
    fn like_escaping_neutralises_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[rstest]
    #[case(FieldKind::Integer, "12", true)]
    #[case(FieldKind::Integer, "twelve", false)]
    #[case(FieldKind::Float, "2.5", true)]
    #[case(FieldKind::Boolean, "TRUE", true)]
    #[case(FieldKind::Boolean, "yes", false)]
    #[case(FieldKind::Timestamp, "2024-03-01", true)]
    #[case(FieldKind::Timestamp, "2024-03-01T10:00:00Z", true)]
    #[case(FieldKind::Timestamp, "March 1st", false)]
    #[case(FieldKind::Id, "67c8bfe0-1b2c-4a5b-9d5e-2f6a7b8c9d0e", true)]
    #[case(FieldKind::Id, "65f1a2b3c4d5e6f7a8b9c0d1", false)]
    fn values_cast_by_kind(#[case] kind: FieldKind, #[case] raw: &str, #[case] ok: bool) {
        assert_eq!(cast_value("f", kind, raw).is_ok(), ok);
    }

    #[rstest]
    #[case("1", "10", 0)]
    #[case("3", "25", 50)]
    #[case("9223372036854775807", "10", MAX_OFFSET)]
    #[case("9223372036854775807", "9223372036854775807", MAX_OFFSET)]
    #[case("2", "9223372036854775807", MAX_OFFSET)]
    fn huge_pages_saturate_the_offset(#[case] page: &str, #[case] limit: &str, #[case] skip: u64) {
        let window = q(&[("page", page), ("limit", limit)]).window().unwrap();
        assert_eq!(window.skip(), skip);
        assert_eq!(window.total_pages(0), 0);
    }

    #[test]
    fn end_date_covers_the_whole_day() {
        let end = end_of_day(parse_date_param("2024-03-05", "endDate").unwrap());
        assert_eq!(end.to_rfc3339(), "2024-03-05T23:59:59.999+00:00");
        assert!(parse_date_param("yesterday", "endDate").is_err());
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let result: ListResult<u8> = ListResult::new(vec![], 0, Some(PageWindow { page: 1, limit: 10 }));
        assert_eq!(result.total_pages, Some(0));
        let json = serde_json::to_value(ListResult::<u8>::new(vec![], 4, None)).unwrap();
        assert_eq!(json, serde_json::json!({"results": [], "totalResults": 4}));
    }

    proptest! {
        #[test]
        fn window_arithmetic(page in 1u64..10_000, limit in 1u64..500, total in 0u64..1_000_000) {
            let window = PageWindow { page, limit };
            prop_assert_eq!(window.skip(), (page - 1) * limit);
            let pages = window.total_pages(total);
            prop_assert_eq!(pages, (total as f64 / limit as f64).ceil() as u64);
            prop_assert!(pages * limit >= total);
        }
    }
}
