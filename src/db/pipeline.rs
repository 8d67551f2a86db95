//! Stage-based rendition of a [`ListQuery`].
//!
//! The stages are built in a fixed order (`Match`, `Sort`, `Project`, `Skip`, `Limit`) and
//! interpreted onto a single sea-orm select. The count pipeline reuses the same stages minus
//! the window and ends in `Count`, so totals always reflect the filtered, unpaginated set.

use super::query_builder::{
    apply_projection, compile_condition, resolve_sort, FilterSchema, ListQuery, ListResult,
    PageWindow, Predicate, SortKey,
};
use crate::errors::ServiceResult;
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Match {
        all: Vec<Predicate>,
        any: Vec<Predicate>,
        search: Option<String>,
    },
    Sort(Vec<SortKey>),
    Project(Option<Vec<String>>),
    Skip(u64),
    Limit(u64),
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
    window: Option<PageWindow>,
}

enum Outcome {
    Rows(Vec<JsonValue>),
    Count(u64),
}

impl Pipeline {
    pub fn from_query(query: &ListQuery) -> Self {
        let mut stages = vec![
            Stage::Match {
                all: query.filters.clone(),
                any: query.any_of.clone(),
                search: query.search.clone(),
            },
            Stage::Sort(query.sort.clone()),
            Stage::Project(query.fields.clone()),
        ];
        if let Some(window) = query.window {
            stages.push(Stage::Skip(window.skip()));
            stages.push(Stage::Limit(window.limit));
        }
        Self {
            stages,
            window: query.window,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Same pipeline without the page window, terminated by `Count`.
    pub fn count_pipeline(&self) -> Pipeline {
        let mut stages: Vec<Stage> = self
            .stages
            .iter()
            .filter(|stage| !matches!(stage, Stage::Skip(_) | Stage::Limit(_)))
            .cloned()
            .collect();
        stages.push(Stage::Count);
        Pipeline {
            stages,
            window: None,
        }
    }

    /// Runs the page and count pipelines and assembles the list envelope.
    pub async fn execute<E, C>(&self, db: &C) -> ServiceResult<ListResult<JsonValue>>
    where
        E: FilterSchema,
        E::Model: Sync,
        C: ConnectionTrait,
    {
        let results = match run::<E, C>(&self.stages, db).await? {
            Outcome::Rows(rows) => rows,
            Outcome::Count(_) => Vec::new(),
        };
        let total = match run::<E, C>(&self.count_pipeline().stages, db).await? {
            Outcome::Count(total) => total,
            Outcome::Rows(rows) => rows.len() as u64,
        };

        let mut list = ListResult::new(results, total, self.window);
        if let Some(pages) = list.total_pages.as_mut() {
            *pages = (*pages).max(1);
        }
        Ok(list)
    }
}

async fn run<E, C>(stages: &[Stage], db: &C) -> ServiceResult<Outcome>
where
    E: FilterSchema,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let mut select = E::find();
    let mut projection: Option<Vec<String>> = None;

    for stage in stages {
        match stage {
            Stage::Match { all, any, search } => {
                select = select.filter(compile_condition::<E>(all, any, search.as_deref())?);
            }
            Stage::Sort(keys) => {
                for (column, order) in resolve_sort::<E>(keys) {
                    select = select.order_by(column, order);
                }
            }
            Stage::Project(fields) => projection = fields.clone(),
            Stage::Skip(n) => select = select.offset(*n),
            Stage::Limit(n) => select = select.limit(*n),
            Stage::Count => return Ok(Outcome::Count(select.count(db).await?)),
        }
    }

    let rows = select
        .all(db)
        .await?
        .into_iter()
        .map(|model| {
            let value = serde_json::to_value(E::View::from(model)).map_err(|e| {
                crate::errors::ServiceError::InternalError(format!(
                    "Failed to serialize record: {e}"
                ))
            })?;
            Ok(apply_projection(value, projection.as_deref(), E::hidden_fields()))
        })
        .collect::<ServiceResult<Vec<_>>>()?;
    Ok(Outcome::Rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::FilterOp;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        ListQuery::from_params(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn stages_follow_fixed_order() {
        let pipeline = Pipeline::from_query(&query(&[
            ("type", "outgoing"),
            ("sort", "createdAt:desc"),
            ("page", "3"),
            ("limit", "20"),
        ]));
        let kinds: Vec<&str> = pipeline
            .stages()
            .iter()
            .map(|s| match s {
                Stage::Match { .. } => "match",
                Stage::Sort(_) => "sort",
                Stage::Project(_) => "project",
                Stage::Skip(_) => "skip",
                Stage::Limit(_) => "limit",
                Stage::Count => "count",
            })
            .collect();
        assert_eq!(kinds, ["match", "sort", "project", "skip", "limit"]);
        assert!(pipeline.stages().contains(&Stage::Skip(40)));
        assert!(pipeline.stages().contains(&Stage::Limit(20)));
    }

    #[test]
    fn count_pipeline_drops_window_and_counts() {
        let pipeline = Pipeline::from_query(
            &query(&[("page", "2")]).with_and("status", FilterOp::Eq, "completed"),
        );
        let count = pipeline.count_pipeline();
        assert!(!count
            .stages()
            .iter()
            .any(|s| matches!(s, Stage::Skip(_) | Stage::Limit(_))));
        assert_eq!(count.stages().last(), Some(&Stage::Count));
        match &count.stages()[0] {
            Stage::Match { all, .. } => assert_eq!(all.len(), 1),
            other => panic!("expected match first, got {other:?}"),
        }
    }

    #[test]
    fn unpaginated_pipeline_has_no_window_stages() {
        let pipeline = Pipeline::from_query(&query(&[("status", "new")]));
        assert_eq!(pipeline.stages().len(), 3);
    }
}
