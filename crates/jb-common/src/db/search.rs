//! Query composition over the `searchable_jobs` projection.
//!
//! One base SELECT carries the score columns and the predicate
//! conjunction; the page query and the three aggregate counts are all
//! derived from it so they cannot drift apart. The three counts are
//! intentionally independent statements: the scheme count re-runs the
//! full filtered query with the scheme constraint added rather than
//! reusing the page result, preserving filter-relaxation semantics.
//! Without snapshot isolation across the statements the counts are
//! best-effort under concurrent writes.

use mysql_async::Value;
use thiserror::Error;
use tracing::instrument;

use crate::api::search_request::SearchRequest;
use crate::db::pool::DbPool;
use crate::db::util::{column, positional, timed_query, timed_query_first};
use crate::search::filters::{self, Predicate};
use crate::search::fulltext::{geo_gate_predicate, search_text_predicate};
use crate::search::scoring::{order_by_clause, select_keys, sort_chain, ScoreContext};
use crate::search::stopwords::indexable_tokens;

#[derive(Debug, Error)]
pub enum SearchStorageError {
    #[error("mysql error: {0}")]
    Mysql(#[from] mysql_async::Error),
    #[error("failed to map search row: {0}")]
    Mapping(String),
}

/// One page of matched identifiers plus the three aggregate counts.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    /// Matched job identifiers in rank order.
    pub job_post_ids: Vec<String>,
    /// Matches under the full current filter set.
    pub total: u64,
    /// Matches ignoring every filter except geolocation.
    pub total_without_filters: u64,
    /// Matches under the full filter set plus scheme presence.
    pub total_with_schemes: u64,
}

#[derive(Debug, Clone, PartialEq)]
struct SqlQuery {
    sql: String,
    params: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FilterScope {
    /// All predicates of the request.
    Full,
    /// Only the geolocation bounding predicate, if any.
    GeolocationOnly,
}

fn predicates(request: &SearchRequest, scope: FilterScope, require_schemes: bool) -> Vec<Predicate> {
    let mut conditions = Vec::new();

    if scope == FilterScope::GeolocationOnly {
        conditions.extend(filters::geolocation(request.geolocation));
        return conditions;
    }

    // A geolocation request replaces the facet predicate set: only the
    // bounding box applies, narrowed by text/company when both are given.
    if request.geolocation.is_some() {
        conditions.extend(filters::geolocation(request.geolocation));
        conditions.extend(geo_gate_predicate(&request.search, &request.company));
    } else {
        conditions.extend(search_text_predicate(&request.search));
        conditions.extend(filters::salary_floor(request.expected_salary));
        conditions.extend(filters::posting_company(&request.posting_company));
        conditions.extend(filters::employment_types(&request.employment_types));
        conditions.extend(filters::position_levels(&request.position_levels));
        conditions.extend(filters::districts(&request.districts));
        conditions.extend(filters::categories(&request.categories));
        conditions.extend(filters::company_substring(&request.company));
        conditions.extend(filters::from_date(request.from_date));
        conditions.extend(filters::scheme_presence(request.schemes && !require_schemes));
    }

    if require_schemes {
        conditions.extend(filters::scheme_presence(true));
    }

    conditions
}

fn base_query(request: &SearchRequest, scope: FilterScope, require_schemes: bool) -> SqlQuery {
    let tokens = if request.search_present() {
        indexable_tokens(&request.search)
    } else {
        Vec::new()
    };
    let ctx = ScoreContext {
        search: request.search_present().then_some(request.search.as_str()),
        tokens: &tokens,
        company: (!request.company.is_empty()).then_some(request.company.as_str()),
        uuid: request.uuid.as_deref(),
        skills: &request.skills,
    };

    let chain = sort_chain(
        &request.sort_by,
        request.search_present(),
        request.geolocation.is_some(),
        !request.company.is_empty(),
        request.uuid.is_some(),
    );

    let mut params = Vec::new();
    let select_list = select_keys(&chain)
        .into_iter()
        .map(|key| {
            let expr = key.select_expr(&ctx);
            params.extend(expr.params);
            expr.sql
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!("SELECT {select_list} FROM searchable_jobs WHERE 1=1");
    for predicate in predicates(request, scope, require_schemes) {
        sql.push_str(" AND ");
        sql.push_str(&predicate.sql);
        params.extend(predicate.params);
    }

    // The salary floor also excludes rows with no sortable salary figure.
    if scope == FilterScope::Full && request.expected_salary.is_some_and(|salary| salary > 0) {
        sql.push_str(" HAVING presumed_salary IS NOT NULL");
    }

    SqlQuery { sql, params }
}

fn page_query(request: &SearchRequest) -> SqlQuery {
    let chain = sort_chain(
        &request.sort_by,
        request.search_present(),
        request.geolocation.is_some(),
        !request.company.is_empty(),
        request.uuid.is_some(),
    );

    let mut query = base_query(request, FilterScope::Full, false);
    query.sql.push_str(" ORDER BY ");
    query.sql.push_str(&order_by_clause(&chain));
    query.sql.push_str(" LIMIT ? OFFSET ?");
    query.params.push(Value::from(request.limit));
    query.params.push(Value::from(request.offset()));
    query
}

fn count_query(request: &SearchRequest, scope: FilterScope, require_schemes: bool) -> SqlQuery {
    let base = base_query(request, scope, require_schemes);
    SqlQuery {
        sql: format!("SELECT COUNT(*) AS total FROM ({}) AS matched", base.sql),
        params: base.params,
    }
}

async fn fetch_count(
    pool: &DbPool,
    query: SqlQuery,
    label: &'static str,
) -> Result<u64, SearchStorageError> {
    let mut conn = pool.get_conn().await?;
    let row = timed_query_first(&mut conn, &query.sql, positional(query.params), label)
        .await?
        .ok_or_else(|| SearchStorageError::Mapping(format!("{label}: no count row")))?;
    column::<u64>(&row, "total").map_err(SearchStorageError::Mapping)
}

async fn fetch_page_ids(
    pool: &DbPool,
    query: SqlQuery,
) -> Result<Vec<String>, SearchStorageError> {
    let mut conn = pool.get_conn().await?;
    let rows = timed_query(&mut conn, &query.sql, positional(query.params), "search_page").await?;
    rows.iter()
        .map(|row| column::<String>(row, "job_post_id").map_err(SearchStorageError::Mapping))
        .collect()
}

/// Run the composed search: the ranked page of identifiers and the three
/// aggregate counts, issued concurrently on independent connections. Any
/// failed round trip fails the whole search.
#[instrument(skip(pool, request), fields(page = request.page, limit = request.limit))]
pub async fn search_jobs(
    pool: &DbPool,
    request: &SearchRequest,
) -> Result<SearchPage, SearchStorageError> {
    let page = page_query(request);
    let filtered = count_query(request, FilterScope::Full, false);
    let unfiltered = count_query(request, FilterScope::GeolocationOnly, false);
    let with_schemes = count_query(request, FilterScope::Full, true);

    let (job_post_ids, total, total_without_filters, total_with_schemes) = tokio::try_join!(
        fetch_page_ids(pool, page),
        fetch_count(pool, filtered, "search_count"),
        fetch_count(pool, unfiltered, "search_count_unfiltered"),
        fetch_count(pool, with_schemes, "search_count_with_schemes"),
    )?;

    Ok(SearchPage {
        job_post_ids,
        total,
        total_without_filters,
        total_with_schemes,
    })
}
