//! The search endpoint: decode the camelCase query string into a
//! [`SearchRequest`], run the composed search, hydrate the page, and
//! apply the visibility formatter before anything leaves the process.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::future::Future;

use chrono::NaiveDate;
use serde::Deserialize;
use tokio::time::{timeout_at, Duration, Instant};

use jb_common::api::search_request::DEFAULT_PAGE_SIZE;
use jb_common::api::{JobDetail, SearchRequest, SearchResponse};
use jb_common::db::{aggregate_details, fetch_job_detail, search_jobs};
use jb_common::format::hide_job_fields;
use jb_common::search::{GeoPoint, SortKey};

use crate::error::ApiError;
use crate::handlers::pagination::validate_pagination;
use crate::SharedState;

/// Raw query parameters. List-valued filters arrive as one
/// comma-separated value per key.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSearchParams {
    pub search: Option<String>,
    /// Signed so a negative floor is rejected rather than wrapped.
    pub salary: Option<i64>,
    pub posting_company: Option<String>,
    pub employment_type: Option<String>,
    pub position_level: Option<String>,
    pub districts: Option<String>,
    pub category: Option<String>,
    pub company: Option<String>,
    pub schemes: Option<bool>,
    pub skills: Option<String>,
    pub from_date: Option<String>,
    /// `lat,lng` in decimal degrees.
    pub geolocation: Option<String>,
    pub uuid: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn comma_list(raw: &Option<String>) -> Vec<String> {
    raw.as_deref()
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_salary(raw: Option<i64>) -> Result<Option<u32>, ApiError> {
    match raw {
        None => Ok(None),
        Some(salary) if salary < 0 => {
            Err(ApiError::BadRequest("salary must not be negative".into()))
        }
        Some(salary) => u32::try_from(salary)
            .map(Some)
            .map_err(|_| ApiError::BadRequest("salary is out of range".into())),
    }
}

fn parse_districts(raw: &Option<String>) -> Result<Vec<i64>, ApiError> {
    comma_list(raw)
        .iter()
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("invalid district id: {part}")))
        })
        .collect()
}

fn parse_from_date(raw: &Option<String>) -> Result<Option<NaiveDate>, ApiError> {
    raw.as_deref()
        .map(|value| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| ApiError::BadRequest(format!("invalid fromDate: {value}")))
        })
        .transpose()
}

fn parse_geolocation(raw: &Option<String>) -> Result<Option<GeoPoint>, ApiError> {
    let Some(value) = raw.as_deref() else {
        return Ok(None);
    };

    let invalid = || ApiError::BadRequest(format!("invalid geolocation: {value}"));
    let (lat, lng) = value.split_once(',').ok_or_else(invalid)?;
    let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;
    let lng = lng.trim().parse::<f64>().map_err(|_| invalid())?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(invalid());
    }

    Ok(Some(GeoPoint { lat, lng }))
}

fn parse_sort_by(raw: &Option<String>) -> Result<Vec<SortKey>, ApiError> {
    comma_list(raw)
        .iter()
        .map(|part| {
            part.parse::<SortKey>()
                .map_err(|err| ApiError::BadRequest(err.to_string()))
        })
        .collect()
}

pub(crate) fn parse_request(params: JobSearchParams) -> Result<SearchRequest, ApiError> {
    let (limit, page) = validate_pagination(
        params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        params.page.unwrap_or(0),
    )?;

    let request = SearchRequest {
        search: params.search.unwrap_or_default(),
        expected_salary: parse_salary(params.salary)?,
        posting_company: comma_list(&params.posting_company),
        employment_types: comma_list(&params.employment_type),
        position_levels: comma_list(&params.position_level),
        districts: parse_districts(&params.districts)?,
        categories: comma_list(&params.category),
        company: params.company.unwrap_or_default(),
        schemes: params.schemes.unwrap_or(false),
        skills: comma_list(&params.skills),
        from_date: parse_from_date(&params.from_date)?,
        geolocation: parse_geolocation(&params.geolocation)?,
        uuid: params.uuid.filter(|uuid| !uuid.trim().is_empty()),
        sort_by: parse_sort_by(&params.sort_by)?,
        page,
        limit,
    };

    Ok(request.sanitize())
}

/// Bound one storage phase by the request's shared deadline. Hitting the
/// deadline is reported as service unavailability, not a client fault.
async fn with_deadline<T>(
    deadline: Instant,
    fut: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    timeout_at(deadline, fut)
        .await
        .map_err(|_| ApiError::ServiceUnavailable("search_timeout".into()))?
}

pub async fn search(
    State(state): State<SharedState>,
    Query(params): Query<JobSearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let request = parse_request(params)?;
    // One budget covers the whole database phase of the request.
    let deadline = Instant::now() + Duration::from_millis(state.config.search_timeout_ms);

    let page = with_deadline(deadline, async {
        Ok(search_jobs(&state.pool, &request).await?)
    })
    .await?;

    let mut jobs = with_deadline(deadline, async {
        Ok(aggregate_details(&state.pool, &page.job_post_ids).await?)
    })
    .await?;

    for job in &mut jobs {
        hide_job_fields(job);
    }

    Ok(Json(SearchResponse {
        jobs,
        count: page.total,
        count_without_filters: page.total_without_filters,
        count_with_schemes: page.total_with_schemes,
    }))
}

pub async fn get_job(
    State(state): State<SharedState>,
    Path(job_post_id): Path<String>,
) -> Result<Json<JobDetail>, ApiError> {
    let mut detail = fetch_job_detail(&state.pool, &job_post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job not found: {job_post_id}")))?;

    hide_job_fields(&mut detail);
    Ok(Json(detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_produce_the_default_request() {
        let request = parse_request(JobSearchParams::default()).unwrap();
        assert_eq!(request.page, 0);
        assert_eq!(request.limit, DEFAULT_PAGE_SIZE);
        assert!(request.search.is_empty());
        assert!(request.sort_by.is_empty());
    }

    #[test]
    fn comma_separated_lists_split_and_trim() {
        let params = JobSearchParams {
            employment_type: Some("Full Time, Contract ,".to_string()),
            districts: Some("3, 14,15".to_string()),
            ..JobSearchParams::default()
        };
        let request = parse_request(params).unwrap();
        assert_eq!(
            request.employment_types,
            vec!["Full Time".to_string(), "Contract".to_string()]
        );
        assert_eq!(request.districts, vec![3, 14, 15]);
    }

    #[test]
    fn negative_salary_is_rejected() {
        let params = JobSearchParams {
            salary: Some(-1),
            ..JobSearchParams::default()
        };
        assert!(matches!(
            parse_request(params),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn unknown_sort_columns_are_rejected() {
        let params = JobSearchParams {
            sort_by: Some("schemes,min_monthly_salary".to_string()),
            ..JobSearchParams::default()
        };
        let request = parse_request(params).unwrap();
        assert_eq!(
            request.sort_by,
            vec![SortKey::Schemes, SortKey::MinMonthlySalary]
        );

        let params = JobSearchParams {
            sort_by: Some("employer_name; DROP TABLE jobs".to_string()),
            ..JobSearchParams::default()
        };
        assert!(matches!(
            parse_request(params),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn geolocation_parses_lat_lng_pairs() {
        let params = JobSearchParams {
            geolocation: Some("1.3521, 103.8198".to_string()),
            ..JobSearchParams::default()
        };
        let request = parse_request(params).unwrap();
        let origin = request.geolocation.unwrap();
        assert!((origin.lat - 1.3521).abs() < 1e-9);
        assert!((origin.lng - 103.8198).abs() < 1e-9);

        for bad in ["1.3521", "91,0", "0,181", "north,east"] {
            let params = JobSearchParams {
                geolocation: Some(bad.to_string()),
                ..JobSearchParams::default()
            };
            assert!(matches!(
                parse_request(params),
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn invalid_from_date_is_rejected() {
        let params = JobSearchParams {
            from_date: Some("15-06-2024".to_string()),
            ..JobSearchParams::default()
        };
        assert!(matches!(
            parse_request(params),
            Err(ApiError::BadRequest(_))
        ));

        let params = JobSearchParams {
            from_date: Some("2024-06-15".to_string()),
            ..JobSearchParams::default()
        };
        let request = parse_request(params).unwrap();
        assert_eq!(
            request.from_date,
            Some(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
        );
    }

    #[test]
    fn search_text_is_sanitized_at_the_boundary() {
        let params = JobSearchParams {
            search: Some(" \"staff nurse\" ".to_string()),
            ..JobSearchParams::default()
        };
        let request = parse_request(params).unwrap();
        assert_eq!(request.search, "staff nurse");
    }

    #[tokio::test(start_paused = true)]
    async fn one_deadline_bounds_both_storage_phases() {
        let deadline = Instant::now() + Duration::from_millis(100);

        let first = with_deadline(deadline, async {
            tokio::time::sleep(Duration::from_millis(80)).await;
            Ok(1)
        })
        .await;
        assert_eq!(first.unwrap(), 1);

        // The second phase inherits what the first left of the budget.
        let second = with_deadline(deadline, async {
            tokio::time::sleep(Duration::from_millis(80)).await;
            Ok(2)
        })
        .await;
        assert!(matches!(
            second,
            Err(ApiError::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn blank_uuid_is_treated_as_absent() {
        let params = JobSearchParams {
            uuid: Some("   ".to_string()),
            ..JobSearchParams::default()
        };
        let request = parse_request(params).unwrap();
        assert!(request.uuid.is_none());
    }
}
