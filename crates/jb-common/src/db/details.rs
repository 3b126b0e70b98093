//! Detail aggregation for a page of matched jobs.
//!
//! The ranked identifier page from the search query is hydrated in two
//! bulk round trips: one wide row per job with its facet lists folded
//! into JSON arrays by correlated subqueries, and one flat skills query
//! ordered by extraction confidence. Page order is defined by the caller
//! and is preserved through the merge; a ranked identifier whose detail
//! row has vanished between the two statements is dropped with a warning
//! rather than failing the page.

use std::collections::HashMap;

use mysql_async::{Row, Value};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::api::job_response::{JobDetail, SkillRef};
use crate::db::pool::DbPool;
use crate::db::util::{column, positional, timed_query};
use crate::search::filters::placeholders;

#[derive(Debug, Error)]
pub enum DetailStorageError {
    #[error("mysql error: {0}")]
    Mysql(#[from] mysql_async::Error),
    #[error("failed to map detail row: {0}")]
    Mapping(String),
}

fn detail_sql(id_count: usize) -> String {
    format!(
        "SELECT \
         j.uuid, j.job_post_id, j.job_title, j.job_description, \
         j.employer_name, j.hiring_employer_name, \
         ci.description AS company_description, \
         ci.logo_upload_path AS logo_url, \
         j.min_years_experience, j.min_monthly_salary, j.max_monthly_salary, \
         (SELECT st.salary_type FROM salary_type st \
          WHERE st.id = j.salary_type_id) AS salary_type, \
         j.new_posting_date, j.original_posting_date, j.expiry_date, \
         j.created_on, j.modified_on, \
         j.total_number_job_application, j.total_number_of_view, \
         j.is_posted_on_behalf, j.is_hide_employer_name, \
         j.is_hide_hiring_employer_name, j.is_hide_salary, j.is_hide_company_address, \
         (SELECT CONCAT('[', GROUP_CONCAT(jd.district_id), ']') \
          FROM job_district jd WHERE jd.job_post_id = j.job_post_id) AS district_ids, \
         j.building, j.block, j.street, j.postal_code, \
         j.overseas_country, j.foreign_address1, j.foreign_address2, \
         pl.lat, pl.lng, \
         (SELECT CONCAT('[', GROUP_CONCAT(JSON_QUOTE(c.category)), ']') \
          FROM job_category jc INNER JOIN categories c ON c.id = jc.category_id \
          WHERE jc.job_post_id = j.job_post_id) AS categories, \
         (SELECT CONCAT('[', GROUP_CONCAT(JSON_QUOTE(et.employment_type)), ']') \
          FROM job_employment_type jet \
          INNER JOIN employment_types et ON et.id = jet.employment_type_id \
          WHERE jet.job_post_id = j.job_post_id) AS employment_types, \
         (SELECT CONCAT('[', GROUP_CONCAT(JSON_QUOTE(p.position)), ']') \
          FROM job_position jp INNER JOIN position_levels p ON p.id = jp.position_id \
          WHERE jp.job_post_id = j.job_post_id) AS position_levels, \
         (SELECT CONCAT('[', GROUP_CONCAT(JSON_QUOTE(sc.scheme)), ']') \
          FROM job_scheme js INNER JOIN schemes sc ON sc.id = js.scheme_id \
          WHERE js.job_post_id = j.job_post_id) AS schemes, \
         (SELECT CONCAT('[', GROUP_CONCAT(JSON_QUOTE(vl.vocational_license)), ']') \
          FROM job_vocational_license jvl \
          INNER JOIN vocational_licenses vl ON vl.id = jvl.vocational_license_id \
          WHERE jvl.job_post_id = j.job_post_id) AS vocational_licenses, \
         (SELECT CONCAT('[', GROUP_CONCAT(JSON_QUOTE(dl.driving_license)), ']') \
          FROM job_driving_license jdl \
          INNER JOIN driving_licenses dl ON dl.id = jdl.driving_license_id \
          WHERE jdl.job_post_id = j.job_post_id) AS driving_licenses \
         FROM jobs j \
         LEFT JOIN company_info ci ON ci.uen = j.posted_uen \
         LEFT JOIN postal_location pl ON pl.postal_code = j.postal_code \
         WHERE j.job_post_id IN ({})",
        placeholders(id_count)
    )
}

fn skills_sql(id_count: usize) -> String {
    format!(
        "SELECT jsk.job_post_id, s.id, s.skill \
         FROM job_skill jsk \
         LEFT JOIN skill s ON s.id = jsk.skill_id \
         WHERE jsk.job_post_id IN ({}) \
         ORDER BY jsk.confidence DESC",
        placeholders(id_count)
    )
}

/// Facet lists come back as JSON arrays built by GROUP_CONCAT; a job with
/// no rows in the facet yields SQL NULL, which means an empty list.
fn parse_string_list(raw: Option<String>, field: &str) -> Result<Vec<String>, String> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|err| format!("malformed {field} aggregate {raw:?}: {err}")),
    }
}

/// District ids keep the NULL/empty distinction: the address block is
/// nulled as a unit by the visibility formatter, so absence stays `None`.
fn parse_id_list(raw: Option<String>, field: &str) -> Result<Option<Vec<i64>>, String> {
    match raw {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| format!("malformed {field} aggregate {raw:?}: {err}")),
    }
}

fn map_detail_row(row: &Row) -> Result<JobDetail, String> {
    Ok(JobDetail {
        uuid: column(row, "uuid")?,
        job_post_id: column(row, "job_post_id")?,
        job_title: column(row, "job_title")?,
        job_description: column(row, "job_description")?,
        employer_name: column(row, "employer_name")?,
        hiring_employer_name: column(row, "hiring_employer_name")?,
        company_description: column(row, "company_description")?,
        logo_url: column(row, "logo_url")?,
        min_years_experience: column(row, "min_years_experience")?,
        min_monthly_salary: column(row, "min_monthly_salary")?,
        max_monthly_salary: column(row, "max_monthly_salary")?,
        salary_type: column(row, "salary_type")?,
        new_posting_date: column(row, "new_posting_date")?,
        original_posting_date: column(row, "original_posting_date")?,
        expiry_date: column(row, "expiry_date")?,
        created_on: column(row, "created_on")?,
        modified_on: column(row, "modified_on")?,
        total_number_job_application: column(row, "total_number_job_application")?,
        total_number_of_view: column(row, "total_number_of_view")?,
        is_posted_on_behalf: column::<Option<bool>>(row, "is_posted_on_behalf")?.unwrap_or(false),
        is_hide_employer_name: column::<Option<bool>>(row, "is_hide_employer_name")?
            .unwrap_or(false),
        is_hide_hiring_employer_name: column::<Option<bool>>(row, "is_hide_hiring_employer_name")?
            .unwrap_or(false),
        is_hide_salary: column::<Option<bool>>(row, "is_hide_salary")?.unwrap_or(false),
        is_hide_company_address: column::<Option<bool>>(row, "is_hide_company_address")?
            .unwrap_or(false),
        district_ids: parse_id_list(column(row, "district_ids")?, "district_ids")?,
        building: column(row, "building")?,
        block: column(row, "block")?,
        street: column(row, "street")?,
        postal_code: column(row, "postal_code")?,
        overseas_country: column(row, "overseas_country")?,
        foreign_address1: column(row, "foreign_address1")?,
        foreign_address2: column(row, "foreign_address2")?,
        lat: column(row, "lat")?,
        lng: column(row, "lng")?,
        categories: parse_string_list(column(row, "categories")?, "categories")?,
        employment_types: parse_string_list(column(row, "employment_types")?, "employment_types")?,
        position_levels: parse_string_list(column(row, "position_levels")?, "position_levels")?,
        schemes: parse_string_list(column(row, "schemes")?, "schemes")?,
        vocational_licenses: parse_string_list(
            column(row, "vocational_licenses")?,
            "vocational_licenses",
        )?,
        driving_licenses: parse_string_list(
            column(row, "driving_licenses")?,
            "driving_licenses",
        )?,
        skills: Vec::new(),
    })
}

/// Group flat skill rows by job, preserving the confidence order of the
/// input. A skill row whose catalog entry is gone carries a NULL id and
/// is dropped.
fn group_skills<I>(rows: I) -> HashMap<String, Vec<SkillRef>>
where
    I: IntoIterator<Item = (String, Option<i64>, Option<String>)>,
{
    let mut grouped: HashMap<String, Vec<SkillRef>> = HashMap::new();
    for (job_post_id, id, skill) in rows {
        let Some(id) = id else { continue };
        grouped
            .entry(job_post_id)
            .or_default()
            .push(SkillRef { id, skill });
    }
    grouped
}

/// Re-impose the ranked page order on the unordered detail rows and
/// attach each job's skills.
fn merge_page(
    ordered_ids: &[String],
    details: Vec<JobDetail>,
    mut skills: HashMap<String, Vec<SkillRef>>,
) -> Vec<JobDetail> {
    let mut by_id: HashMap<String, JobDetail> = details
        .into_iter()
        .map(|detail| (detail.job_post_id.clone(), detail))
        .collect();

    let mut page = Vec::with_capacity(ordered_ids.len());
    for id in ordered_ids {
        match by_id.remove(id) {
            Some(mut detail) => {
                detail.skills = skills.remove(id).unwrap_or_default();
                page.push(detail);
            }
            None => warn!(job_post_id = %id, "matched job has no detail row; dropped from page"),
        }
    }
    page
}

async fn fetch_detail_rows(
    pool: &DbPool,
    ids: &[String],
) -> Result<Vec<JobDetail>, DetailStorageError> {
    let mut conn = pool.get_conn().await?;
    let params = ids.iter().map(|id| Value::from(id.clone())).collect();
    let rows = timed_query(&mut conn, &detail_sql(ids.len()), positional(params), "job_details")
        .await?;
    rows.iter()
        .map(|row| map_detail_row(row).map_err(DetailStorageError::Mapping))
        .collect()
}

async fn fetch_skill_rows(
    pool: &DbPool,
    ids: &[String],
) -> Result<HashMap<String, Vec<SkillRef>>, DetailStorageError> {
    let mut conn = pool.get_conn().await?;
    let params = ids.iter().map(|id| Value::from(id.clone())).collect();
    let rows = timed_query(&mut conn, &skills_sql(ids.len()), positional(params), "job_skills")
        .await?;
    let decoded = rows
        .iter()
        .map(|row| {
            Ok((
                column::<String>(row, "job_post_id")?,
                column::<Option<i64>>(row, "id")?,
                column::<Option<String>>(row, "skill")?,
            ))
        })
        .collect::<Result<Vec<_>, String>>()
        .map_err(DetailStorageError::Mapping)?;
    Ok(group_skills(decoded))
}

/// Hydrate a ranked identifier page into full job records, in page order.
#[instrument(skip(pool, job_post_ids), fields(jobs = job_post_ids.len()))]
pub async fn aggregate_details(
    pool: &DbPool,
    job_post_ids: &[String],
) -> Result<Vec<JobDetail>, DetailStorageError> {
    if job_post_ids.is_empty() {
        return Ok(Vec::new());
    }

    let (details, skills) = tokio::try_join!(
        fetch_detail_rows(pool, job_post_ids),
        fetch_skill_rows(pool, job_post_ids),
    )?;

    Ok(merge_page(job_post_ids, details, skills))
}

/// Hydrate a single job, `None` when no such posting exists.
#[instrument(skip(pool))]
pub async fn fetch_job_detail(
    pool: &DbPool,
    job_post_id: &str,
) -> Result<Option<JobDetail>, DetailStorageError> {
    let ids = vec![job_post_id.to_string()];
    let mut page = aggregate_details(pool, &ids).await?;
    Ok(page.pop())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(job_post_id: &str) -> JobDetail {
        JobDetail {
            job_post_id: job_post_id.to_string(),
            uuid: format!("uuid-{job_post_id}"),
            ..JobDetail::default()
        }
    }

    #[test]
    fn merge_preserves_the_ranked_page_order() {
        let ids = vec!["J3".to_string(), "J1".to_string(), "J2".to_string()];
        let details = vec![detail("J1"), detail("J2"), detail("J3")];
        let page = merge_page(&ids, details, HashMap::new());
        let order: Vec<_> = page.iter().map(|d| d.job_post_id.as_str()).collect();
        assert_eq!(order, vec!["J3", "J1", "J2"]);
    }

    #[test]
    fn merge_drops_identifiers_without_a_detail_row() {
        let ids = vec!["J1".to_string(), "GONE".to_string(), "J2".to_string()];
        let details = vec![detail("J1"), detail("J2")];
        let page = merge_page(&ids, details, HashMap::new());
        assert_eq!(page.len(), 2);
        assert!(page.iter().all(|d| d.job_post_id != "GONE"));
    }

    #[test]
    fn merge_attaches_skills_to_their_job() {
        let ids = vec!["J1".to_string()];
        let skills = group_skills(vec![
            ("J1".to_string(), Some(7), Some("welding".to_string())),
            ("J1".to_string(), Some(9), None),
            ("J2".to_string(), Some(1), Some("rigging".to_string())),
        ]);
        let page = merge_page(&ids, vec![detail("J1")], skills);
        assert_eq!(
            page[0].skills,
            vec![
                SkillRef {
                    id: 7,
                    skill: Some("welding".to_string())
                },
                SkillRef { id: 9, skill: None },
            ]
        );
    }

    #[test]
    fn skills_without_a_catalog_entry_are_dropped() {
        let grouped = group_skills(vec![("J1".to_string(), None, None)]);
        assert!(grouped.is_empty());
    }

    #[test]
    fn null_facet_aggregate_means_empty_list() {
        assert_eq!(parse_string_list(None, "categories").unwrap(), Vec::<String>::new());
        assert_eq!(
            parse_string_list(Some("[\"Engineering\",\"Marine\"]".to_string()), "categories")
                .unwrap(),
            vec!["Engineering".to_string(), "Marine".to_string()]
        );
        assert!(parse_string_list(Some("not json".to_string()), "categories").is_err());
    }

    #[test]
    fn district_aggregate_keeps_absence_distinct_from_empty() {
        assert_eq!(parse_id_list(None, "district_ids").unwrap(), None);
        assert_eq!(
            parse_id_list(Some("[3,14]".to_string()), "district_ids").unwrap(),
            Some(vec![3, 14])
        );
    }

    #[test]
    fn detail_query_binds_one_placeholder_per_identifier() {
        let sql = detail_sql(3);
        assert!(sql.ends_with("WHERE j.job_post_id IN (?, ?, ?)"));

        let skills = skills_sql(2);
        assert!(skills.contains("IN (?, ?)"));
        assert!(skills.ends_with("ORDER BY jsk.confidence DESC"));
    }
}
