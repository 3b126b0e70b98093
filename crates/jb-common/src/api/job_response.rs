use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One skill attached to a job, in confidence order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillRef {
    pub id: i64,
    pub skill: Option<String>,
}

/// The fully aggregated, visibility-formatted record returned for each
/// matched job. Facet lists are always present; a job without rows in a
/// facet carries an empty list, never a missing field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobDetail {
    pub uuid: String,
    pub job_post_id: String,
    pub job_title: Option<String>,
    pub job_description: Option<String>,
    pub employer_name: Option<String>,
    pub hiring_employer_name: Option<String>,
    pub company_description: Option<String>,
    pub logo_url: Option<String>,

    pub min_years_experience: Option<u32>,
    pub min_monthly_salary: Option<u32>,
    pub max_monthly_salary: Option<u32>,
    pub salary_type: Option<String>,

    pub new_posting_date: Option<NaiveDate>,
    pub original_posting_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub created_on: Option<NaiveDateTime>,
    pub modified_on: Option<NaiveDateTime>,

    pub total_number_job_application: Option<u64>,
    pub total_number_of_view: Option<u64>,

    pub is_posted_on_behalf: bool,
    pub is_hide_employer_name: bool,
    pub is_hide_hiring_employer_name: bool,
    pub is_hide_salary: bool,
    pub is_hide_company_address: bool,

    // Address block, nulled as a unit when the posting hides it.
    pub district_ids: Option<Vec<i64>>,
    pub building: Option<String>,
    pub block: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub overseas_country: Option<String>,
    pub foreign_address1: Option<String>,
    pub foreign_address2: Option<String>,

    pub lat: Option<f64>,
    pub lng: Option<f64>,

    pub categories: Vec<String>,
    pub employment_types: Vec<String>,
    pub position_levels: Vec<String>,
    pub schemes: Vec<String>,
    pub vocational_licenses: Vec<String>,
    pub driving_licenses: Vec<String>,
    pub skills: Vec<SkillRef>,
}

/// The search response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub jobs: Vec<JobDetail>,
    /// Total matches under the full current filter set.
    pub count: u64,
    /// Total matches ignoring all filters except geolocation.
    #[serde(rename = "countWithoutFilters")]
    pub count_without_filters: u64,
    /// Total matches if the scheme-presence filter were added.
    #[serde(rename = "countWithSchemes")]
    pub count_with_schemes: u64,
}
