//! Facet predicate builders.
//!
//! Each builder is a pure function from a filter value to an optional SQL
//! predicate: an absent or empty filter returns `None`, which the query
//! composer treats as "unconstrained". The load-bearing rule is that no
//! builder ever narrows the result set when its input is missing.

use chrono::NaiveDate;
use mysql_async::Value;

use super::geo::{BoundingBox, GeoPoint, DEFAULT_RADIUS_KM};

/// A SQL fragment paired with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Predicate {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// `?, ?, ...` for an IN list.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Salary floor. Postings that do not disclose a maximum salary always
/// pass; postings that hide their salary never satisfy the floor.
pub fn salary_floor(expected_salary: Option<u32>) -> Option<Predicate> {
    let floor = expected_salary.filter(|salary| *salary > 0)?;
    Some(Predicate::new(
        "((max_monthly_salary >= ? AND is_hide_salary = 0) OR max_monthly_salary IS NULL)",
        vec![Value::from(floor)],
    ))
}

/// "Direct" selects postings published by the employer itself,
/// "Third Party" those posted on behalf of another. Requesting both or
/// neither is ambiguous and therefore unconstrained.
pub fn posting_company(selection: &[String]) -> Option<Predicate> {
    let direct = selection.iter().any(|v| v == "Direct");
    let third_party = selection.iter().any(|v| v == "Third Party");
    if direct == third_party {
        return None;
    }
    Some(Predicate::new(
        "is_posted_on_behalf = ?",
        vec![Value::from(u8::from(third_party))],
    ))
}

pub fn employment_types(labels: &[String]) -> Option<Predicate> {
    membership_by_label(
        labels,
        "job_employment_type",
        "employment_type_id",
        "employment_types",
        "employment_type",
    )
}

pub fn position_levels(labels: &[String]) -> Option<Predicate> {
    membership_by_label(
        labels,
        "job_position",
        "position_id",
        "position_levels",
        "position",
    )
}

pub fn categories(labels: &[String]) -> Option<Predicate> {
    membership_by_label(labels, "job_category", "category_id", "categories", "category")
}

pub fn districts(district_ids: &[i64]) -> Option<Predicate> {
    if district_ids.is_empty() {
        return None;
    }
    let sql = format!(
        "job_post_id IN (SELECT jd.job_post_id FROM job_district jd \
         WHERE jd.district_id IN ({}))",
        placeholders(district_ids.len())
    );
    Some(Predicate::new(
        sql,
        district_ids.iter().map(|id| Value::from(*id)).collect(),
    ))
}

/// Case-insensitive substring match on the employer name.
pub fn company_substring(company: &str) -> Option<Predicate> {
    let company = company.trim();
    if company.is_empty() {
        return None;
    }
    Some(Predicate::new(
        "LOWER(employer_name) LIKE ?",
        vec![Value::from(format!("%{}%", company.to_lowercase()))],
    ))
}

/// `true` restricts to postings with at least one scheme; `false` is a
/// no-op, not "schemeless only".
pub fn scheme_presence(required: bool) -> Option<Predicate> {
    if !required {
        return None;
    }
    Some(Predicate::new(
        "job_post_id IN (SELECT js.job_post_id FROM job_scheme js)",
        Vec::new(),
    ))
}

/// Inclusive lower bound on the last-updated timestamp.
pub fn from_date(date: Option<NaiveDate>) -> Option<Predicate> {
    date.map(|date| {
        Predicate::new(
            "updated_at >= ?",
            vec![Value::from(date.format("%Y-%m-%d").to_string())],
        )
    })
}

/// Restrict to postings whose postal code lies inside the bounding box
/// around the origin. The box over-approximates the radius circle.
pub fn geolocation(origin: Option<GeoPoint>) -> Option<Predicate> {
    let origin = origin?;
    let bounds = BoundingBox::around(origin, DEFAULT_RADIUS_KM);

    let mut sql = String::from(
        "postal_code IN (SELECT pl.postal_code FROM postal_location pl \
         WHERE pl.lat BETWEEN ? AND ?",
    );
    let mut params = vec![Value::from(bounds.min_lat), Value::from(bounds.max_lat)];
    if let Some((min_lng, max_lng)) = bounds.lng_bounds {
        sql.push_str(" AND pl.lng BETWEEN ? AND ?");
        params.push(Value::from(min_lng));
        params.push(Value::from(max_lng));
    }
    sql.push_str(")");

    Some(Predicate::new(sql, params))
}

fn membership_by_label(
    labels: &[String],
    join_table: &str,
    join_column: &str,
    facet_table: &str,
    label_column: &str,
) -> Option<Predicate> {
    if labels.is_empty() {
        return None;
    }
    let sql = format!(
        "job_post_id IN (SELECT jt.job_post_id FROM {join_table} jt \
         INNER JOIN {facet_table} f ON f.id = jt.{join_column} \
         WHERE f.{label_column} IN ({}))",
        placeholders(labels.len())
    );
    Some(Predicate::new(
        sql,
        labels.iter().map(|label| Value::from(label.clone())).collect(),
    ))
}
