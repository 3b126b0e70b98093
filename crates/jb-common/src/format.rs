//! Visibility formatting.
//!
//! A posting can ask for parts of itself to be withheld from readers.
//! The formatter nulls those fields after aggregation, identically for
//! the search list and the single-record detail view, and is idempotent
//! by construction: it only ever clears fields.

use crate::api::job_response::JobDetail;

pub fn hide_job_fields(job: &mut JobDetail) {
    if job.is_hide_employer_name {
        job.employer_name = None;
        job.logo_url = None;
    }

    if job.is_hide_hiring_employer_name {
        job.hiring_employer_name = None;
    }

    if job.is_hide_salary {
        job.min_monthly_salary = None;
        job.max_monthly_salary = None;
        job.salary_type = None;
    }

    if job.is_hide_company_address {
        job.district_ids = None;
        job.building = None;
        job.block = None;
        job.street = None;
        job.postal_code = None;
        job.overseas_country = None;
        job.foreign_address1 = None;
        job.foreign_address2 = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disclosed_job() -> JobDetail {
        JobDetail {
            uuid: "u-1".into(),
            job_post_id: "JOB-1".into(),
            employer_name: Some("Acme".into()),
            hiring_employer_name: Some("Acme Hiring".into()),
            logo_url: Some("https://cdn.example/logo.png".into()),
            min_monthly_salary: Some(2500),
            max_monthly_salary: Some(4200),
            salary_type: Some("Monthly".into()),
            district_ids: Some(vec![3, 14]),
            building: Some("Tower A".into()),
            block: Some("12".into()),
            street: Some("Example Road".into()),
            postal_code: Some("048583".into()),
            ..JobDetail::default()
        }
    }

    #[test]
    fn leaves_disclosed_postings_untouched() {
        let mut job = disclosed_job();
        let before = job.clone();
        hide_job_fields(&mut job);
        assert_eq!(job, before);
    }

    #[test]
    fn hides_employer_identity() {
        let mut job = disclosed_job();
        job.is_hide_employer_name = true;
        hide_job_fields(&mut job);
        assert_eq!(job.employer_name, None);
        assert_eq!(job.logo_url, None);
        assert_eq!(job.hiring_employer_name, Some("Acme Hiring".into()));
    }

    #[test]
    fn hides_salary_figures_and_type() {
        let mut job = disclosed_job();
        job.is_hide_salary = true;
        hide_job_fields(&mut job);
        assert_eq!(job.min_monthly_salary, None);
        assert_eq!(job.max_monthly_salary, None);
        assert_eq!(job.salary_type, None);
    }

    #[test]
    fn hides_the_whole_address_block() {
        let mut job = disclosed_job();
        job.is_hide_company_address = true;
        hide_job_fields(&mut job);
        assert_eq!(job.district_ids, None);
        assert_eq!(job.building, None);
        assert_eq!(job.block, None);
        assert_eq!(job.street, None);
        assert_eq!(job.postal_code, None);
    }

    #[test]
    fn formatting_is_idempotent() {
        let mut job = disclosed_job();
        job.is_hide_employer_name = true;
        job.is_hide_salary = true;
        job.is_hide_company_address = true;

        hide_job_fields(&mut job);
        let once = job.clone();
        hide_job_fields(&mut job);
        assert_eq!(job, once);
    }
}
