//! Free-text predicate construction.
//!
//! A search string widens into a disjunction of match routes: exact
//! phrase over title+description, all-tokens-required over the title,
//! all-tokens-required over the employer name (only for postings that
//! disclose it), an exact reference-title lookup, and two
//! classification-code resolutions (the primary classification table and
//! the cross-reference table, blacklist-suppressed). An empty search is
//! a no-op.

use mysql_async::Value;

use super::filters::Predicate;
use super::stopwords::indexable_tokens;
use super::text::{exact_phrase, required_tokens};

pub fn search_text_predicate(search: &str) -> Option<Predicate> {
    if search.is_empty() {
        return None;
    }

    let tokens = indexable_tokens(search);

    let mut arms: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    arms.push("MATCH (job_title, job_description) AGAINST (? IN BOOLEAN MODE)".into());
    params.push(Value::from(exact_phrase(search)));

    if !tokens.is_empty() {
        let required = required_tokens(&tokens);

        arms.push("MATCH (job_title) AGAINST (? IN BOOLEAN MODE)".into());
        params.push(Value::from(required.clone()));

        arms.push(
            "(is_hide_employer_name = 0 \
             AND MATCH (employer_name) AGAINST (? IN BOOLEAN MODE))"
                .into(),
        );
        params.push(Value::from(required));
    }

    arms.push(
        "job_post_id IN (SELECT jjt.job_post_id FROM job_job_title jjt \
         INNER JOIN job_title jt ON jt.id = jjt.job_title_id \
         WHERE jt.job_title = ?)"
            .into(),
    );
    params.push(Value::from(search.to_string()));

    arms.push(
        "ssoc_code IN (SELECT i.icms_index FROM icms_job_titles i \
         WHERE i.is_blacklist = 0 AND i.icms_title = ?)"
            .into(),
    );
    params.push(Value::from(search.to_string()));

    arms.push(
        "ssoc_code IN (SELECT i.icms_index FROM ssoc_job_titles s \
         INNER JOIN icms_ssoc x ON x.ssoc = s.ssoc \
         INNER JOIN icms_job_titles i ON i.icms_index = x.icms_index \
         WHERE i.is_blacklist = 0 AND s.ssoc_title = ?)"
            .into(),
    );
    params.push(Value::from(search.to_string()));

    Some(Predicate::new(format!("({})", arms.join(" OR ")), params))
}

/// The narrower disjunction applied inside a geolocation search when the
/// caller also supplies search text and a company name: phrase or title
/// token match, or exact employer-phrase match.
pub fn geo_gate_predicate(search: &str, company: &str) -> Option<Predicate> {
    if search.is_empty() || company.is_empty() {
        return None;
    }

    let tokens = indexable_tokens(search);

    let mut arms: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    arms.push("MATCH (job_title, job_description) AGAINST (? IN BOOLEAN MODE)".into());
    params.push(Value::from(exact_phrase(search)));

    if !tokens.is_empty() {
        arms.push("MATCH (job_title) AGAINST (? IN BOOLEAN MODE)".into());
        params.push(Value::from(required_tokens(&tokens)));
    }

    arms.push("MATCH (employer_name) AGAINST (? IN BOOLEAN MODE)".into());
    params.push(Value::from(exact_phrase(company)));

    Some(Predicate::new(format!("({})", arms.join(" OR ")), params))
}
