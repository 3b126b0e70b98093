//! Ranking score columns and the tie-break ordering chain.
//!
//! Every sortable quantity is a member of the closed [`SortKey`]
//! enumeration. Each key knows the SELECT expression that computes its
//! column and the ORDER BY fragments it contributes, so the composer
//! never interpolates caller-supplied column names into SQL.

use std::fmt;
use std::str::FromStr;

use mysql_async::Value;

use super::filters::placeholders;
use super::text::{exact_phrase, quoted_tokens, required_tokens};

/// A SELECT-list column with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SelectExpr {
    fn plain(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// Inputs the score expressions bind against.
#[derive(Debug, Clone, Default)]
pub struct ScoreContext<'a> {
    /// Sanitized search text; `None` when the request carries none.
    pub search: Option<&'a str>,
    /// Stopword-filtered tokens of the search text.
    pub tokens: &'a [String],
    pub company: Option<&'a str>,
    pub uuid: Option<&'a str>,
    pub skills: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    PresumedSalary,
    IsHideSalary,
    HiddenName,
    ExactStringScore,
    JobTitleScore,
    ExactCompanyScore,
    CompanyNameScore,
    JobDescriptionScore,
    MatchedSkillsScore,
    NewPostingDate,
    JobPostId,
    Schemes,
    MinMonthlySalary,
    ExactEmployerName,
    ExactUuid,
}

impl SortKey {
    pub fn column_name(self) -> &'static str {
        match self {
            SortKey::PresumedSalary => "presumed_salary",
            SortKey::IsHideSalary => "is_hide_salary",
            SortKey::HiddenName => "hidden_name",
            SortKey::ExactStringScore => "exact_string_score",
            SortKey::JobTitleScore => "job_title_score",
            SortKey::ExactCompanyScore => "exact_company_score",
            SortKey::CompanyNameScore => "company_name_score",
            SortKey::JobDescriptionScore => "job_description_score",
            SortKey::MatchedSkillsScore => "matched_skills_score",
            SortKey::NewPostingDate => "new_posting_date",
            SortKey::JobPostId => "job_post_id",
            SortKey::Schemes => "schemes",
            SortKey::MinMonthlySalary => "min_monthly_salary",
            SortKey::ExactEmployerName => "exact_employer_name",
            SortKey::ExactUuid => "exact_uuid",
        }
    }

    pub fn select_expr(self, ctx: &ScoreContext<'_>) -> SelectExpr {
        match self {
            SortKey::PresumedSalary => SelectExpr::plain(
                "COALESCE(max_monthly_salary, min_monthly_salary) AS presumed_salary",
            ),
            SortKey::HiddenName => SelectExpr::plain(
                "CASE WHEN is_posted_on_behalf = 0 AND is_hide_employer_name = 0 \
                 THEN 0 ELSE 1 END AS hidden_name",
            ),
            SortKey::ExactStringScore => {
                phrase_score(ctx.search, "job_title", "exact_string_score")
            }
            SortKey::JobTitleScore => token_score(ctx.tokens, "job_title", "job_title_score"),
            SortKey::ExactCompanyScore => {
                phrase_score(ctx.search, "employer_name", "exact_company_score")
            }
            SortKey::CompanyNameScore => {
                token_score(ctx.tokens, "employer_name", "company_name_score")
            }
            SortKey::JobDescriptionScore => {
                if ctx.tokens.is_empty() {
                    SelectExpr::plain("0 AS job_description_score")
                } else {
                    SelectExpr {
                        sql: "MATCH (job_title, job_description) AGAINST \
                              (? IN NATURAL LANGUAGE MODE) AS job_description_score"
                            .into(),
                        params: vec![Value::from(quoted_tokens(ctx.tokens))],
                    }
                }
            }
            SortKey::MatchedSkillsScore => {
                if ctx.skills.is_empty() {
                    SelectExpr::plain("NULL AS matched_skills_score")
                } else {
                    SelectExpr {
                        sql: format!(
                            "(SELECT SUM(CASE WHEN s.skill IN ({}) THEN 1 END) / COUNT(s.skill) \
                             FROM job_skill jsk INNER JOIN skill s ON s.id = jsk.skill_id \
                             WHERE jsk.job_post_id = searchable_jobs.job_post_id) \
                             AS matched_skills_score",
                            placeholders(ctx.skills.len())
                        ),
                        params: ctx
                            .skills
                            .iter()
                            .map(|skill| Value::from(skill.clone()))
                            .collect(),
                    }
                }
            }
            SortKey::ExactEmployerName => SelectExpr {
                sql: "CASE WHEN employer_name = ? THEN 1 ELSE 0 END AS exact_employer_name"
                    .into(),
                params: vec![Value::from(ctx.company.unwrap_or("").to_string())],
            },
            SortKey::ExactUuid => SelectExpr {
                sql: "CASE WHEN uuid = ? THEN 1 ELSE 0 END AS exact_uuid".into(),
                params: vec![Value::from(ctx.uuid.unwrap_or("0").to_string())],
            },
            SortKey::IsHideSalary
            | SortKey::NewPostingDate
            | SortKey::JobPostId
            | SortKey::Schemes
            | SortKey::MinMonthlySalary => SelectExpr::plain(self.column_name()),
        }
    }

    /// ORDER BY fragments contributed by this key, highest rank first.
    pub fn order_fragments(self) -> Vec<String> {
        match self {
            // Scheme-bearing postings first.
            SortKey::Schemes => vec!["schemes IS NOT NULL DESC".into()],
            // Undisclosed salaries sort to the bottom, then richest first.
            SortKey::MinMonthlySalary => {
                vec!["is_hide_salary ASC".into(), "presumed_salary DESC".into()]
            }
            _ => vec![format!("{} DESC", self.column_name())],
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "presumed_salary" => Ok(SortKey::PresumedSalary),
            "is_hide_salary" => Ok(SortKey::IsHideSalary),
            "hidden_name" => Ok(SortKey::HiddenName),
            "exact_string_score" => Ok(SortKey::ExactStringScore),
            "job_title_score" => Ok(SortKey::JobTitleScore),
            "exact_company_score" => Ok(SortKey::ExactCompanyScore),
            "company_name_score" => Ok(SortKey::CompanyNameScore),
            "job_description_score" => Ok(SortKey::JobDescriptionScore),
            "matched_skills_score" => Ok(SortKey::MatchedSkillsScore),
            "new_posting_date" => Ok(SortKey::NewPostingDate),
            "job_post_id" => Ok(SortKey::JobPostId),
            "schemes" => Ok(SortKey::Schemes),
            "min_monthly_salary" => Ok(SortKey::MinMonthlySalary),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort column: {0}")]
pub struct UnknownSortKey(pub String);

fn phrase_score(search: Option<&str>, index_column: &str, alias: &str) -> SelectExpr {
    match search {
        Some(search) if !search.is_empty() => SelectExpr {
            sql: format!(
                "(MATCH ({index_column}) AGAINST (? IN BOOLEAN MODE) > 0) AS {alias}"
            ),
            params: vec![Value::from(exact_phrase(search))],
        },
        _ => SelectExpr::plain(format!("0 AS {alias}")),
    }
}

fn token_score(tokens: &[String], index_column: &str, alias: &str) -> SelectExpr {
    if tokens.is_empty() {
        return SelectExpr::plain(format!("0 AS {alias}"));
    }
    SelectExpr {
        sql: format!("(MATCH ({index_column}) AGAINST (? IN BOOLEAN MODE) > 0) AS {alias}"),
        params: vec![Value::from(required_tokens(tokens))],
    }
}

/// The default tie-break chain. With search text present the text and
/// company scores participate; without it they are meaningless and are
/// omitted entirely. `job_post_id` terminates the chain so equal scores
/// still order deterministically.
pub fn default_chain(search_present: bool) -> Vec<SortKey> {
    if search_present {
        vec![
            SortKey::HiddenName,
            SortKey::ExactStringScore,
            SortKey::JobTitleScore,
            SortKey::ExactCompanyScore,
            SortKey::CompanyNameScore,
            SortKey::MatchedSkillsScore,
            SortKey::JobDescriptionScore,
            SortKey::NewPostingDate,
            SortKey::JobPostId,
        ]
    } else {
        vec![
            SortKey::HiddenName,
            SortKey::MatchedSkillsScore,
            SortKey::NewPostingDate,
            SortKey::JobPostId,
        ]
    }
}

/// Assemble the full tie-break chain: caller-requested keys first, then
/// the geolocation pinning keys, then the default chain. Duplicates keep
/// their first position.
pub fn sort_chain(
    requested: &[SortKey],
    search_present: bool,
    geolocation_present: bool,
    company_present: bool,
    uuid_present: bool,
) -> Vec<SortKey> {
    let mut chain: Vec<SortKey> = requested.to_vec();

    if geolocation_present && company_present {
        chain.push(SortKey::ExactEmployerName);
    }
    if geolocation_present && uuid_present {
        chain.push(SortKey::ExactUuid);
    }
    chain.extend(default_chain(search_present));

    let mut seen = Vec::new();
    chain.retain(|key| {
        if seen.contains(key) {
            false
        } else {
            seen.push(*key);
            true
        }
    });
    chain
}

/// SELECT-list keys for a chain: the salary presentation columns are
/// always computed, then every chain member once.
pub fn select_keys(chain: &[SortKey]) -> Vec<SortKey> {
    let mut keys = vec![SortKey::PresumedSalary, SortKey::IsHideSalary];
    for key in chain {
        if !keys.contains(key) {
            keys.push(*key);
        }
    }
    keys
}

/// Flatten a chain into its ORDER BY clause body.
pub fn order_by_clause(chain: &[SortKey]) -> String {
    chain
        .iter()
        .flat_map(|key| key.order_fragments())
        .collect::<Vec<_>>()
        .join(", ")
}
