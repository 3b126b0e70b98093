use chrono::NaiveDate;

use crate::search::geo::GeoPoint;
use crate::search::scoring::SortKey;
use crate::search::text::sanitize_fulltext;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// The validated filter tuple for one search invocation. Constructed at
/// the transport boundary, consumed once by the query composer, never
/// persisted. Every collection field treats empty as "unconstrained".
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Free text, already stripped of boolean-mode operator characters.
    pub search: String,
    pub expected_salary: Option<u32>,
    pub posting_company: Vec<String>,
    pub employment_types: Vec<String>,
    pub position_levels: Vec<String>,
    pub districts: Vec<i64>,
    pub categories: Vec<String>,
    pub company: String,
    pub schemes: bool,
    pub skills: Vec<String>,
    pub from_date: Option<NaiveDate>,
    pub geolocation: Option<GeoPoint>,
    pub uuid: Option<String>,
    pub sort_by: Vec<SortKey>,
    /// Zero-indexed page.
    pub page: u32,
    pub limit: u32,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            search: String::new(),
            expected_salary: None,
            posting_company: Vec::new(),
            employment_types: Vec::new(),
            position_levels: Vec::new(),
            districts: Vec::new(),
            categories: Vec::new(),
            company: String::new(),
            schemes: false,
            skills: Vec::new(),
            from_date: None,
            geolocation: None,
            uuid: None,
            sort_by: Vec::new(),
            page: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchRequest {
    /// Normalize the free-text fields: trim both and strip boolean-mode
    /// operator characters. The company name also feeds a phrase operand
    /// (and a LIKE pattern), so it gets the same quote/backslash guard as
    /// the search text, plus apostrophe removal.
    pub fn sanitize(mut self) -> Self {
        self.search = sanitize_fulltext(&self.search);
        self.company = sanitize_fulltext(&self.company.replace('\'', ""));
        self
    }

    pub fn search_present(&self) -> bool {
        !self.search.is_empty()
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.limit)
    }
}
