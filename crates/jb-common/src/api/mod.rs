pub mod job_response;
pub mod search_request;

pub use job_response::{JobDetail, SearchResponse, SkillRef};
pub use search_request::SearchRequest;
