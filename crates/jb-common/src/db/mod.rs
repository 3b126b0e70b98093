pub mod details;
pub mod pool;
pub mod search;
pub mod util;

pub use details::{aggregate_details, fetch_job_detail, DetailStorageError};
pub use pool::{create_pool_from_url, create_pool_from_url_checked, DbPool, DbPoolError};
pub use search::{search_jobs, SearchPage, SearchStorageError};
