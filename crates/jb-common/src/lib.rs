pub mod api;
pub mod db;
pub mod format;
pub mod logging;
pub mod search;
