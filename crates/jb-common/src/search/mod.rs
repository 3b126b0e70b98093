pub mod filters;
pub mod fulltext;
pub mod geo;
pub mod scoring;
pub mod stopwords;
pub mod text;

pub use filters::Predicate;
pub use geo::{BoundingBox, GeoPoint};
pub use scoring::SortKey;
