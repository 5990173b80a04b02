//! Home page aggregate counts

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Catalog counts shown on the home page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies with status Available
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    /// Books whose title contains the configured word, case-insensitively
    pub num_book_title_word: i64,
}

/// Home page document
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IndexResponse {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    pub title_search_word: String,
    /// Visits in this session before the current one
    pub num_visits: i64,
}
