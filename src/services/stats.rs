//! Home page statistics

use crate::{
    error::AppResult,
    models::{
        book_instance::{InstanceFilter, LoanStatus},
        session::Session,
        stats::{CatalogCounts, IndexResponse},
    },
    repository::Repository,
};

const NUM_VISITS_KEY: &str = "num_visits";

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    title_search_word: String,
}

impl StatsService {
    pub fn new(repository: Repository, title_search_word: String) -> Self {
        Self {
            repository,
            title_search_word,
        }
    }

    /// Aggregate counts over the whole catalog
    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        let available = InstanceFilter {
            status: Some(LoanStatus::Available),
            ..Default::default()
        };

        Ok(CatalogCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.instances.count(&InstanceFilter::default()).await?,
            num_instances_available: self.repository.instances.count(&available).await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.genres.count().await?,
            num_book_title_word: self
                .repository
                .books
                .count_title_contains(&self.title_search_word)
                .await?,
        })
    }

    /// Home page: counts plus the session visit counter, which is bumped
    pub async fn index(&self, session: &mut Session) -> AppResult<IndexResponse> {
        let counts = self.counts().await?;

        let num_visits: i64 = session.get(NUM_VISITS_KEY, 0);
        session.set(NUM_VISITS_KEY, num_visits + 1);

        Ok(IndexResponse {
            counts,
            title_search_word: self.title_search_word.clone(),
            num_visits,
        })
    }
}
