//! Repository layer for database operations
//!
//! Each entity has a repository trait (the persistence contract used by the
//! services) and a PostgreSQL implementation.

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod health;
pub mod languages;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use authors::AuthorsRepository;
pub use book_instances::BookInstancesRepository;
pub use books::BooksRepository;
pub use genres::GenresRepository;
pub use health::HealthRepository;
pub use languages::LanguagesRepository;
pub use users::UsersRepository;

/// Main repository struct holding one repository per entity
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn AuthorsRepository>,
    pub books: Arc<dyn BooksRepository>,
    pub instances: Arc<dyn BookInstancesRepository>,
    pub genres: Arc<dyn GenresRepository>,
    pub languages: Arc<dyn LanguagesRepository>,
    pub users: Arc<dyn UsersRepository>,
    pub health: Arc<dyn HealthRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(authors::PgAuthorsRepository::new(pool.clone())),
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            instances: Arc::new(book_instances::PgBookInstancesRepository::new(pool.clone())),
            genres: Arc::new(genres::PgGenresRepository::new(pool.clone())),
            languages: Arc::new(languages::PgLanguagesRepository::new(pool.clone())),
            users: Arc::new(users::PgUsersRepository::new(pool.clone())),
            health: Arc::new(health::PgHealthRepository::new(pool)),
        }
    }
}
