//! Languages repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::language::Language,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguagesRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Language>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Language>;
    async fn create(&self, name: &str) -> AppResult<Language>;
}

#[derive(Clone)]
pub struct PgLanguagesRepository {
    pool: Pool<Postgres>,
}

impl PgLanguagesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LanguagesRepository for PgLanguagesRepository {
    async fn list(&self) -> AppResult<Vec<Language>> {
        let languages = sqlx::query_as::<_, Language>("SELECT id, name FROM languages ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(languages)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("SELECT id, name FROM languages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Language with id {} not found", id)))
    }

    async fn create(&self, name: &str) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("INSERT INTO languages (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_constraint(e, &format!("Language {} already exists", name)))
    }
}
