//! Book instances repository: copies, their status and due dates

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceForm, BorrowedInstance, InstanceFilter},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookInstancesRepository: Send + Sync {
    /// Page of copies matching `filter`, ordered by due date (undated last)
    async fn list(&self, filter: &InstanceFilter, limit: i64, offset: i64) -> AppResult<Vec<BorrowedInstance>>;
    async fn count(&self, filter: &InstanceFilter) -> AppResult<i64>;
    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance>;
    async fn create(&self, form: &BookInstanceForm) -> AppResult<BookInstance>;
    async fn update(&self, id: Uuid, form: &BookInstanceForm) -> AppResult<BookInstance>;
    /// Overwrite only the due date
    async fn update_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// WHERE clause for `filter`, with placeholders numbered from 1 in
/// status, borrower, book order
fn where_clause(filter: &InstanceFilter) -> String {
    let mut conditions = Vec::new();
    let mut idx = 1;

    if filter.status.is_some() {
        conditions.push(format!("bi.status = ${}", idx));
        idx += 1;
    }
    if filter.borrower_id.is_some() {
        conditions.push(format!("bi.borrower_id = ${}", idx));
        idx += 1;
    }
    if filter.book_id.is_some() {
        conditions.push(format!("bi.book_id = ${}", idx));
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

fn bind_count(filter: &InstanceFilter) -> usize {
    [
        filter.status.is_some(),
        filter.borrower_id.is_some(),
        filter.book_id.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count()
}

#[derive(Clone)]
pub struct PgBookInstancesRepository {
    pool: Pool<Postgres>,
}

impl PgBookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookInstancesRepository for PgBookInstancesRepository {
    async fn list(&self, filter: &InstanceFilter, limit: i64, offset: i64) -> AppResult<Vec<BorrowedInstance>> {
        let next = bind_count(filter) + 1;
        let query = format!(
            r#"
            SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.due_back,
                   bi.status, bi.borrower_id, u.username AS borrower_username
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            LEFT JOIN users u ON u.id = bi.borrower_id
            {}
            ORDER BY bi.due_back ASC NULLS LAST, bi.id
            LIMIT ${} OFFSET ${}
            "#,
            where_clause(filter),
            next,
            next + 1
        );

        let mut builder = sqlx::query_as::<_, BorrowedInstance>(&query);
        if let Some(status) = filter.status {
            builder = builder.bind(status);
        }
        if let Some(borrower_id) = filter.borrower_id {
            builder = builder.bind(borrower_id);
        }
        if let Some(book_id) = filter.book_id {
            builder = builder.bind(book_id);
        }

        let rows = builder.bind(limit).bind(offset).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count(&self, filter: &InstanceFilter) -> AppResult<i64> {
        let query = format!("SELECT COUNT(*) FROM book_instances bi {}", where_clause(filter));

        let mut builder = sqlx::query_scalar::<_, i64>(&query);
        if let Some(status) = filter.status {
            builder = builder.bind(status);
        }
        if let Some(borrower_id) = filter.borrower_id {
            builder = builder.bind(borrower_id);
        }
        if let Some(book_id) = filter.book_id {
            builder = builder.bind(book_id);
        }

        Ok(builder.fetch_one(&self.pool).await?)
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let rows = sqlx::query_as::<_, BookInstance>(
            r#"
            SELECT id, book_id, imprint, due_back, status, borrower_id
            FROM book_instances
            WHERE book_id = $1
            ORDER BY due_back ASC NULLS LAST, id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            "SELECT id, book_id, imprint, due_back, status, borrower_id FROM book_instances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn create(&self, form: &BookInstanceForm) -> AppResult<BookInstance> {
        let row = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, status, borrower_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, book_id, imprint, due_back, status, borrower_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(form.book_id)
        .bind(&form.imprint)
        .bind(form.due_back)
        .bind(form.status)
        .bind(form.borrower_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_constraint(e, "Book instance already exists"))?;

        Ok(row)
    }

    async fn update(&self, id: Uuid, form: &BookInstanceForm) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET book_id = $1, imprint = $2, due_back = $3, status = $4, borrower_id = $5
            WHERE id = $6
            RETURNING id, book_id, imprint, due_back, status, borrower_id
            "#,
        )
        .bind(form.book_id)
        .bind(&form.imprint)
        .bind(form.due_back)
        .bind(form.status)
        .bind(form.borrower_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_constraint(e, "Book instance already exists"))?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn update_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances SET due_back = $1 WHERE id = $2
            RETURNING id, book_id, imprint, due_back, status, borrower_id
            "#,
        )
        .bind(due_back)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }
}
