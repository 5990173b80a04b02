//! Catalog management service: authors, books, genres, languages and copies

use uuid::Uuid;
use validator::Validate;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetail, AuthorForm},
        book::{Book, BookDetail, BookForm, BookShort},
        book_instance::{BookInstance, BookInstanceForm, BorrowedInstance, InstanceFilter, InstanceQuery},
        genre::{CreateGenre, Genre},
        language::{CreateLanguage, Language},
        pagination::{PageWindow, Paginated},
    },
    repository::Repository,
    services::loans::today,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        Self { repository, config }
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self, page: Option<i64>) -> AppResult<Paginated<Author>> {
        let total = self.repository.authors.count().await?;
        let window = PageWindow::resolve(page, self.config.authors_per_page, total)?;
        let authors = self
            .repository
            .authors
            .list(window.limit(), window.offset())
            .await?;
        Ok(Paginated::new(authors, total, window))
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetail {
            display_name: author.to_string(),
            author,
            books,
        })
    }

    pub async fn create_author(&self, form: AuthorForm) -> AppResult<Author> {
        form.validate()?;
        let author = self.repository.authors.create(&form).await?;
        tracing::info!("Author {} created: {}", author.id, author);
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, form: AuthorForm) -> AppResult<Author> {
        form.validate()?;
        self.repository.authors.update(id, &form).await
    }

    /// Delete an author; their books keep existing without an author
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Author {} deleted", id);
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self, page: Option<i64>) -> AppResult<Paginated<BookShort>> {
        let total = self.repository.books.count().await?;
        let window = PageWindow::resolve(page, self.config.books_per_page, total)?;
        let books = self
            .repository
            .books
            .list(window.limit(), window.offset())
            .await?;
        Ok(Paginated::new(books, total, window))
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.repository.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(self.repository.authors.get_by_id(author_id).await?),
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => Some(self.repository.languages.get_by_id(language_id).await?),
            None => None,
        };
        let copies = self.repository.instances.list_for_book(id).await?;

        Ok(BookDetail {
            display_genre: book.display_genre(),
            book,
            author,
            language,
            copies,
        })
    }

    pub async fn create_book(&self, form: BookForm) -> AppResult<Book> {
        form.validate()?;
        let book = self.repository.books.create(&form).await?;
        tracing::info!("Book {} created: {}", book.id, book.title);
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, form: BookForm) -> AppResult<Book> {
        form.validate()?;
        self.repository.books.update(id, &form).await
    }

    /// Delete a book. Refused while copies of it exist.
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.get_by_id(id).await?;

        let filter = InstanceFilter {
            book_id: Some(id),
            ..Default::default()
        };
        let copies = self.repository.instances.count(&filter).await?;
        if copies > 0 {
            return Err(AppError::Conflict(format!(
                "Book {} still has {} copies",
                id, copies
            )));
        }

        self.repository.books.delete(id).await?;
        tracing::info!("Book {} deleted", id);
        Ok(())
    }

    // =========================================================================
    // GENRES & LANGUAGES
    // =========================================================================

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn create_genre(&self, data: CreateGenre) -> AppResult<Genre> {
        data.validate()?;
        self.repository.genres.create(data.name.trim()).await
    }

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.languages.list().await
    }

    pub async fn create_language(&self, data: CreateLanguage) -> AppResult<Language> {
        data.validate()?;
        self.repository.languages.create(data.name.trim()).await
    }

    // =========================================================================
    // BOOK INSTANCES
    // =========================================================================

    pub async fn list_instances(&self, query: &InstanceQuery) -> AppResult<Paginated<BorrowedInstance>> {
        let filter = InstanceFilter {
            status: query.status,
            borrower_id: None,
            book_id: query.book_id,
        };
        let total = self.repository.instances.count(&filter).await?;
        let window = PageWindow::resolve(query.page, self.config.loans_per_page, total)?;
        let today = today();
        let items = self
            .repository
            .instances
            .list(&filter, window.limit(), window.offset())
            .await?
            .into_iter()
            .map(|i| i.with_overdue(today))
            .collect();
        Ok(Paginated::new(items, total, window))
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.instances.get_by_id(id).await
    }

    pub async fn create_instance(&self, form: BookInstanceForm) -> AppResult<BookInstance> {
        form.validate()?;
        // surfaces a missing book as not found rather than a constraint error
        self.repository.books.get_by_id(form.book_id).await?;
        let instance = self.repository.instances.create(&form).await?;
        tracing::info!("Book instance {} created for book {}", instance.id, instance.book_id);
        Ok(instance)
    }

    pub async fn update_instance(&self, id: Uuid, form: BookInstanceForm) -> AppResult<BookInstance> {
        form.validate()?;
        self.repository.books.get_by_id(form.book_id).await?;
        self.repository.instances.update(id, &form).await
    }

    pub async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        self.repository.instances.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    use crate::{models::book::BookRow, repository::mock::MockRepository};

    fn config() -> CatalogConfig {
        CatalogConfig::default()
    }

    fn author(id: i32) -> Author {
        Author {
            id,
            first_name: "Isaac".to_string(),
            last_name: "Asimov".to_string(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    fn book(id: i32, author_id: Option<i32>) -> Book {
        Book::from_row(
            BookRow {
                id,
                title: "Foundation".to_string(),
                summary: "Psychohistory".to_string(),
                isbn: "9780553293357".to_string(),
                author_id,
                language_id: None,
            },
            vec![
                Genre { id: 1, name: "Science Fiction".to_string() },
                Genre { id: 2, name: "Classic".to_string() },
            ],
        )
    }

    #[tokio::test]
    async fn test_authors_one_per_page() {
        let mut repo = MockRepository::new();
        repo.authors.expect_count().returning(|| Ok(3));
        repo.authors
            .expect_list()
            .with(eq(1), eq(2))
            .returning(|_, _| Ok(vec![author(3)]));

        let service = CatalogService::new(repo.build(), config());
        let page = assert_ok!(service.list_authors(Some(3)).await);
        assert_eq!(page.items, vec![author(3)]);
        assert_eq!(page.num_pages, 3);
        assert!(page.has_previous);
    }

    #[tokio::test]
    async fn test_books_two_per_page() {
        let mut repo = MockRepository::new();
        repo.books.expect_count().returning(|| Ok(5));
        repo.books
            .expect_list()
            .with(eq(2), eq(0))
            .returning(|_, _| Ok(vec![]));

        let service = CatalogService::new(repo.build(), config());
        let page = assert_ok!(service.list_books(None).await);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.per_page, 2);
    }

    #[tokio::test]
    async fn test_book_detail_collects_relations() {
        let mut repo = MockRepository::new();
        repo.books.expect_get_by_id().returning(|id| Ok(book(id, Some(9))));
        repo.authors
            .expect_get_by_id()
            .with(eq(9))
            .returning(|id| Ok(author(id)));
        repo.languages.expect_get_by_id().never();
        repo.instances.expect_list_for_book().returning(|_| Ok(vec![]));

        let service = CatalogService::new(repo.build(), config());
        let detail = assert_ok!(service.get_book(1).await);
        assert_eq!(detail.display_genre, "Science Fiction, Classic");
        assert_eq!(detail.author, Some(author(9)));
        assert!(detail.language.is_none());
    }

    #[tokio::test]
    async fn test_delete_book_with_copies_is_refused() {
        let mut repo = MockRepository::new();
        repo.books.expect_get_by_id().returning(|id| Ok(book(id, None)));
        repo.instances
            .expect_count()
            .withf(|f| f.book_id == Some(1) && f.status.is_none())
            .returning(|_| Ok(2));
        repo.books.expect_delete().never();

        let service = CatalogService::new(repo.build(), config());
        assert!(matches!(assert_err!(service.delete_book(1).await), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invalid_author_is_not_stored() {
        let mut repo = MockRepository::new();
        repo.authors.expect_create().never();

        let service = CatalogService::new(repo.build(), config());
        let form = AuthorForm {
            first_name: String::new(),
            last_name: "Asimov".to_string(),
            date_of_birth: None,
            date_of_death: None,
        };
        assert!(matches!(assert_err!(service.create_author(form).await), AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_author_detail_lists_books() {
        let mut repo = MockRepository::new();
        repo.authors.expect_get_by_id().returning(|id| Ok(author(id)));
        repo.books.expect_list_by_author().with(eq(4)).returning(|id| {
            Ok(vec![BookShort {
                id: 1,
                title: "I, Robot".to_string(),
                author_id: Some(id),
                author_name: Some("Asimov, Isaac".to_string()),
            }])
        });

        let service = CatalogService::new(repo.build(), config());
        let detail = assert_ok!(service.get_author(4).await);
        assert_eq!(detail.display_name, "Asimov, Isaac");
        assert_eq!(detail.books.len(), 1);
    }

    #[tokio::test]
    async fn test_create_instance_for_missing_book() {
        let mut repo = MockRepository::new();
        repo.books
            .expect_get_by_id()
            .returning(|id| Err(AppError::NotFound(format!("Book with id {} not found", id))));
        repo.instances.expect_create().never();

        let service = CatalogService::new(repo.build(), config());
        let form = BookInstanceForm {
            book_id: 42,
            imprint: "Bantam, 1991".to_string(),
            due_back: None,
            status: Default::default(),
            borrower_id: None,
        };
        assert!(matches!(assert_err!(service.create_instance(form).await), AppError::NotFound(_)));
    }
}
