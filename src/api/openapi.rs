//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, book_instances, books, genres, health, home, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library Catalog API",
        version = "0.1.0",
        description = "Catalog of authors, books and their copies, with loan renewal"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Home
        home::index,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::new_author_form,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Genres & languages
        genres::list_genres,
        genres::create_genre,
        genres::list_languages,
        genres::create_language,
        // Book instances
        book_instances::list_instances,
        book_instances::get_instance,
        book_instances::create_instance,
        book_instances::update_instance,
        book_instances::delete_instance,
        // Loans
        loans::my_books,
        loans::all_borrowed,
        loans::renewal_form,
        loans::renew,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::User,
            crate::models::user::Capability,
            // Home
            crate::models::stats::CatalogCounts,
            crate::models::stats::IndexResponse,
            // Catalog
            crate::models::author::Author,
            crate::models::author::AuthorDetail,
            crate::models::author::AuthorForm,
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::BookDetail,
            crate::models::book::BookForm,
            crate::models::genre::Genre,
            crate::models::genre::CreateGenre,
            crate::models::language::Language,
            crate::models::language::CreateLanguage,
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::BorrowedInstance,
            crate::models::book_instance::BookInstanceForm,
            // Pagination
            crate::models::pagination::PaginatedAuthors,
            crate::models::pagination::PaginatedBooks,
            crate::models::pagination::PaginatedInstances,
            // Renewal
            crate::models::renewal::RenewBookForm,
            crate::models::renewal::RenewalFormView,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "catalog", description = "Catalog home page"),
        (name = "authors", description = "Author management"),
        (name = "books", description = "Book management"),
        (name = "genres", description = "Genres and languages"),
        (name = "book-instances", description = "Copy administration"),
        (name = "loans", description = "Borrowed copies and renewals")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
