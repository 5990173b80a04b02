//! API handlers for the catalog REST endpoints

pub mod auth;
pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod health;
pub mod home;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Home page
        .route("/catalog", get(home::index))
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route("/authors/new", get(authors::new_author_form))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Genres & languages
        .route("/genres", get(genres::list_genres).post(genres::create_genre))
        .route("/languages", get(genres::list_languages).post(genres::create_language))
        // Book instances
        .route(
            "/book-instances",
            get(book_instances::list_instances).post(book_instances::create_instance),
        )
        .route(
            "/book-instances/:id",
            get(book_instances::get_instance)
                .put(book_instances::update_instance)
                .delete(book_instances::delete_instance),
        )
        // Loans
        .route("/book-instances/:id/renew", get(loans::renewal_form).post(loans::renew))
        .route("/mybooks", get(loans::my_books))
        .route("/borrowed", get(loans::all_borrowed))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        models::{
            book_instance::{BookInstance, LoanStatus},
            user::Capability,
        },
        repository::mock::MockRepository,
        services::{loans::today, sessions::MockSessionStore, Services},
    };

    fn app(repo: MockRepository, store: MockSessionStore) -> Router {
        let config = AppConfig::default();
        let services = Services::new(repo.build(), Arc::new(store), &config);
        router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }

    fn token(capabilities: &[Capability]) -> String {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: "librarian".to_string(),
            user_id: 2,
            capabilities: capabilities.iter().map(|c| c.as_str().to_string()).collect(),
            exp: now + 3600,
            iat: now,
        };
        claims.create_token(&AppConfig::default().auth.jwt_secret).unwrap()
    }

    fn instance(id: Uuid) -> BookInstance {
        BookInstance {
            id,
            book_id: 1,
            imprint: "Penguin, 2003".to_string(),
            due_back: Some(today()),
            status: LoanStatus::OnLoan,
            borrower_id: Some(5),
        }
    }

    fn renew_request(id: Uuid, token: Option<&str>, date: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/book-instances/{}/renew", id))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
            .body(Body::from(json!({ "renewal_date": date }).to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_valid_renewal_redirects_to_borrowed() {
        let id = Uuid::new_v4();
        let proposed = today() + Duration::weeks(1);
        let mut repo = MockRepository::new();
        repo.instances.expect_get_by_id().returning(|id| Ok(instance(id)));
        repo.instances
            .expect_update_due_back()
            .withf(move |i, d| *i == id && *d == proposed)
            .times(1)
            .returning(|id, date| {
                let mut renewed = instance(id);
                renewed.due_back = Some(date);
                Ok(renewed)
            });

        let token = token(&[Capability::MarkReturned]);
        let response = app(repo, MockSessionStore::new())
            .oneshot(renew_request(id, Some(&token), &proposed.format("%Y-%m-%d").to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/api/v1/borrowed");
    }

    #[tokio::test]
    async fn test_invalid_renewal_echoes_form() {
        let id = Uuid::new_v4();
        let past = today() - Duration::days(1);
        let mut repo = MockRepository::new();
        repo.instances.expect_get_by_id().returning(|id| Ok(instance(id)));
        repo.instances.expect_update_due_back().never();

        let token = token(&[Capability::MarkReturned]);
        let response = app(repo, MockSessionStore::new())
            .oneshot(renew_request(id, Some(&token), &past.format("%Y-%m-%d").to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["renewal_date"], past.format("%Y-%m-%d").to_string());
        assert_eq!(body["errors"]["renewal_date"][0], "Invalid date - renewal in past");
        assert_eq!(body["book_instance"]["id"], id.to_string());
    }

    #[tokio::test]
    async fn test_renewal_requires_login() {
        let mut repo = MockRepository::new();
        repo.instances.expect_get_by_id().never();

        let response = app(repo, MockSessionStore::new())
            .oneshot(renew_request(Uuid::new_v4(), None, "2030-01-01"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_renewal_requires_capability() {
        let mut repo = MockRepository::new();
        repo.instances.expect_get_by_id().never();
        repo.instances.expect_update_due_back().never();

        let token = token(&[Capability::Manage]);
        let response = app(repo, MockSessionStore::new())
            .oneshot(renew_request(Uuid::new_v4(), Some(&token), "2030-01-01"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["error"], "NotAuthorized");
        assert_eq!(body["code"], 3);
    }

    #[tokio::test]
    async fn test_renewal_form_proposes_three_weeks() {
        let id = Uuid::new_v4();
        let mut repo = MockRepository::new();
        repo.instances.expect_get_by_id().returning(|id| Ok(instance(id)));

        let token = token(&[Capability::MarkReturned]);
        let request = Request::builder()
            .uri(format!("/api/v1/book-instances/{}/renew", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = app(repo, MockSessionStore::new()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let expected = (today() + Duration::weeks(3)).format("%Y-%m-%d").to_string();
        assert_eq!(body["renewal_date"], expected);
        assert_eq!(body["label"], "renewal date");
    }

    #[tokio::test]
    async fn test_home_page_counts_and_session_cookie() {
        let mut repo = MockRepository::new();
        repo.books.expect_count().returning(|| Ok(5));
        repo.books.expect_count_title_contains().returning(|_| Ok(1));
        repo.instances.expect_count().returning(|f| {
            Ok(match f.status {
                Some(LoanStatus::Available) => 2,
                _ => 7,
            })
        });
        repo.authors.expect_count().returning(|| Ok(3));
        repo.genres.expect_count().returning(|| Ok(4));

        let mut store = MockSessionStore::new();
        store.expect_load().never();
        store.expect_save().times(1).returning(|_, _, _| Ok(()));

        let request = Request::builder()
            .uri("/api/v1/catalog")
            .body(Body::empty())
            .unwrap();
        let response = app(repo, store).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("sessionid="));

        let body = json_body(response).await;
        assert_eq!(body["num_books"], 5);
        assert_eq!(body["num_instances"], 7);
        assert_eq!(body["num_instances_available"], 2);
        assert_eq!(body["num_visits"], 0);
    }

    #[tokio::test]
    async fn test_page_out_of_range_is_not_found() {
        let mut repo = MockRepository::new();
        repo.books.expect_count().returning(|| Ok(3));
        repo.books.expect_list().never();

        let request = Request::builder()
            .uri("/api/v1/books?page=3")
            .body(Body::empty())
            .unwrap();
        let response = app(repo, MockSessionStore::new()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
