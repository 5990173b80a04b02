//! API integration tests
//!
//! Run against a live server with a provisioned account holding both
//! catalog capabilities (`demos/seed.sql` creates librarian/librarian):
//! `CATALOG_TEST_USERNAME=... CATALOG_TEST_PASSWORD=... cargo test -- --ignored`

use chrono::{Duration, Local};
use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn credentials() -> (String, String) {
    (
        std::env::var("CATALOG_TEST_USERNAME").unwrap_or_else(|_| "librarian".to_string()),
        std::env::var("CATALOG_TEST_PASSWORD").unwrap_or_else(|_| "librarian".to_string()),
    )
}

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client) -> String {
    let (username, password) = credentials();
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

fn no_redirect_client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": credentials().0,
            "password": "definitely-wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], credentials().0);
    assert!(body.get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_home_page_counts_visits() {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client");

    let first: Value = client
        .get(format!("{}/catalog", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let second: Value = client
        .get(format!("{}/catalog", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(first["num_visits"], 0);
    assert_eq!(second["num_visits"], 1);
    assert!(first["num_books"].is_i64());
}

#[tokio::test]
#[ignore]
async fn test_catalog_lifecycle_and_renewal() {
    let client = no_redirect_client();
    let token = get_auth_token(&client).await;

    // Author
    let response = client
        .post(format!("{}/authors", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "first_name": "Ursula", "last_name": "Le Guin", "date_of_birth": "1929-10-21" }))
        .send()
        .await
        .expect("Failed to create author");
    assert_eq!(response.status(), StatusCode::CREATED);
    let author: Value = response.json().await.expect("Failed to parse author");
    let author_id = author["id"].as_i64().expect("No author id");

    // Book
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "The Dispossessed",
            "summary": "An ambiguous utopia",
            "isbn": "9780061054884",
            "author_id": author_id
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = response.json().await.expect("Failed to parse book");
    let book_id = book["id"].as_i64().expect("No book id");

    // Copy on loan
    let response = client
        .post(format!("{}/book-instances", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "book_id": book_id,
            "imprint": "Harper Voyager, 1994",
            "due_back": Local::now().date_naive().to_string(),
            "status": "on_loan"
        }))
        .send()
        .await
        .expect("Failed to create copy");
    assert_eq!(response.status(), StatusCode::CREATED);
    let copy: Value = response.json().await.expect("Failed to parse copy");
    let copy_id = copy["id"].as_str().expect("No copy id").to_string();

    // Book with copies cannot be deleted
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Renewal too far ahead is refused
    let too_late = Local::now().date_naive() + Duration::weeks(5);
    let response = client
        .post(format!("{}/book-instances/{}/renew", BASE_URL, copy_id))
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": too_late.to_string() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Valid renewal redirects to the borrowed listing
    let renewal = Local::now().date_naive() + Duration::weeks(2);
    let response = client
        .post(format!("{}/book-instances/{}/renew", BASE_URL, copy_id))
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": renewal.to_string() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/api/v1/borrowed");

    let copy: Value = client
        .get(format!("{}/book-instances/{}", BASE_URL, copy_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse copy");
    assert_eq!(copy["due_back"], renewal.to_string());

    // Cleanup
    for url in [
        format!("{}/book-instances/{}", BASE_URL, copy_id),
        format!("{}/books/{}", BASE_URL, book_id),
        format!("{}/authors/{}", BASE_URL, author_id),
    ] {
        let response = client
            .delete(url)
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/borrowed", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
