//! Book instance (copy) administration endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{BookInstance, BookInstanceForm, InstanceQuery},
        pagination::PaginatedInstances,
        user::Capability,
    },
    AppState,
};

use super::AuthenticatedUser;

/// List copies, optionally filtered by status or book
#[utoipa::path(
    get,
    path = "/book-instances",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(InstanceQuery),
    responses(
        (status = 200, description = "Page of copies", body = PaginatedInstances),
        (status = 403, description = "Missing catalog.can_manage"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_instances(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<InstanceQuery>,
) -> AppResult<Json<PaginatedInstances>> {
    claims.require(Capability::Manage)?;

    let page = state.services.catalog.list_instances(&query).await?;
    Ok(Json(page))
}

/// Get copy
#[utoipa::path(
    get,
    path = "/book-instances/{id}",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy details", body = BookInstance),
        (status = 403, description = "Missing catalog.can_manage"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn get_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    claims.require(Capability::Manage)?;

    let instance = state.services.catalog.get_instance(id).await?;
    Ok(Json(instance))
}

/// Create copy
#[utoipa::path(
    post,
    path = "/book-instances",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    request_body = BookInstanceForm,
    responses(
        (status = 201, description = "Copy created", body = BookInstance),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Missing catalog.can_manage"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    claims.require(Capability::Manage)?;

    let instance = state.services.catalog.create_instance(form).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// Update copy
#[utoipa::path(
    put,
    path = "/book-instances/{id}",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = BookInstanceForm,
    responses(
        (status = 200, description = "Copy updated", body = BookInstance),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Missing catalog.can_manage"),
        (status = 404, description = "Book instance or book not found")
    )
)]
pub async fn update_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<Json<BookInstance>> {
    claims.require(Capability::Manage)?;

    let instance = state.services.catalog.update_instance(id, form).await?;
    Ok(Json(instance))
}

/// Delete copy
#[utoipa::path(
    delete,
    path = "/book-instances/{id}",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 204, description = "Copy deleted"),
        (status = 403, description = "Missing catalog.can_manage"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn delete_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require(Capability::Manage)?;

    state.services.catalog.delete_instance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
