//! Loan listings and renewal endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        pagination::{PageQuery, PaginatedInstances},
        renewal::{RenewBookForm, RenewalFormView, RenewalOutcome},
        user::Capability,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Where a successful renewal sends the librarian
pub const RENEWED_REDIRECT: &str = "/api/v1/borrowed";

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/mybooks",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Caller's borrowed copies, soonest due first", body = PaginatedInstances),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn my_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedInstances>> {
    let page = state.services.loans.borrowed_by(claims.user_id, query.page).await?;
    Ok(Json(page))
}

/// Every copy currently on loan
#[utoipa::path(
    get,
    path = "/borrowed",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All borrowed copies, soonest due first", body = PaginatedInstances),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn all_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedInstances>> {
    claims.require(Capability::MarkReturned)?;

    let page = state.services.loans.all_borrowed(query.page).await?;
    Ok(Json(page))
}

/// Renewal form with the proposed date
#[utoipa::path(
    get,
    path = "/book-instances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Unbound renewal form", body = RenewalFormView),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renewal_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalFormView>> {
    claims.require(Capability::MarkReturned)?;

    let view = state.services.loans.renewal_form(id).await?;
    Ok(Json(view))
}

/// Renew a borrowed copy
#[utoipa::path(
    post,
    path = "/book-instances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewBookForm,
    responses(
        (status = 303, description = "Renewed, redirect to the borrowed listing"),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Invalid date, form echoed with errors", body = RenewalFormView)
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(form): Json<RenewBookForm>,
) -> AppResult<Response> {
    claims.require(Capability::MarkReturned)?;

    match state.services.loans.renew(id, form).await? {
        RenewalOutcome::Renewed(_) => Ok(Redirect::to(RENEWED_REDIRECT).into_response()),
        RenewalOutcome::Rejected(view) => {
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response())
        }
    }
}
