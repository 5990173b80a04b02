//! Catalog home page

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{error::AppResult, models::stats::IndexResponse, AppState};

/// Catalog counts and the visitor's visit counter
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    responses(
        (status = 200, description = "Home page counts; sets the session cookie on first visit", body = IndexResponse)
    )
)]
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<IndexResponse>)> {
    let sessions = &state.services.sessions;
    let cookie_name = sessions.cookie_name().to_string();

    let mut session = sessions
        .open(jar.get(&cookie_name).map(|c| c.value()))
        .await?;
    let response = state.services.stats.index(&mut session).await?;
    sessions.commit(&session).await?;

    let jar = if session.is_new() {
        jar.add(
            Cookie::build((cookie_name, session.id().to_string()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax),
        )
    } else {
        jar
    };

    Ok((jar, Json(response)))
}
