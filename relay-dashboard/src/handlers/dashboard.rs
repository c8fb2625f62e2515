//! Dashboard page handlers
//!
//! Each request resolves the cookie's session, applies at most one
//! transition and renders the resulting view.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, Response},
    Form,
};
use relay_core::{ModelRegistry, Section, SessionContext, Transition};
use serde::Deserialize;

use crate::session::{SessionCookie, SessionHandle, SessionStore};
use crate::{views, AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub section: Option<String>,
}

/// Render the dashboard; `?section=` switches section
pub async fn index(
    State(state): State<AppState>,
    cookie: SessionCookie,
    Query(query): Query<IndexQuery>,
) -> AppResult<Response> {
    let session = state.sessions.open(&cookie);
    let sessions = state.sessions.clone();

    let page = render(state, session.clone(), move |ctx, models| {
        if let Some(choice) = query.section {
            ctx.apply(Transition::ChangeSection(Section::from_choice(&choice)), models)?;
        }
        Ok(())
    })
    .await;

    finish(&sessions, &session, page)
}

/// Form submission for one section
pub async fn predict(
    State(state): State<AppState>,
    cookie: SessionCookie,
    Path(slug): Path<String>,
    Form(fields): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let section = Section::from_slug(&slug)
        .ok_or_else(|| AppError::NotFound(format!("Unknown section '{}'", slug)))?;
    let record = section.form().parse_submission(&fields)?;

    let session = state.sessions.open(&cookie);
    let sessions = state.sessions.clone();
    let page = render(state, session.clone(), move |ctx, models| {
        ctx.apply(Transition::Submit(record), models)?;
        Ok(())
    })
    .await;

    finish(&sessions, &session, page)
}

/// Accumulated overall rows as CSV
pub async fn export_overall(
    State(state): State<AppState>,
    cookie: SessionCookie,
) -> AppResult<Response> {
    let session = state.sessions.open(&cookie);
    let csv = session
        .context
        .lock()
        .accumulator()
        .to_csv()
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(session.respond((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"overall_rows.csv\""),
        ],
        csv,
    )))
}

/// Send the page, or drop a session this failed request just created
fn finish(sessions: &SessionStore, session: &SessionHandle, page: AppResult<String>) -> AppResult<Response> {
    match page {
        Ok(page) => Ok(session.respond(Html(page))),
        Err(e) => {
            sessions.discard(session);
            Err(e)
        }
    }
}

/// Apply `update` and render the page off the async runtime; prediction and
/// chart rendering both block.
async fn render<F>(state: AppState, session: SessionHandle, update: F) -> AppResult<String>
where
    F: FnOnce(&mut SessionContext, &ModelRegistry) -> AppResult<()> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut ctx = session.context.lock();
        update(&mut ctx, &state.models)?;
        let view = ctx.view(&state.analytics);
        tracing::debug!(session = %session.id, summary = ?view.summary(), "Rendered view");
        Ok(views::page(&view).into_string())
    })
    .await?
}
