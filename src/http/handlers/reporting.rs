use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    Json,
};
use serde::Deserialize;

use crate::{
    auth::SessionClaims,
    consent::state::current_epoch_seconds,
    http::error::AppError,
    reporting::{ChatMessageRecord, ChatThreadRecord, ThreadStore, WeeklySummary, DEFAULT_WEEKS_BACK},
};

use super::super::SharedContext;

const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Deserialize)]
pub struct WeeklyQuery {
    pub weeks_back: Option<usize>,
}

pub async fn list_threads<S>(
    Query(PageQuery { limit, offset }): Query<PageQuery>,
    headers: HeaderMap,
    State(ctx): State<SharedContext<S>>,
) -> Result<Json<Vec<ChatThreadRecord>>, AppError>
where
    S: ThreadStore + 'static,
{
    let user = admin_session(&ctx, &headers).await?;
    let threads = ctx.reporting.threads_page(
        &user,
        limit.unwrap_or(DEFAULT_PAGE_SIZE),
        offset.unwrap_or(0),
    )?;
    Ok(Json(threads))
}

pub async fn thread_messages<S>(
    Path(thread_id): Path<String>,
    headers: HeaderMap,
    State(ctx): State<SharedContext<S>>,
) -> Result<Json<Vec<ChatMessageRecord>>, AppError>
where
    S: ThreadStore + 'static,
{
    let user = admin_session(&ctx, &headers).await?;
    let messages = ctx.reporting.thread_messages(&user, &thread_id)?;
    Ok(Json(messages))
}

pub async fn weekly_summaries<S>(
    Query(WeeklyQuery { weeks_back }): Query<WeeklyQuery>,
    headers: HeaderMap,
    State(ctx): State<SharedContext<S>>,
) -> Result<Json<Vec<WeeklySummary>>, AppError>
where
    S: ThreadStore + 'static,
{
    let user = admin_session(&ctx, &headers).await?;
    let summaries = ctx
        .reporting
        .weekly_summaries(&user, weeks_back.unwrap_or(DEFAULT_WEEKS_BACK))?;
    Ok(Json(summaries))
}

/// Verify the caller's bearer session token. Authorization (the admin flag)
/// is enforced by the reporting service itself.
async fn admin_session<S>(
    ctx: &SharedContext<S>,
    headers: &HeaderMap,
) -> Result<SessionClaims, AppError>
where
    S: ThreadStore + 'static,
{
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized("missing bearer session token"))?;

    let signer = ctx.secrets.signer().await?;
    let claims = SessionClaims::verify(&signer, token, current_epoch_seconds())?;
    Ok(claims)
}
