use crate::errors::{AppError, ShareError};
use crate::export::export_snapshot;
use crate::models::{
    ChecklistResponse, DayHistoryEntry, HistoryResponse, ImportRequest, IndexQuery, ShareLinkQuery,
    ShareLinkResponse, ShareReportRequest, ShareReportResponse, StatsResponse,
};
use crate::share::{self, ShareMethod};
use crate::state::AppState;
use crate::stats::build_stats;
use crate::ui::{render_index, Notice};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use chrono::Local;
use tracing::{debug, info, warn};

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Response, AppError> {
    if let Some(token) = query.share {
        // Redirecting drops the token from the address bar so a reload does
        // not import it again.
        let notice = match apply_share_token(&state, &token).await {
            Ok(_) => Notice::ShareLoaded,
            Err(err) if err.status.is_client_error() => Notice::ShareInvalid,
            Err(err) => {
                warn!("shared history not saved: {}", err.message);
                Notice::ShareFailed
            }
        };
        return Ok(Redirect::to(&notice.redirect_path()).into_response());
    }

    let notice = query.notice.as_deref().and_then(Notice::parse);
    let session = state.session.lock().await;
    let stats = build_stats(&session.history);
    Ok(Html(render_index(&session.checklist, &stats, notice)).into_response())
}

pub async fn toggle_item_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Redirect {
    let mut session = state.session.lock().await;
    if !session.checklist.toggle(&id) {
        debug!("ignoring toggle for unknown item {id}");
    }
    Redirect::to("/")
}

pub async fn reset_checklist_form(State(state): State<AppState>) -> Redirect {
    state.session.lock().await.checklist.reset();
    Redirect::to(&Notice::ChecklistReset.redirect_path())
}

pub async fn save_day_form(State(state): State<AppState>) -> Result<Redirect, AppError> {
    save_today(&state).await?;
    Ok(Redirect::to(&Notice::DaySaved.redirect_path()))
}

pub async fn get_checklist(State(state): State<AppState>) -> Json<ChecklistResponse> {
    let session = state.session.lock().await;
    Json(session.checklist.to_response())
}

pub async fn toggle_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChecklistResponse>, AppError> {
    let mut session = state.session.lock().await;
    if !session.checklist.toggle(&id) {
        return Err(AppError::not_found(format!("unknown checklist item '{id}'")));
    }
    Ok(Json(session.checklist.to_response()))
}

pub async fn reset_checklist(State(state): State<AppState>) -> Json<ChecklistResponse> {
    let mut session = state.session.lock().await;
    session.checklist.reset();
    Json(session.checklist.to_response())
}

pub async fn save_day(State(state): State<AppState>) -> Result<Json<HistoryResponse>, AppError> {
    let history = save_today(&state).await?;
    Ok(Json(HistoryResponse { history }))
}

pub async fn get_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let session = state.session.lock().await;
    Json(HistoryResponse {
        history: session.history.entries().to_vec(),
    })
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let session = state.session.lock().await;
    Json(build_stats(&session.history))
}

pub async fn get_share_link(
    State(state): State<AppState>,
    Query(query): Query<ShareLinkQuery>,
) -> Result<Json<ShareLinkResponse>, AppError> {
    let method = ShareMethod::detect(query.native);
    let session = state.session.lock().await;
    let link = share::share_link(&state.public_url, session.history.entries(), method)
        .map_err(AppError::internal)?;
    Ok(Json(link))
}

pub async fn import_share(
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<HistoryResponse>, AppError> {
    let history = apply_share_token(&state, &payload.token).await?;
    Ok(Json(HistoryResponse { history }))
}

pub async fn report_share(Json(payload): Json<ShareReportRequest>) -> Json<ShareReportResponse> {
    let method = payload
        .method
        .as_deref()
        .and_then(ShareMethod::parse)
        .unwrap_or(ShareMethod::Clipboard);
    let err = ShareError::from_platform(payload.name.trim(), payload.message.trim());
    match &err {
        ShareError::Cancelled => debug!(method = method.as_str(), "share cancelled by user"),
        other => warn!(method = method.as_str(), "share failed: {other}"),
    }
    Json(ShareReportResponse {
        notice: err.notice(),
    })
}

pub async fn export_pdf(State(state): State<AppState>) -> Result<Response, AppError> {
    let today = Local::now().date_naive();
    let snapshot = state.session.lock().await.snapshot_at(today);

    let report = export_snapshot(&state.export, snapshot, today)
        .await
        .inspect_err(|err| warn!("export failed: {err}"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.file_name),
            ),
        ],
        report.bytes,
    )
        .into_response())
}

async fn save_today(state: &AppState) -> Result<Vec<DayHistoryEntry>, AppError> {
    let today = Local::now().date_naive();
    let mut session = state.session.lock().await;
    let history = session.save_day_on(today).await?.to_vec();
    info!(days = history.len(), "day saved");
    Ok(history)
}

#[tracing::instrument(skip_all, fields(token_len = token.len()))]
async fn apply_share_token(
    state: &AppState,
    token: &str,
) -> Result<Vec<DayHistoryEntry>, AppError> {
    let entries = share::decode(token).inspect_err(|err| warn!("rejected share token: {err}"))?;

    let mut session = state.session.lock().await;
    let replaced = session.history.len();
    session.replace_history(entries).await?;
    info!(
        replaced,
        imported = session.history.len(),
        "history replaced from share link"
    );
    Ok(session.history.entries().to_vec())
}
