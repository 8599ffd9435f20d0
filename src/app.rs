use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/checklist/:id/toggle", post(handlers::toggle_item_form))
        .route("/checklist/reset", post(handlers::reset_checklist_form))
        .route("/day/save", post(handlers::save_day_form))
        .route("/export.pdf", get(handlers::export_pdf))
        .route("/api/checklist", get(handlers::get_checklist))
        .route("/api/checklist/:id/toggle", post(handlers::toggle_item))
        .route("/api/checklist/reset", post(handlers::reset_checklist))
        .route("/api/day/save", post(handlers::save_day))
        .route("/api/history", get(handlers::get_history))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/share", get(handlers::get_share_link))
        .route("/api/share/import", post(handlers::import_share))
        .route("/api/share/report", post(handlers::report_share))
        .with_state(state)
}
