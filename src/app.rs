use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::shift_page))
        .route("/directory", get(handlers::directory_page))
        .route("/urls", get(handlers::url_page))
        .route("/refresh", post(handlers::refresh))
        .route("/upload", post(handlers::upload))
        .route("/shifts/check", post(handlers::toggle_check))
        .route("/urls/save", post(handlers::save_entry))
        .route("/urls/delete", post(handlers::delete_entry))
        .route("/api/shifts", get(handlers::api_shifts).post(handlers::api_upload_rows))
        .route("/api/shifts/check", post(handlers::api_check))
        .route("/api/directory", get(handlers::api_directory).post(handlers::api_add_entry))
        .route("/api/directory/groups", get(handlers::api_directory_groups))
        .route("/api/directory/update", post(handlers::api_update_entry))
        .route("/api/directory/delete", post(handlers::api_delete_entry))
        .with_state(state)
}
