use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod filter;
pub mod handlers;
pub mod sweep;
pub mod validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_jobs).post(handlers::create_job))
        .route("/cleanup", post(handlers::cleanup_jobs))
        .route(
            "/:id",
            get(handlers::get_job)
                .put(handlers::update_job)
                .delete(handlers::delete_job),
        )
}
