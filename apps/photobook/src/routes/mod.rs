pub mod health;

use axum::{routing::get, routing::post, Router};

use crate::editing::handlers as edits;
use crate::layout::handlers as layouts;
use crate::planning::handlers as albums;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Layout API
        .route("/api/v1/layouts", get(layouts::handle_list_layouts))
        .route("/api/v1/layouts/:name", get(layouts::handle_get_layout))
        // Album API
        .route("/api/v1/albums/compose", post(albums::handle_compose))
        .route("/api/v1/albums/regenerate", post(albums::handle_regenerate))
        // Edit API
        .route("/api/v1/edits/swap", post(edits::handle_swap))
        .route("/api/v1/edits/change-layout", post(edits::handle_change_layout))
        .route("/api/v1/edits/move-photo", post(edits::handle_move_photo))
        .route("/api/v1/edits/reorder", post(edits::handle_reorder))
        .route("/api/v1/edits/duplicate", post(edits::handle_duplicate))
        .route("/api/v1/edits/delete", post(edits::handle_delete))
        .with_state(state)
}
