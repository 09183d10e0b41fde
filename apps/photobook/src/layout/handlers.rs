//! Axum route handlers for the Layout API (read-only catalog access).

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::layout::catalog::Layout;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LayoutListResponse {
    pub fallback: String,
    pub layouts: Vec<Layout>,
}

/// GET /api/v1/layouts
pub async fn handle_list_layouts(State(state): State<AppState>) -> Json<LayoutListResponse> {
    Json(LayoutListResponse {
        fallback: state.catalog.fallback_layout().name.clone(),
        layouts: state.catalog.list_layouts().to_vec(),
    })
}

/// GET /api/v1/layouts/:name
pub async fn handle_get_layout(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Layout>, AppError> {
    let layout = state.catalog.get_layout(&name)?;
    Ok(Json(layout.clone()))
}
