//! Axum route handlers for the Album API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::editing::handlers::parse_photos;
use crate::editing::history::EditHistoryEntry;
use crate::errors::AppError;
use crate::layout::Strictness;
use crate::models::page::Page;
use crate::models::photo::PhotoInput;
use crate::planning::service::PlanSource;
use crate::planning::validation::PlanIssue;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

fn default_use_planner() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ComposeRequest {
    pub photos: Vec<PhotoInput>,
    /// Shuffles same-size layouts with this seed.
    pub seed: Option<u64>,
    /// Overrides ASSIGNMENT_STRICTNESS for this request.
    pub strictness: Option<Strictness>,
    #[serde(default = "default_use_planner")]
    pub use_planner: bool,
}

#[derive(Debug, Serialize)]
pub struct ComposeResponse {
    pub pages: Vec<Page>,
    pub source: PlanSource,
    pub issues: Vec<PlanIssue>,
}

#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    pub photos: Vec<PhotoInput>,
    pub pages: Vec<Page>,
    pub page_indices: Vec<usize>,
    #[serde(default = "default_use_planner")]
    pub use_planner: bool,
}

#[derive(Debug, Serialize)]
pub struct RegenerateResponse {
    pub pages: Vec<Page>,
    pub source: PlanSource,
    pub issues: Vec<PlanIssue>,
    pub history_entry: EditHistoryEntry,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/albums/compose
///
/// Lays out every photo, through the external planner when one is configured
/// and requested. Always succeeds for valid photo input.
pub async fn handle_compose(
    State(state): State<AppState>,
    Json(request): Json<ComposeRequest>,
) -> Result<Json<ComposeResponse>, AppError> {
    let photos = parse_photos(request.photos)?;
    if photos.is_empty() {
        return Err(AppError::Validation("photos cannot be empty".to_string()));
    }

    let mut planner = state.album_planner(request.use_planner, request.seed);
    if let Some(strictness) = request.strictness {
        planner = planner.with_strictness(strictness);
    }

    let outcome = planner.plan_album(&photos).await;
    info!(
        "Composed album: {} photos, {} pages, source {:?}",
        photos.len(),
        outcome.pages.len(),
        outcome.source
    );

    Ok(Json(ComposeResponse {
        pages: outcome.pages,
        source: outcome.source,
        issues: outcome.issues,
    }))
}

/// POST /api/v1/albums/regenerate
///
/// Re-plans the photos of the selected pages; the rest of the album is untouched.
pub async fn handle_regenerate(
    State(state): State<AppState>,
    Json(request): Json<RegenerateRequest>,
) -> Result<Json<RegenerateResponse>, AppError> {
    let photos = parse_photos(request.photos)?;

    let outcome = state
        .album_planner(request.use_planner, None)
        .regenerate_pages(&request.pages, &request.page_indices, &photos)
        .await?;

    Ok(Json(RegenerateResponse {
        pages: outcome.pages,
        source: outcome.source,
        issues: outcome.issues,
        history_entry: outcome.history_entry,
    }))
}
