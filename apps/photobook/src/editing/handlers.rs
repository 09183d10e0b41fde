//! Axum route handlers for the Edit API.
//!
//! The service keeps no album state: each request carries the current pages
//! (and the photo metadata where an edit needs it) and gets the edited pages
//! back along with the history entry to append to the client's log.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::editing::history::EditHistoryEntry;
use crate::editing::operations::{
    delete_page, duplicate_page, reorder_pages, EditOperations, EditOutcome,
};
use crate::errors::AppError;
use crate::models::page::{fresh_page_id, renumber, Page};
use crate::models::photo::{photos_from_inputs, Photo, PhotoInput};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SwapRequest {
    pub pages: Vec<Page>,
    pub page_a: usize,
    pub frame_a: usize,
    pub page_b: usize,
    pub frame_b: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChangeLayoutRequest {
    pub photos: Vec<PhotoInput>,
    pub pages: Vec<Page>,
    pub page_index: usize,
    pub layout_name: String,
}

#[derive(Debug, Deserialize)]
pub struct MovePhotoRequest {
    pub photos: Vec<PhotoInput>,
    pub pages: Vec<Page>,
    pub src_page: usize,
    pub src_frame: usize,
    pub dst_page: usize,
    pub dst_position: usize,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub pages: Vec<Page>,
    pub from_index: usize,
    pub to_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct PageIndexRequest {
    pub pages: Vec<Page>,
    pub page_index: usize,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub pages: Vec<Page>,
    pub history_entry: EditHistoryEntry,
}

impl From<EditOutcome> for EditResponse {
    fn from(outcome: EditOutcome) -> Self {
        Self {
            pages: outcome.pages,
            history_entry: outcome.history_entry,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChangeLayoutResponse {
    pub pages: Vec<Page>,
    pub history_entry: EditHistoryEntry,
    /// Pages added at the end of the album for photos the new layout could not take.
    pub appended_pages: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/edits/swap
///
/// Photos are optional here: a swap never re-scores. Unknown fields are ignored.
pub async fn handle_swap(
    State(state): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let ops = EditOperations::new(&state.catalog, state.scorer.as_ref());
    let outcome = ops.swap_photos(
        &request.pages,
        request.page_a,
        request.frame_a,
        request.page_b,
        request.frame_b,
    )?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/edits/change-layout
///
/// Photos the new layout cannot hold are composed onto new pages at the end
/// of the album rather than dropped.
pub async fn handle_change_layout(
    State(state): State<AppState>,
    Json(request): Json<ChangeLayoutRequest>,
) -> Result<Json<ChangeLayoutResponse>, AppError> {
    let photos = parse_photos(request.photos)?;
    let ops = EditOperations::new(&state.catalog, state.scorer.as_ref());
    let outcome = ops.change_layout(
        &request.pages,
        request.page_index,
        &request.layout_name,
        &photos,
    )?;

    let mut pages = outcome.pages;
    let mut appended_pages = 0;
    if !outcome.unplaced.is_empty() {
        let leftovers: Vec<&Photo> = outcome
            .unplaced
            .iter()
            .filter_map(|id| photos.iter().find(|p| &p.id == id))
            .collect();
        let mut extra = state.composer(None).compose_refs(&leftovers);
        for page in &mut extra {
            page.id = fresh_page_id();
        }
        appended_pages = extra.len();
        pages.extend(extra);
        renumber(&mut pages);
    }

    Ok(Json(ChangeLayoutResponse {
        pages,
        history_entry: outcome.history_entry,
        appended_pages,
    }))
}

/// POST /api/v1/edits/move-photo
pub async fn handle_move_photo(
    State(state): State<AppState>,
    Json(request): Json<MovePhotoRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let photos = parse_photos(request.photos)?;
    let ops = EditOperations::new(&state.catalog, state.scorer.as_ref());
    let outcome = ops.move_photo_with_layout_adjustment(
        &request.pages,
        request.src_page,
        request.src_frame,
        request.dst_page,
        request.dst_position,
        &photos,
    )?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/edits/reorder
pub async fn handle_reorder(
    Json(request): Json<ReorderRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let outcome = reorder_pages(&request.pages, request.from_index, request.to_index)?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/edits/duplicate
pub async fn handle_duplicate(
    Json(request): Json<PageIndexRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let outcome = duplicate_page(&request.pages, request.page_index)?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/edits/delete
pub async fn handle_delete(
    Json(request): Json<PageIndexRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let outcome = delete_page(&request.pages, request.page_index)?;
    Ok(Json(outcome.into()))
}

pub(crate) fn parse_photos(inputs: Vec<PhotoInput>) -> Result<Vec<Photo>, AppError> {
    photos_from_inputs(inputs).map_err(AppError::Validation)
}
