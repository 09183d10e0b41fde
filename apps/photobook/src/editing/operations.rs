//! Edit Operations: copy-on-write mutations of an album's page list.
//!
//! Every operation borrows the current pages and returns a new list; the input
//! is never touched, and a failed operation changes nothing. Only the pages an
//! operation names are rebuilt.
//!
//! Page indices are 0-based positions in the list. Frame indices are the
//! 1-based frame numbers stored in `Assignment::frame_index`.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::editing::history::{EditHistoryEntry, EditOperation};
use crate::layout::assigner::{force_fill, greedy_match};
use crate::layout::catalog::{CatalogError, Layout, LayoutCatalog};
use crate::layout::fit::FitScorer;
use crate::models::page::{fresh_page_id, renumber, Page};
use crate::models::photo::Photo;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Layout not found: {0}")]
    LayoutNotFound(String),

    #[error("Cannot delete the last remaining page")]
    CannotDeleteLast,

    #[error("Unsatisfiable: {0}")]
    Unsatisfiable(String),

    #[error("Page references unknown photo '{0}'")]
    UnknownPhoto(String),

    #[error("Layout catalog error: {0}")]
    Catalog(String),
}

impl From<CatalogError> for EditError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::LayoutNotFound(name) => EditError::LayoutNotFound(name),
            other => EditError::Catalog(other.to_string()),
        }
    }
}

/// New page list plus the history record describing the edit.
#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub pages: Vec<Page>,
    pub history_entry: EditHistoryEntry,
}

/// Result of `change_layout`. Photos the new layout could not take are
/// returned in `unplaced`, never dropped.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeLayoutOutcome {
    pub pages: Vec<Page>,
    pub unplaced: Vec<String>,
    pub history_entry: EditHistoryEntry,
}

// ────────────────────────────────────────────────────────────────────────────
// Operations that re-solve page contents
// ────────────────────────────────────────────────────────────────────────────

/// Edit operations that need the catalog (frame geometry) or the scorer.
pub struct EditOperations<'a> {
    catalog: &'a LayoutCatalog,
    scorer: &'a dyn FitScorer,
}

impl<'a> EditOperations<'a> {
    pub fn new(catalog: &'a LayoutCatalog, scorer: &'a dyn FitScorer) -> Self {
        Self { catalog, scorer }
    }

    /// Exchanges the occupants of two frames, on one page or across two.
    ///
    /// Either frame may be empty, in which case the photo simply moves. Running
    /// the same swap twice restores the original assignments.
    pub fn swap_photos(
        &self,
        pages: &[Page],
        page_a: usize,
        frame_a: usize,
        page_b: usize,
        frame_b: usize,
    ) -> Result<EditOutcome, EditError> {
        check_page(pages, page_a)?;
        check_page(pages, page_b)?;
        self.check_frame(&pages[page_a], page_a, frame_a)?;
        self.check_frame(&pages[page_b], page_b, frame_b)?;

        let mut new_pages = pages.to_vec();
        let photo_a = pages[page_a].photo_at(frame_a).map(str::to_owned);
        let photo_b = pages[page_b].photo_at(frame_b).map(str::to_owned);

        new_pages[page_a].set_photo(frame_a, photo_b.clone());
        new_pages[page_b].set_photo(frame_b, photo_a.clone());

        debug!(
            "Swapped page {} frame {} ({:?}) with page {} frame {} ({:?})",
            page_a, frame_a, photo_a, page_b, frame_b, photo_b
        );

        Ok(EditOutcome {
            pages: new_pages,
            history_entry: EditHistoryEntry::new(
                EditOperation::SwapPhotos,
                Some(page_a),
                json!({
                    "page_a": page_a,
                    "frame_a": frame_a,
                    "page_b": page_b,
                    "frame_b": frame_b,
                    "photo_a": photo_a,
                    "photo_b": photo_b,
                }),
            ),
        })
    }

    /// Re-lays out one page's photos on a different layout.
    pub fn change_layout(
        &self,
        pages: &[Page],
        page_index: usize,
        layout_name: &str,
        photos: &[Photo],
    ) -> Result<ChangeLayoutOutcome, EditError> {
        check_page(pages, page_index)?;
        let layout = self.catalog.get_layout(layout_name)?;

        let lookup = photo_lookup(photos);
        let page = &pages[page_index];
        let page_photos = resolve(&lookup, &page.photo_ids())?;

        let matching = greedy_match(&page_photos, &layout.frames, self.scorer);

        let mut new_pages = pages.to_vec();
        new_pages[page_index] = Page::new(
            page.id.clone(),
            page.page_number,
            layout.name.clone(),
            matching.assignments,
        );

        if !matching.unmatched_photos.is_empty() {
            debug!(
                "Layout {} left {} photos unplaced on page {}",
                layout.name,
                matching.unmatched_photos.len(),
                page_index
            );
        }

        Ok(ChangeLayoutOutcome {
            pages: new_pages,
            history_entry: EditHistoryEntry::new(
                EditOperation::ChangeLayout,
                Some(page_index),
                json!({
                    "from_layout": page.layout_name,
                    "to_layout": layout.name,
                    "unplaced": matching.unmatched_photos,
                }),
            ),
            unplaced: matching.unmatched_photos,
        })
    }

    /// Moves a photo to another page and re-picks both pages' layouts for their
    /// new photo counts.
    ///
    /// `dst_position` is the position in the destination page's photo list
    /// (frame order) and is clamped to its length. A source page left without
    /// photos is kept with no assignments.
    pub fn move_photo_with_layout_adjustment(
        &self,
        pages: &[Page],
        src_page: usize,
        src_frame: usize,
        dst_page: usize,
        dst_position: usize,
        photos: &[Photo],
    ) -> Result<EditOutcome, EditError> {
        check_page(pages, src_page)?;
        check_page(pages, dst_page)?;

        let source = &pages[src_page];
        let moved = source
            .photo_at(src_frame)
            .ok_or_else(|| {
                EditError::OutOfRange(format!(
                    "frame {src_frame} on page {src_page} holds no photo"
                ))
            })?
            .to_owned();

        let lookup = photo_lookup(photos);
        let mut new_pages = pages.to_vec();

        if src_page == dst_page {
            let mut ids = source.photo_ids();
            ids.retain(|id| id != &moved);
            ids.insert(dst_position.min(ids.len()), moved.clone());

            let layout = self.catalog.get_layout(&source.layout_name)?;
            new_pages[src_page] = self.rebuild_page(source, layout, &ids, &lookup)?;
        } else {
            let mut src_ids = source.photo_ids();
            src_ids.retain(|id| id != &moved);

            let mut dst_ids = pages[dst_page].photo_ids();
            dst_ids.insert(dst_position.min(dst_ids.len()), moved.clone());

            let src_layout = self.layout_for_count(src_ids.len())?;
            let dst_layout = self.layout_for_count(dst_ids.len())?;

            new_pages[src_page] = self.rebuild_page(source, src_layout, &src_ids, &lookup)?;
            new_pages[dst_page] =
                self.rebuild_page(&pages[dst_page], dst_layout, &dst_ids, &lookup)?;
        }

        debug!(
            "Moved photo {} from page {} to page {}",
            moved, src_page, dst_page
        );

        Ok(EditOutcome {
            history_entry: EditHistoryEntry::new(
                EditOperation::MovePhotoCrossPage,
                Some(src_page),
                json!({
                    "photo_id": moved,
                    "src_page": src_page,
                    "src_frame": src_frame,
                    "dst_page": dst_page,
                    "dst_position": dst_position,
                    "src_layout": new_pages[src_page].layout_name,
                    "dst_layout": new_pages[dst_page].layout_name,
                }),
            ),
            pages: new_pages,
        })
    }

    fn layout_for_count(&self, count: usize) -> Result<&'a Layout, EditError> {
        let name = self.catalog.find_layout_for_frame_count(count);
        let layout = self.catalog.get_layout(name)?;
        if layout.frame_count < count {
            return Err(EditError::Unsatisfiable(format!(
                "no layout has room for {count} photos (largest match: {} with {} frames)",
                layout.name, layout.frame_count
            )));
        }
        Ok(layout)
    }

    /// Rebuilds a page on `layout` holding exactly `ids`, forcing any photo the
    /// scorer rejects into a remaining frame so nothing is lost.
    fn rebuild_page(
        &self,
        page: &Page,
        layout: &Layout,
        ids: &[String],
        lookup: &HashMap<&str, &Photo>,
    ) -> Result<Page, EditError> {
        let page_photos = resolve(lookup, ids)?;
        let matching = force_fill(greedy_match(&page_photos, &layout.frames, self.scorer));

        if !matching.unmatched_photos.is_empty() {
            return Err(EditError::Unsatisfiable(format!(
                "layout {} cannot hold {} photos",
                layout.name,
                ids.len()
            )));
        }

        Ok(Page::new(
            page.id.clone(),
            page.page_number,
            layout.name.clone(),
            matching.assignments,
        ))
    }

    fn check_frame(&self, page: &Page, page_index: usize, frame: usize) -> Result<(), EditError> {
        let layout = self.catalog.get_layout(&page.layout_name)?;
        if layout.frame(frame).is_none() {
            return Err(EditError::OutOfRange(format!(
                "frame {frame} on page {page_index} (layout {} has frames 1..={})",
                layout.name, layout.frame_count
            )));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page-level list operations
// ────────────────────────────────────────────────────────────────────────────

/// Moves one page to a new position and renumbers every page.
pub fn reorder_pages(pages: &[Page], from: usize, to: usize) -> Result<EditOutcome, EditError> {
    check_page(pages, from)?;
    check_page(pages, to)?;

    let mut new_pages = pages.to_vec();
    let page = new_pages.remove(from);
    new_pages.insert(to, page);
    renumber(&mut new_pages);

    Ok(EditOutcome {
        pages: new_pages,
        history_entry: EditHistoryEntry::new(
            EditOperation::ReorderPages,
            Some(from),
            json!({ "from_index": from, "to_index": to }),
        ),
    })
}

/// Inserts a copy of a page (fresh id, same assignments) right after it.
pub fn duplicate_page(pages: &[Page], index: usize) -> Result<EditOutcome, EditError> {
    check_page(pages, index)?;

    let mut copy = pages[index].clone();
    copy.id = fresh_page_id();
    let new_id = copy.id.clone();

    let mut new_pages = pages.to_vec();
    new_pages.insert(index + 1, copy);
    renumber(&mut new_pages);

    Ok(EditOutcome {
        pages: new_pages,
        history_entry: EditHistoryEntry::new(
            EditOperation::DuplicatePage,
            Some(index),
            json!({ "source_page_id": pages[index].id, "new_page_id": new_id }),
        ),
    })
}

/// Removes a page. The last remaining page cannot be deleted.
pub fn delete_page(pages: &[Page], index: usize) -> Result<EditOutcome, EditError> {
    check_page(pages, index)?;
    if pages.len() == 1 {
        return Err(EditError::CannotDeleteLast);
    }

    let mut new_pages = pages.to_vec();
    let removed = new_pages.remove(index);
    renumber(&mut new_pages);

    Ok(EditOutcome {
        pages: new_pages,
        history_entry: EditHistoryEntry::new(
            EditOperation::DeletePage,
            Some(index),
            json!({ "page_id": removed.id, "photo_ids": removed.photo_ids() }),
        ),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn check_page(pages: &[Page], index: usize) -> Result<(), EditError> {
    if index >= pages.len() {
        return Err(EditError::OutOfRange(format!(
            "page {index} (album has {} pages)",
            pages.len()
        )));
    }
    Ok(())
}

fn photo_lookup(photos: &[Photo]) -> HashMap<&str, &Photo> {
    photos.iter().map(|p| (p.id.as_str(), p)).collect()
}

fn resolve<'p>(
    lookup: &HashMap<&str, &'p Photo>,
    ids: &[String],
) -> Result<Vec<&'p Photo>, EditError> {
    ids.iter()
        .map(|id| {
            lookup
                .get(id.as_str())
                .copied()
                .ok_or_else(|| EditError::UnknownPhoto(id.clone()))
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
