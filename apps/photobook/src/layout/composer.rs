//! Page Composition: turns a photo list into an ordered list of pages.
//!
//! # Composition rules
//! - Layouts are tried largest-first so albums use as few pages as possible
//! - The first layout the assigner can satisfy becomes the next page
//! - When no layout can be satisfied, every remaining photo gets its own page
//!   on the catalog's fallback layout, so no photo is ever left out

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::layout::assigner::{FrameAssigner, Strictness};
use crate::layout::catalog::{Layout, LayoutCatalog};
use crate::layout::fit::FitScorer;
use crate::models::page::{Assignment, Page};
use crate::models::photo::Photo;

/// Order in which same-size layouts are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum LayoutOrder {
    /// Catalog order within each frame count.
    #[default]
    Catalog,
    /// Seeded shuffle within each frame count, for variety between runs.
    Shuffled { seed: u64 },
}

pub struct PageComposer<'a> {
    catalog: &'a LayoutCatalog,
    scorer: &'a dyn FitScorer,
    strictness: Strictness,
    order: LayoutOrder,
}

impl<'a> PageComposer<'a> {
    pub fn new(catalog: &'a LayoutCatalog, scorer: &'a dyn FitScorer) -> Self {
        Self {
            catalog,
            scorer,
            strictness: Strictness::default(),
            order: LayoutOrder::default(),
        }
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_order(mut self, order: LayoutOrder) -> Self {
        self.order = order;
        self
    }

    /// Composes pages for every photo. A repeated photo id is composed once,
    /// at its first occurrence.
    pub fn compose(&self, photos: &[Photo]) -> Vec<Page> {
        let refs: Vec<&Photo> = photos.iter().collect();
        self.compose_refs(&refs)
    }

    /// Same as [`compose`](Self::compose) over borrowed photos.
    pub fn compose_refs(&self, photos: &[&Photo]) -> Vec<Page> {
        let photos = unique_by_id(photos);
        let positions: HashMap<&str, usize> = photos
            .iter()
            .enumerate()
            .map(|(pos, p)| (p.id.as_str(), pos))
            .collect();

        let layouts = self.candidate_layouts();
        let assigner = FrameAssigner::new(self.scorer, self.strictness);

        let mut pages: Vec<Page> = Vec::new();
        let mut used = vec![false; photos.len()];
        let mut used_count = 0usize;
        let max_attempts = photos.len() * 2;
        let mut attempts = 0usize;

        while used_count < photos.len() && attempts < max_attempts {
            attempts += 1;

            let remaining: Vec<&Photo> = photos
                .iter()
                .zip(&used)
                .filter(|(_, u)| !**u)
                .map(|(p, _)| *p)
                .collect();

            let mut placed = false;
            for layout in &layouts {
                if layout.frame_count > remaining.len() {
                    continue;
                }

                let Ok(assignments) = assigner.assign(&remaining, &layout.frames) else {
                    continue;
                };

                for assignment in &assignments {
                    if let Some(&pos) = positions.get(assignment.photo_id.as_str()) {
                        if !used[pos] {
                            used[pos] = true;
                            used_count += 1;
                        }
                    }
                }

                debug!(
                    "Page {} uses {} ({} of {} frames filled)",
                    pages.len() + 1,
                    layout.name,
                    assignments.len(),
                    layout.frame_count
                );
                pages.push(new_page(pages.len() + 1, &layout.name, assignments));
                placed = true;
                break;
            }

            if !placed {
                break;
            }
        }

        // Stragglers: one fallback page each, regardless of score.
        let fallback = self.catalog.fallback_layout();
        let fallback_frame = fallback.frames.first().map(|f| f.index).unwrap_or(1);
        let mut stragglers = 0usize;
        for (photo, _) in photos.iter().zip(&used).filter(|(_, u)| !**u) {
            pages.push(new_page(
                pages.len() + 1,
                &fallback.name,
                vec![Assignment {
                    frame_index: fallback_frame,
                    photo_id: photo.id.clone(),
                }],
            ));
            stragglers += 1;
        }

        info!(
            "Composed {} pages for {} photos ({} attempts, {} fallback pages)",
            pages.len(),
            photos.len(),
            attempts,
            stragglers
        );

        pages
    }

    /// Layouts sorted by descending frame count, in the configured order within
    /// each frame count.
    fn candidate_layouts(&self) -> Vec<&'a Layout> {
        let mut layouts: Vec<&Layout> = self.catalog.list_layouts().iter().collect();
        layouts.sort_by(|a, b| b.frame_count.cmp(&a.frame_count));

        if let LayoutOrder::Shuffled { seed } = self.order {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut start = 0;
            while start < layouts.len() {
                let count = layouts[start].frame_count;
                let end = layouts[start..]
                    .iter()
                    .position(|l| l.frame_count != count)
                    .map(|offset| start + offset)
                    .unwrap_or(layouts.len());
                layouts[start..end].shuffle(&mut rng);
                start = end;
            }
        }

        layouts
    }
}

/// Drops repeated ids, keeping the first occurrence in input order.
fn unique_by_id<'p>(photos: &[&'p Photo]) -> Vec<&'p Photo> {
    let mut seen = HashSet::new();
    let unique: Vec<&Photo> = photos
        .iter()
        .copied()
        .filter(|p| seen.insert(p.id.as_str()))
        .collect();
    if unique.len() < photos.len() {
        debug!(
            "Ignoring {} repeated photo ids",
            photos.len() - unique.len()
        );
    }
    unique
}

fn new_page(page_number: usize, layout_name: &str, assignments: Vec<Assignment>) -> Page {
    Page::new(
        format!("page-{page_number}"),
        page_number,
        layout_name,
        assignments,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
