//! Plan validation: turns an untrusted `ExternalPlan` into pages that satisfy
//! every album invariant.
//!
//! Algorithm:
//! 1. Unknown layout → the whole planned page is skipped
//! 2. Per frame entry, in plan order, reject: frame number outside
//!    1..=frame_count, unknown image, image already placed anywhere in the
//!    album, frame already filled on this page, orientation-rejected pair
//!    (fit score 0)
//! 3. Pages left with no accepted entry are dropped
//! 4. Every photo the plan did not place is reported as unplaced, in input order
//!
//! Rejections are recorded as `PlanIssue`s and logged; they never fail the call.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::layout::catalog::LayoutCatalog;
use crate::layout::fit::FitScorer;
use crate::models::page::{Assignment, Page};
use crate::models::photo::Photo;
use crate::planning::planner::ExternalPlan;

/// One rejected part of a plan. `page` is the 0-based index in the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanIssue {
    UnknownLayout {
        page: usize,
        layout: String,
    },
    FrameOutOfRange {
        page: usize,
        layout: String,
        frame_number: usize,
        frame_count: usize,
    },
    UnknownImage {
        page: usize,
        image_id: String,
    },
    DuplicateImage {
        page: usize,
        image_id: String,
    },
    FrameAlreadyFilled {
        page: usize,
        frame_number: usize,
        image_id: String,
    },
    OrientationRejected {
        page: usize,
        frame_number: usize,
        image_id: String,
    },
    EmptyPageDropped {
        page: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedPlan {
    /// Accepted pages, numbered 1..n in plan order.
    pub pages: Vec<Page>,
    /// Photo ids the plan did not place, in input order.
    pub unplaced: Vec<String>,
    pub issues: Vec<PlanIssue>,
}

impl ValidatedPlan {
    /// True when the plan was accepted without any correction.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.unplaced.is_empty()
    }
}

pub fn validate_plan(
    plan: &ExternalPlan,
    catalog: &LayoutCatalog,
    photos: &[Photo],
    scorer: &dyn FitScorer,
) -> ValidatedPlan {
    let lookup: HashMap<&str, &Photo> = photos.iter().map(|p| (p.id.as_str(), p)).collect();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut pages = Vec::new();
    let mut issues = Vec::new();

    for (page_idx, planned) in plan.pages.iter().enumerate() {
        let layout = match catalog.get_layout(&planned.layout_to_use) {
            Ok(layout) => layout,
            Err(_) => {
                issues.push(PlanIssue::UnknownLayout {
                    page: page_idx,
                    layout: planned.layout_to_use.clone(),
                });
                continue;
            }
        };

        let mut filled: HashSet<usize> = HashSet::new();
        let mut assignments = Vec::new();

        for entry in &planned.frames {
            let frame = match layout.frame(entry.frame_number) {
                Some(frame) => frame,
                None => {
                    issues.push(PlanIssue::FrameOutOfRange {
                        page: page_idx,
                        layout: layout.name.clone(),
                        frame_number: entry.frame_number,
                        frame_count: layout.frame_count,
                    });
                    continue;
                }
            };

            let Some((&id, &photo)) = lookup.get_key_value(entry.image_id.as_str()) else {
                issues.push(PlanIssue::UnknownImage {
                    page: page_idx,
                    image_id: entry.image_id.clone(),
                });
                continue;
            };

            if placed.contains(id) {
                issues.push(PlanIssue::DuplicateImage {
                    page: page_idx,
                    image_id: entry.image_id.clone(),
                });
                continue;
            }

            if filled.contains(&frame.index) {
                issues.push(PlanIssue::FrameAlreadyFilled {
                    page: page_idx,
                    frame_number: frame.index,
                    image_id: entry.image_id.clone(),
                });
                continue;
            }

            if scorer.score(photo, frame) <= 0.0 {
                issues.push(PlanIssue::OrientationRejected {
                    page: page_idx,
                    frame_number: frame.index,
                    image_id: entry.image_id.clone(),
                });
                continue;
            }

            placed.insert(id);
            filled.insert(frame.index);
            assignments.push(Assignment {
                frame_index: frame.index,
                photo_id: id.to_string(),
            });
        }

        if assignments.is_empty() {
            issues.push(PlanIssue::EmptyPageDropped { page: page_idx });
            continue;
        }

        let number = pages.len() + 1;
        pages.push(Page::new(
            format!("page-{number}"),
            number,
            layout.name.clone(),
            assignments,
        ));
    }

    for issue in &issues {
        warn!("Plan issue: {issue:?}");
    }

    let unplaced = photos
        .iter()
        .filter(|p| !placed.contains(p.id.as_str()))
        .map(|p| p.id.clone())
        .collect();

    ValidatedPlan {
        pages,
        unplaced,
        issues,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
