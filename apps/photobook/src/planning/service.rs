//! Album planning service: external planner first, deterministic composer as
//! the safety net.
//!
//! # Planning rules
//! - With no planner configured, albums come straight from `PageComposer`
//! - A planner error or timeout falls back to `PageComposer` (logged at warn)
//! - A plan is validated; photos it failed to place are composed onto pages
//!   appended after the planned ones
//! - `plan_album` never fails: every photo ends up on exactly one page

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::editing::history::{EditHistoryEntry, EditOperation};
use crate::editing::operations::EditError;
use crate::layout::assigner::Strictness;
use crate::layout::catalog::LayoutCatalog;
use crate::layout::composer::{LayoutOrder, PageComposer};
use crate::layout::fit::FitScorer;
use crate::models::page::{fresh_page_id, renumber, Page};
use crate::models::photo::Photo;
use crate::planning::planner::{LayoutPlanner, PlanRequest, PlannerError};
use crate::planning::validation::{validate_plan, PlanIssue};

/// Where an album's pages came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Deterministic,
    /// Planner output accepted without corrections.
    External,
    /// Planner output with rejected entries or unplaced photos repaired by the composer.
    ExternalRepaired,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub pages: Vec<Page>,
    pub source: PlanSource,
    pub issues: Vec<PlanIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegenerateOutcome {
    pub pages: Vec<Page>,
    pub source: PlanSource,
    pub issues: Vec<PlanIssue>,
    pub history_entry: EditHistoryEntry,
}

pub struct AlbumPlanner<'a> {
    catalog: &'a LayoutCatalog,
    scorer: &'a dyn FitScorer,
    planner: Option<&'a dyn LayoutPlanner>,
    planner_timeout: Duration,
    strictness: Strictness,
    order: LayoutOrder,
}

impl<'a> AlbumPlanner<'a> {
    pub fn new(
        catalog: &'a LayoutCatalog,
        scorer: &'a dyn FitScorer,
        planner: Option<&'a dyn LayoutPlanner>,
        planner_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            scorer,
            planner,
            planner_timeout,
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

    fn composer(&self) -> PageComposer<'a> {
        PageComposer::new(self.catalog, self.scorer)
            .with_strictness(self.strictness)
            .with_order(self.order)
    }

    /// Lays out every photo. Pages are numbered 1..n with ids `page-{n}`.
    pub async fn plan_album(&self, photos: &[Photo]) -> PlanOutcome {
        let deterministic = |issues: Vec<PlanIssue>| PlanOutcome {
            pages: self.composer().compose(photos),
            source: PlanSource::Deterministic,
            issues,
        };

        let Some(planner) = self.planner else {
            return deterministic(Vec::new());
        };
        if photos.is_empty() {
            return deterministic(Vec::new());
        }

        let request = PlanRequest::new(self.catalog, photos);
        let plan = match timeout(self.planner_timeout, planner.plan(&request)).await {
            Ok(Ok(plan)) => plan,
            Ok(Err(e)) => {
                warn!("Planner '{}' failed, composing deterministically: {e}", planner.backend());
                return deterministic(Vec::new());
            }
            Err(_) => {
                let e = PlannerError::Timeout(self.planner_timeout);
                warn!("Planner '{}' failed, composing deterministically: {e}", planner.backend());
                return deterministic(Vec::new());
            }
        };

        let validated = validate_plan(&plan, self.catalog, photos, self.scorer);
        if validated.pages.is_empty() {
            warn!("Planner produced no usable pages, composing deterministically");
            return deterministic(validated.issues);
        }

        let source = if validated.is_clean() {
            PlanSource::External
        } else {
            PlanSource::ExternalRepaired
        };

        let mut pages = validated.pages;
        if !validated.unplaced.is_empty() {
            let lookup: HashMap<&str, &Photo> =
                photos.iter().map(|p| (p.id.as_str(), p)).collect();
            let leftovers: Vec<&Photo> = validated
                .unplaced
                .iter()
                .filter_map(|id| lookup.get(id.as_str()).copied())
                .collect();
            pages.extend(self.composer().compose_refs(&leftovers));
        }

        for (k, page) in pages.iter_mut().enumerate() {
            page.id = format!("page-{}", k + 1);
        }
        renumber(&mut pages);

        info!(
            "Planned {} photos onto {} pages ({:?}, {} issues)",
            photos.len(),
            pages.len(),
            source,
            validated.issues.len()
        );

        PlanOutcome {
            pages,
            source,
            issues: validated.issues,
        }
    }

    /// Re-plans the photos of the selected pages and puts the new pages where
    /// the first selected page was. Unselected pages are untouched.
    ///
    /// A photo repeated across the selected pages (after `duplicate_page`)
    /// is planned once, so the result holds each photo exactly once again.
    pub async fn regenerate_pages(
        &self,
        pages: &[Page],
        page_indices: &[usize],
        photos: &[Photo],
    ) -> Result<RegenerateOutcome, EditError> {
        if page_indices.is_empty() {
            return Err(EditError::OutOfRange("no pages selected".to_string()));
        }
        let mut selected = page_indices.to_vec();
        selected.sort_unstable();
        selected.dedup();
        if let Some(&bad) = selected.iter().find(|&&i| i >= pages.len()) {
            return Err(EditError::OutOfRange(format!(
                "page {bad} (album has {} pages)",
                pages.len()
            )));
        }

        let lookup: HashMap<&str, &Photo> = photos.iter().map(|p| (p.id.as_str(), p)).collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut batch: Vec<Photo> = Vec::new();
        for &index in &selected {
            for id in pages[index].photo_ids() {
                if !seen.insert(id.clone()) {
                    continue;
                }
                let photo = lookup
                    .get(id.as_str())
                    .ok_or_else(|| EditError::UnknownPhoto(id.clone()))?;
                batch.push((*photo).clone());
            }
        }

        if batch.is_empty() && selected.len() == pages.len() {
            return Err(EditError::CannotDeleteLast);
        }

        let planned = self.plan_album(&batch).await;
        let mut fresh = planned.pages;
        for page in &mut fresh {
            page.id = fresh_page_id();
        }
        let new_ids: Vec<String> = fresh.iter().map(|p| p.id.clone()).collect();

        let insert_at = selected[0];
        let mut new_pages: Vec<Page> = Vec::with_capacity(pages.len() + fresh.len());
        for (index, page) in pages.iter().enumerate() {
            if index == insert_at {
                new_pages.append(&mut fresh);
            }
            if selected.binary_search(&index).is_err() {
                new_pages.push(page.clone());
            }
        }
        renumber(&mut new_pages);

        let replaced_ids: Vec<&str> = selected.iter().map(|&i| pages[i].id.as_str()).collect();

        Ok(RegenerateOutcome {
            history_entry: EditHistoryEntry::new(
                EditOperation::RegeneratePages,
                Some(insert_at),
                json!({
                    "page_indices": selected,
                    "replaced_page_ids": replaced_ids,
                    "new_page_ids": new_ids,
                    "source": planned.source,
                }),
            ),
            pages: new_pages,
            source: planned.source,
            issues: planned.issues,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::layout::fit::AspectFitScorer;
    use crate::llm_client::LlmError;
    use crate::planning::planner::{ExternalPlan, PlannedFrame, PlannedPage};

    /// Returns a fixed plan.
    struct FixedPlanner(ExternalPlan);

    #[async_trait]
    impl LayoutPlanner for FixedPlanner {
        async fn plan(&self, _request: &PlanRequest) -> Result<ExternalPlan, PlannerError> {
            Ok(self.0.clone())
        }

        fn backend(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingPlanner;

    #[async_trait]
    impl LayoutPlanner for FailingPlanner {
        async fn plan(&self, _request: &PlanRequest) -> Result<ExternalPlan, PlannerError> {
            Err(PlannerError::Llm(LlmError::EmptyContent))
        }

        fn backend(&self) -> &'static str {
            "failing"
        }
    }

    struct SlowPlanner;

    #[async_trait]
    impl LayoutPlanner for SlowPlanner {
        async fn plan(&self, _request: &PlanRequest) -> Result<ExternalPlan, PlannerError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(ExternalPlan::default())
        }

        fn backend(&self) -> &'static str {
            "slow"
        }
    }

    fn photos(ratios: &[f64]) -> Vec<Photo> {
        ratios
            .iter()
            .enumerate()
            .map(|(i, &r)| Photo::new(format!("p{i}"), r))
            .collect()
    }

    fn planned(layout: &str, frames: &[(usize, &str)]) -> PlannedPage {
        PlannedPage {
            layout_to_use: layout.to_string(),
            frames: frames
                .iter()
                .map(|&(frame_number, id)| PlannedFrame {
                    frame_number,
                    image_id: id.to_string(),
                })
                .collect(),
        }
    }

    fn sorted_ids(pages: &[Page]) -> Vec<String> {
        let mut ids: Vec<String> = pages.iter().flat_map(|p| p.photo_ids()).collect();
        ids.sort();
        ids
    }

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_no_planner_is_deterministic() {
        let catalog = LayoutCatalog::bundled().unwrap();
        let scorer = AspectFitScorer::default();
        let ps = photos(&[1.5, 0.7, 1.0, 0.7]);

        let outcome = AlbumPlanner::new(&catalog, &scorer, None, TIMEOUT)
            .plan_album(&ps)
            .await;

        assert_eq!(outcome.source, PlanSource::Deterministic);
        assert_eq!(outcome.pages, PageComposer::new(&catalog, &scorer).compose(&ps));
    }

    #[tokio::test]
    async fn test_clean_plan_is_used_verbatim() {
        let catalog = LayoutCatalog::bundled().unwrap();
        let scorer = AspectFitScorer::default();
        let ps = photos(&[0.7, 0.7, 1.5]);
        let planner = FixedPlanner(ExternalPlan {
            pages: vec![
                planned("singlephoto.svg", &[(1, "p2")]),
                planned("layout4.svg", &[(1, "p1"), (2, "p0")]),
            ],
        });

        let outcome = AlbumPlanner::new(&catalog, &scorer, Some(&planner), TIMEOUT)
            .plan_album(&ps)
            .await;

        assert_eq!(outcome.source, PlanSource::External);
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.pages.len(), 2);
        assert_eq!(outcome.pages[0].photo_ids(), vec!["p2"]);
        assert_eq!(outcome.pages[1].photo_ids(), vec!["p1", "p0"]);
        assert_eq!(outcome.pages[1].id, "page-2");
    }

    #[tokio::test]
    async fn test_partial_plan_is_repaired() {
        let catalog = LayoutCatalog::bundled().unwrap();
        let scorer = AspectFitScorer::default();
        let ps = photos(&[0.7, 0.7, 1.5, 1.0]);
        let planner = FixedPlanner(ExternalPlan {
            pages: vec![planned("layout4.svg", &[(1, "p0"), (2, "p0"), (3, "p1")])],
        });

        let outcome = AlbumPlanner::new(&catalog, &scorer, Some(&planner), TIMEOUT)
            .plan_album(&ps)
            .await;

        assert_eq!(outcome.source, PlanSource::ExternalRepaired);
        assert_eq!(outcome.issues.len(), 2);
        assert_eq!(outcome.pages[0].photo_ids(), vec!["p0"]);
        assert_eq!(sorted_ids(&outcome.pages), vec!["p0", "p1", "p2", "p3"]);
        for (k, page) in outcome.pages.iter().enumerate() {
            assert_eq!(page.page_number, k + 1);
            assert_eq!(page.id, format!("page-{}", k + 1));
        }
    }

    #[tokio::test]
    async fn test_planner_error_falls_back() {
        let catalog = LayoutCatalog::bundled().unwrap();
        let scorer = AspectFitScorer::default();
        let ps = photos(&[1.5, 0.7, 1.0]);

        let outcome = AlbumPlanner::new(&catalog, &scorer, Some(&FailingPlanner), TIMEOUT)
            .plan_album(&ps)
            .await;

        assert_eq!(outcome.source, PlanSource::Deterministic);
        assert_eq!(sorted_ids(&outcome.pages), vec!["p0", "p1", "p2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_planner_timeout_falls_back() {
        let catalog = LayoutCatalog::bundled().unwrap();
        let scorer = AspectFitScorer::default();
        let ps = photos(&[1.5, 0.7, 1.0]);

        let outcome = AlbumPlanner::new(&catalog, &scorer, Some(&SlowPlanner), TIMEOUT)
            .plan_album(&ps)
            .await;

        assert_eq!(outcome.source, PlanSource::Deterministic);
        assert_eq!(sorted_ids(&outcome.pages), vec!["p0", "p1", "p2"]);
    }

    #[tokio::test]
    async fn test_unusable_plan_falls_back_but_keeps_issues() {
        let catalog = LayoutCatalog::bundled().unwrap();
        let scorer = AspectFitScorer::default();
        let ps = photos(&[1.0, 1.0]);
        let planner = FixedPlanner(ExternalPlan {
            pages: vec![planned("missing.svg", &[(1, "p0")])],
        });

        let outcome = AlbumPlanner::new(&catalog, &scorer, Some(&planner), TIMEOUT)
            .plan_album(&ps)
            .await;

        assert_eq!(outcome.source, PlanSource::Deterministic);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(sorted_ids(&outcome.pages), vec!["p0", "p1"]);
    }

    #[tokio::test]
    async fn test_regenerate_replaces_selected_pages_in_place() {
        let catalog = LayoutCatalog::bundled().unwrap();
        let scorer = AspectFitScorer::default();
        let ps = photos(&[1.0; 6]);
        let pages = vec![
            Page::new("a", 1, "layout4.svg", vec![]),
            Page::new("b", 2, "layout4.svg", vec![]),
            Page::new("c", 3, "layout4.svg", vec![]),
        ]
        .into_iter()
        .enumerate()
        .map(|(k, mut page)| {
            page.set_photo(1, Some(format!("p{}", 2 * k)));
            page.set_photo(2, Some(format!("p{}", 2 * k + 1)));
            page
        })
        .collect::<Vec<_>>();

        let outcome = AlbumPlanner::new(&catalog, &scorer, None, TIMEOUT)
            .regenerate_pages(&pages, &[2, 1], &ps)
            .await
            .unwrap();

        // Four squares fit one layout2 page.
        assert_eq!(outcome.pages.len(), 2);
        assert_eq!(outcome.pages[0].id, "a");
        assert_ne!(outcome.pages[1].id, "b");
        assert_eq!(outcome.pages[1].page_number, 2);
        assert_eq!(sorted_ids(&outcome.pages), sorted_ids(&pages));
        assert_eq!(outcome.history_entry.operation, EditOperation::RegeneratePages);
        assert_eq!(outcome.history_entry.page_index, Some(1));
    }

    #[tokio::test]
    async fn test_regenerate_after_duplicate_places_each_photo_once() {
        let catalog = LayoutCatalog::bundled().unwrap();
        let scorer = AspectFitScorer::default();
        let ps = photos(&[0.7, 0.7]);
        let pages = PageComposer::new(&catalog, &scorer).compose(&ps);
        let doubled = crate::editing::operations::duplicate_page(&pages, 0).unwrap().pages;
        let all: Vec<usize> = (0..doubled.len()).collect();

        let outcome = AlbumPlanner::new(&catalog, &scorer, None, TIMEOUT)
            .regenerate_pages(&doubled, &all, &ps)
            .await
            .unwrap();

        assert_eq!(sorted_ids(&outcome.pages), vec!["p0", "p1"]);
        assert_eq!(outcome.pages.len(), pages.len());
    }

    #[tokio::test]
    async fn test_regenerate_rejects_bad_indices() {
        let catalog = LayoutCatalog::bundled().unwrap();
        let scorer = AspectFitScorer::default();
        let ps = photos(&[1.0]);
        let pages = PageComposer::new(&catalog, &scorer).compose(&ps);
        let planner = AlbumPlanner::new(&catalog, &scorer, None, TIMEOUT);

        assert!(matches!(
            planner.regenerate_pages(&pages, &[], &ps).await,
            Err(EditError::OutOfRange(_))
        ));
        assert!(matches!(
            planner.regenerate_pages(&pages, &[1], &ps).await,
            Err(EditError::OutOfRange(_))
        ));
    }

    #[tokio::test]
    async fn test_regenerate_unknown_photo() {
        let catalog = LayoutCatalog::bundled().unwrap();
        let scorer = AspectFitScorer::default();
        let ps = photos(&[1.0]);
        let pages = PageComposer::new(&catalog, &scorer).compose(&ps);

        let result = AlbumPlanner::new(&catalog, &scorer, None, TIMEOUT)
            .regenerate_pages(&pages, &[0], &[])
            .await;
        assert_eq!(result.unwrap_err(), EditError::UnknownPhoto("p0".to_string()));
    }
}
