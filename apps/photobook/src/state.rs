use std::sync::Arc;

use crate::config::Config;
use crate::layout::{FitScorer, LayoutCatalog, LayoutOrder, PageComposer};
use crate::planning::{AlbumPlanner, LayoutPlanner};

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything in it is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<LayoutCatalog>,
    /// Pluggable fit scorer. Default: AspectFitScorer.
    pub scorer: Arc<dyn FitScorer>,
    /// External planner, present only when ANTHROPIC_API_KEY is set.
    pub planner: Option<Arc<dyn LayoutPlanner>>,
    pub config: Config,
}

impl AppState {
    /// Composer configured from `Config`. `seed` overrides the shuffle setting.
    pub fn composer(&self, seed: Option<u64>) -> PageComposer<'_> {
        PageComposer::new(&self.catalog, self.scorer.as_ref())
            .with_strictness(self.config.strictness)
            .with_order(self.layout_order(seed))
    }

    /// Album planner configured from `Config`. `use_planner = false` skips the
    /// external planner even when one is configured.
    pub fn album_planner(&self, use_planner: bool, seed: Option<u64>) -> AlbumPlanner<'_> {
        let planner = if use_planner {
            self.planner.as_deref()
        } else {
            None
        };
        AlbumPlanner::new(
            &self.catalog,
            self.scorer.as_ref(),
            planner,
            self.config.planner_timeout,
        )
        .with_strictness(self.config.strictness)
        .with_order(self.layout_order(seed))
    }

    fn layout_order(&self, seed: Option<u64>) -> LayoutOrder {
        match seed {
            Some(seed) => LayoutOrder::Shuffled { seed },
            None if self.config.shuffle_layouts => LayoutOrder::Shuffled {
                seed: rand::random(),
            },
            None => LayoutOrder::Catalog,
        }
    }
}
