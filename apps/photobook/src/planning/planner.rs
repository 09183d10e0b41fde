//! External layout planner: pluggable, trait-based source of album plans.
//!
//! `AppState` holds an `Option<Arc<dyn LayoutPlanner>>`. With no planner
//! configured every album is composed deterministically. A plan is untrusted
//! input: `validation::validate_plan` checks it before any page is built.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::layout::catalog::{Layout, LayoutCatalog};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::photo::Photo;
use crate::planning::prompts::{PLAN_PROMPT_TEMPLATE, PLAN_SYSTEM};

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Planner LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Planner timed out after {0:?}")]
    Timeout(Duration),
}

// ────────────────────────────────────────────────────────────────────────────
// Plan types
// ────────────────────────────────────────────────────────────────────────────

/// Everything a planner gets to see: the catalog and the photo metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PlanRequest {
    pub layouts: Vec<Layout>,
    pub photos: Vec<Photo>,
}

impl PlanRequest {
    pub fn new(catalog: &LayoutCatalog, photos: &[Photo]) -> Self {
        Self {
            layouts: catalog.list_layouts().to_vec(),
            photos: photos.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedFrame {
    pub frame_number: usize,
    pub image_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPage {
    pub layout_to_use: String,
    #[serde(default)]
    pub frames: Vec<PlannedFrame>,
}

/// Raw planner output, exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalPlan {
    #[serde(default)]
    pub pages: Vec<PlannedPage>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap planning backends without touching the service or
/// handlers.
#[async_trait]
pub trait LayoutPlanner: Send + Sync {
    async fn plan(&self, request: &PlanRequest) -> Result<ExternalPlan, PlannerError>;

    /// Short label for logs.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmLayoutPlanner
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmLayoutPlanner(pub LlmClient);

#[async_trait]
impl LayoutPlanner for LlmLayoutPlanner {
    async fn plan(&self, request: &PlanRequest) -> Result<ExternalPlan, PlannerError> {
        let prompt = build_plan_prompt(request)?;
        let plan = self.0.call_json::<ExternalPlan>(&prompt, PLAN_SYSTEM).await?;
        debug!("LLM planner returned {} pages", plan.pages.len());
        Ok(plan)
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

fn build_plan_prompt(request: &PlanRequest) -> Result<String, PlannerError> {
    let layouts_json = serde_json::to_string(&request.layouts).map_err(LlmError::Parse)?;
    let photos_json = serde_json::to_string(&request.photos).map_err(LlmError::Parse)?;

    Ok(PLAN_PROMPT_TEMPLATE
        .replace("{layouts}", &layouts_json)
        .replace("{photos}", &photos_json))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
