// Album planning: external planner, plan validation, fallback to the composer.

pub mod handlers;
pub mod planner;
pub mod prompts;
pub mod service;
pub mod validation;

pub use planner::{LayoutPlanner, LlmLayoutPlanner};
pub use service::AlbumPlanner;
