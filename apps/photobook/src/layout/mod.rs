// Layout engine: catalog, fit scoring, frame assignment, page composition.
// The engine is synchronous and pure; no I/O after the catalog is loaded.

pub mod assigner;
pub mod catalog;
pub mod composer;
pub mod fit;
pub mod handlers;

// Re-export the public API consumed by other modules (editing, planning, handlers).
pub use assigner::Strictness;
pub use catalog::{CatalogError, LayoutCatalog};
pub use composer::{LayoutOrder, PageComposer};
pub use fit::{AspectFitScorer, FitScorer};
