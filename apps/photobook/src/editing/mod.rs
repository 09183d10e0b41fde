// Copy-on-write album edits and their history records.

pub mod handlers;
pub mod history;
pub mod operations;

pub use operations::EditError;
