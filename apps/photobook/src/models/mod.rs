pub mod page;
pub mod photo;
