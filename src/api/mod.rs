pub mod format;
pub mod pagination;
pub mod public;

pub use pagination::{Page, PageRequest};
