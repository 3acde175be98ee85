pub mod document;
pub mod portfolio;
pub mod resume;
