// Presentation layer - Graph page and its HTTP surface
pub mod app_state;
pub mod handlers;
pub mod page;
