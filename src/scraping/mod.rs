pub mod browser;
pub mod draw_types;
pub mod orchestrator;
pub mod paginate;
pub mod view;
