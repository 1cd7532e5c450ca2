pub mod events;
pub mod media;
pub mod models;
pub mod shell;
pub mod templates;
