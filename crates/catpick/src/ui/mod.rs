//! Terminal front end hosting the file picker.

pub mod app;
pub mod components;
