//! Infrastructure adapters for IO, configuration, HTTP, and the clipboard.

pub mod clipboard;
pub mod config;
pub mod http;
