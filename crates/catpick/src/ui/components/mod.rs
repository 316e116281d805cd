//! Collection of reusable TUI components.

pub mod command_palette;
pub mod document;
pub mod file_tree;
