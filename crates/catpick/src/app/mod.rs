//! Application layer: the file picker widget and the server-side services behind it.

pub mod backend;
pub mod concat;
pub mod expand;
pub mod explorer;
pub mod page;
pub mod scan;
pub mod selection;
pub mod store;
pub mod submit;
