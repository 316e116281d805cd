//! Core domain types shared by the widget, the transport, and the server.

pub mod errors;
pub mod model;
