//! Service layer between handlers and `vendo_core`.

pub mod auth;
pub mod cookies;
