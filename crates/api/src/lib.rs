//! `dentiva-api` — HTTP surface and process wiring for the storefront
//! backend.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
