pub mod api;
pub mod config;
pub mod meili;
pub mod service;
