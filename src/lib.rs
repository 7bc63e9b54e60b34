// Library exports for Quire
// This allows integration tests and the binary to share one module tree

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod follow;
pub mod media;
pub mod routes;
pub mod state;
