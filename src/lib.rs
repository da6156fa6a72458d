pub mod advisor;
pub mod api;
pub mod core;
