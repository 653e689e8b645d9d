pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod focus;
pub mod geo;
pub mod guard;
pub mod ingest;
pub mod lifecycle;
pub mod markers;
pub mod models;
pub mod schedule;
pub mod viewport;

#[cfg(test)]
mod testing;

pub use engine::RouteMap;
