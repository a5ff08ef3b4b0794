//! # GraphLens
//!
//! The application layer around `graphlens-core`: the HTTP API, the CLI,
//! settings, and the Neo4j store adapter.

pub mod api;
pub mod cli;
pub mod config;
pub mod store;
