//! Rate-limited bridge to the Pinboard bookmarking API.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
