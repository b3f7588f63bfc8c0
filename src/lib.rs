//! Admin console for the Quanskill student portal API.

pub mod api;
pub mod browse;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod models;
pub mod resources;
pub mod session;
pub mod table;
