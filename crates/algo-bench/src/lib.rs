pub mod analytics;
pub mod config;
pub mod interactive;
pub mod logging;
pub mod tournament;
