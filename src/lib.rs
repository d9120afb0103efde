pub mod archetype;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod http_cache;
pub mod http_client;
pub mod insights;
pub mod manager;
pub mod metrics;
pub mod models;
pub mod optimizer;
pub mod overview;
pub mod replacements;
pub mod snapshot;
pub mod source;
pub mod squad_risk;
pub mod transfers;

pub use config::Config;
pub use engine::FplEngine;
pub use error::{FplError, Result};
