pub mod config;
pub mod model;

pub use config::{SyncConfig, TandemConfig, TransportConfig};
pub use model::*;
