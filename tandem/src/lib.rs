pub use tandem_core::model::{ControlCommand, PairIndex, Role};
pub use tandem_core::{SyncConfig, TandemConfig, TransportConfig};

pub mod model {
    pub use tandem_core::model::*;
}

#[cfg(feature = "engine")]
pub mod engine {
    pub use tandem_engine::*;
}
