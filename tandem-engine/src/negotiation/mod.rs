mod coordinator;
mod endpoint;

pub use coordinator::*;
pub use endpoint::*;
