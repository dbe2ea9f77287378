mod control;
mod error;
mod media;
mod negotiation;
mod pair;
mod session;
mod sync;
mod transport;

pub use control::*;
pub use error::*;
pub use media::*;
pub use negotiation::*;
pub use pair::*;
pub use session::*;
pub use sync::*;
pub use transport::*;

pub use tandem_core::*;
