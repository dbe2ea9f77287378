mod connection_pair;
mod pair_command;
mod pair_handle;

pub use connection_pair::*;
pub use pair_command::*;
pub use pair_handle::*;
