mod controller;
mod selection;

pub use controller::*;
pub use selection::*;
