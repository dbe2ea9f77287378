mod control_channel;
mod rtc_channel;

pub use control_channel::*;
pub use rtc_channel::*;
