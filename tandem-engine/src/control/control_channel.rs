use crate::error::ChannelStateError;
use async_trait::async_trait;
use tandem_core::{ChannelState, ControlCommand};

/// Reliable, ordered text pipe bound to one connection pair.
#[async_trait]
pub trait ControlChannel: Send + Sync {
    fn label(&self) -> &str;

    fn state(&self) -> ChannelState;

    /// Sends one message. Fails without retrying when the channel is not open.
    async fn send_text(&self, text: &str) -> Result<(), ChannelStateError>;

    async fn close(&self) -> anyhow::Result<()>;

    fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    async fn send_command(&self, command: &ControlCommand) -> Result<(), ChannelStateError> {
        self.send_text(&command.encode()).await
    }
}
