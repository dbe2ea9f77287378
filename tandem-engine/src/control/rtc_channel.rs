use crate::control::ControlChannel;
use crate::error::ChannelStateError;
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::ChannelState;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;

/// [`ControlChannel`] over a webrtc-rs data channel.
pub struct RtcControlChannel {
    dc: Arc<RTCDataChannel>,
}

impl RtcControlChannel {
    pub fn new(dc: Arc<RTCDataChannel>) -> Self {
        Self { dc }
    }
}

#[async_trait]
impl ControlChannel for RtcControlChannel {
    fn label(&self) -> &str {
        self.dc.label()
    }

    fn state(&self) -> ChannelState {
        match self.dc.ready_state() {
            RTCDataChannelState::Open => ChannelState::Open,
            RTCDataChannelState::Closing | RTCDataChannelState::Closed => ChannelState::Closed,
            _ => ChannelState::Connecting,
        }
    }

    async fn send_text(&self, text: &str) -> Result<(), ChannelStateError> {
        let state = self.state();
        if state != ChannelState::Open {
            return Err(ChannelStateError::NotOpen {
                label: self.label().to_owned(),
                state,
            });
        }

        self.dc
            .send_text(text.to_owned())
            .await
            .map_err(|e| ChannelStateError::SendFailed {
                label: self.label().to_owned(),
                source: e.into(),
            })?;
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.dc.close().await?;
        Ok(())
    }
}
