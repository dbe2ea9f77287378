use std::sync::Arc;
use tandem_core::{MediaKind, PairIndex, RemoteStream};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Local playback element a pair reports on and is remote-controlled through.
pub trait MediaElement: Send + Sync {
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    fn seek(&self, seconds: f64);

    fn play(&self);

    fn pause(&self);
}

/// Shared position read-out driven by the selected pair.
pub trait PositionDisplay: Send + Sync {
    fn show_position(&self, pair: PairIndex, seconds: f64);
}

/// Where received streams end up.
pub trait RenderSink: Send + Sync {
    /// Called once per pair, when its first remote track arrives.
    fn remote_stream_added(&self, pair: PairIndex, stream: &RemoteStream);

    /// Called when the user selects a pair whose stream is known.
    fn render(&self, pair: PairIndex, stream: &RemoteStream);
}

/// One local track fed to an offerer. Samples are written by whoever captures the
/// media, through [`LocalTrack::sample_track`].
#[derive(Clone)]
pub struct LocalTrack {
    kind: MediaKind,
    track: Arc<TrackLocalStaticSample>,
}

impl LocalTrack {
    pub fn new(kind: MediaKind, track: Arc<TrackLocalStaticSample>) -> Self {
        Self { kind, track }
    }

    /// VP8 video track with a generated id.
    pub fn video(stream_id: &str) -> Self {
        let capability = RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            clock_rate: 90000,
            channels: 0,
            sdp_fmtp_line: String::new(),
            rtcp_feedback: vec![],
        };
        Self::with_codec(MediaKind::Video, capability, stream_id)
    }

    /// Opus audio track with a generated id.
    pub fn audio(stream_id: &str) -> Self {
        let capability = RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: 48000,
            channels: 2,
            sdp_fmtp_line: String::new(),
            rtcp_feedback: vec![],
        };
        Self::with_codec(MediaKind::Audio, capability, stream_id)
    }

    fn with_codec(kind: MediaKind, capability: RTCRtpCodecCapability, stream_id: &str) -> Self {
        let track_id = format!("{}-{}", kind, uuid::Uuid::new_v4());
        let track = Arc::new(TrackLocalStaticSample::new(
            capability,
            track_id,
            stream_id.to_owned(),
        ));
        Self { kind, track }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        self.track.id()
    }

    pub fn stream_id(&self) -> &str {
        self.track.stream_id()
    }

    pub fn sample_track(&self) -> &Arc<TrackLocalStaticSample> {
        &self.track
    }
}

/// The tracks a media source hands over once it is ready.
#[derive(Clone, Default)]
pub struct MediaTracks {
    pub video: Vec<LocalTrack>,
    pub audio: Vec<LocalTrack>,
}

impl MediaTracks {
    pub fn new(video: Vec<LocalTrack>, audio: Vec<LocalTrack>) -> Self {
        Self { video, audio }
    }

    /// One video and one audio track sharing a freshly generated stream id.
    pub fn audio_video() -> Self {
        let stream_id = format!("stream-{}", uuid::Uuid::new_v4());
        Self {
            video: vec![LocalTrack::video(&stream_id)],
            audio: vec![LocalTrack::audio(&stream_id)],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalTrack> {
        self.video.iter().chain(self.audio.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.video.is_empty() && self.audio.is_empty()
    }

    pub fn len(&self) -> usize {
        self.video.len() + self.audio.len()
    }
}
