use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tandem::engine::{LocalTrack, MediaElement, MediaKind, MediaTracks};
use tokio::task::JoinHandle;
use tracing::debug;
use webrtc::media::Sample;

struct Clock {
    anchor: Instant,
    offset: f64,
    playing: bool,
}

/// Stand-in for a video element: a position that advances in real time while playing.
pub struct SimulatedMedia {
    clock: Mutex<Clock>,
}

impl SimulatedMedia {
    pub fn new(start: f64) -> Self {
        Self {
            clock: Mutex::new(Clock {
                anchor: Instant::now(),
                offset: start,
                playing: true,
            }),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.clock.lock().map(|c| c.playing).unwrap_or(false)
    }

    fn update(&self, f: impl FnOnce(&mut Clock)) {
        if let Ok(mut clock) = self.clock.lock() {
            f(&mut clock);
        }
    }
}

fn position(clock: &Clock) -> f64 {
    if clock.playing {
        clock.offset + clock.anchor.elapsed().as_secs_f64()
    } else {
        clock.offset
    }
}

impl MediaElement for SimulatedMedia {
    fn current_time(&self) -> f64 {
        self.clock.lock().map(|c| position(&c)).unwrap_or(0.0)
    }

    fn seek(&self, seconds: f64) {
        self.update(|clock| {
            clock.offset = seconds.max(0.0);
            clock.anchor = Instant::now();
        });
    }

    fn play(&self) {
        self.update(|clock| {
            if !clock.playing {
                clock.anchor = Instant::now();
                clock.playing = true;
            }
        });
    }

    fn pause(&self) {
        self.update(|clock| {
            if clock.playing {
                clock.offset = position(clock);
                clock.playing = false;
            }
        });
    }
}

/// Writes placeholder frames to every track so the far side sees media arrive.
pub fn spawn_feeders(tracks: &MediaTracks) -> Vec<JoinHandle<()>> {
    tracks.iter().cloned().map(spawn_feeder).collect()
}

fn spawn_feeder(track: LocalTrack) -> JoinHandle<()> {
    let (payload, period) = match track.kind() {
        // Not a decodable VP8 frame; the receiver only drains RTP.
        MediaKind::Video => (Bytes::from_static(&[0x10, 0x02, 0x00, 0x9d, 0x01, 0x2a]), 33),
        // Opus silence.
        MediaKind::Audio => (Bytes::from_static(&[0xf8, 0xff, 0xfe]), 20),
    };
    let duration = Duration::from_millis(period);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(duration);
        loop {
            ticker.tick().await;
            let sample = Sample {
                data: payload.clone(),
                duration,
                ..Default::default()
            };
            if let Err(e) = track.sample_track().write_sample(&sample).await {
                debug!("{} feeder stopped: {}", track.id(), e);
                break;
            }
        }
    })
}
