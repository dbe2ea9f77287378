use colored::*;
use tandem::engine::{PairIndex, PositionDisplay, RemoteStream, RenderSink};

/// Prints the shared position read-out.
pub struct ConsoleDisplay;

impl PositionDisplay for ConsoleDisplay {
    fn show_position(&self, pair: PairIndex, seconds: f64) {
        println!("{} {} {:.1}s", "⏱".cyan(), pair, seconds);
    }
}

/// Prints what would be put on screen.
pub struct ConsoleRender;

impl RenderSink for ConsoleRender {
    fn remote_stream_added(&self, pair: PairIndex, stream: &RemoteStream) {
        println!(
            "{} {} receiving stream {} ({} tracks)",
            "📺".green(),
            pair,
            stream.stream_id,
            stream.tracks.len()
        );
    }

    fn render(&self, pair: PairIndex, stream: &RemoteStream) {
        println!("{} showing {} ({})", "📺".green().bold(), pair, stream.stream_id);
    }
}
