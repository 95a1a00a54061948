use gmu_proto::protocol::{PlaybackState, TrackInfo};

use crate::playlist::RowContent;

/// Seam between the session and whatever actually paints the screen.  The
/// session never touches a concrete UI; it only reports what changed.  Row
/// indices are relative to the visible window, so row `i` always shows
/// playlist position `window_start + i`.
pub trait View {
    fn render_row(&mut self, row: usize, content: &RowContent);
    fn set_playback_state(&mut self, state: PlaybackState);
    fn set_track_info(&mut self, info: &TrackInfo);
    fn set_clock(&mut self, text: &str);
    fn set_login_visible(&mut self, visible: bool);
}

/// Headless view for the binary: everything goes to the log.
#[derive(Debug, Default)]
pub struct LogView;

impl View for LogView {
    fn render_row(&mut self, row: usize, content: &RowContent) {
        match content {
            RowContent::Known { position, title } => {
                tracing::info!("row {:2}: [{}] {}", row, position, title)
            }
            RowContent::Placeholder { position } => {
                tracing::info!("row {:2}: [{}] ?", row, position)
            }
            RowContent::Blank => tracing::debug!("row {:2}: (blank)", row),
        }
    }

    fn set_playback_state(&mut self, state: PlaybackState) {
        tracing::info!("playback: {:?}", state);
    }

    fn set_track_info(&mut self, info: &TrackInfo) {
        tracing::info!("track: {} - {} ({})", info.artist, info.title, info.album);
    }

    fn set_clock(&mut self, text: &str) {
        tracing::info!("time: {}", text);
    }

    fn set_login_visible(&mut self, visible: bool) {
        if visible {
            tracing::info!("login required");
        } else {
            tracing::info!("logged in");
        }
    }
}
