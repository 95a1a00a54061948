//! Client session: owns the playlist cache, the current playback state and
//! the outbound command channel, and projects everything onto a [`View`].
//!
//! All state that earlier revisions kept in globals (socket handle, cache
//! array, scroll offset) lives here.  The session is driven from a single
//! event loop, so no locking: one `ConnectionEvent` or user action is handled
//! to completion before the next.

use gmu_proto::config::PlaylistConfig;
use gmu_proto::protocol::{
    ClientCommand, PlaybackState, ServerMessage, TrackInfo, WireFormat,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::ConnectionEvent;
use crate::playlist::{PlaylistCache, SyncEffects};
use crate::view::View;

pub struct Session<V: View> {
    view: V,
    cache: PlaylistCache,
    wire_format: WireFormat,
    cmd_tx: mpsc::Sender<String>,
    playback: PlaybackState,
    track: TrackInfo,
    /// Generation of the live connection; events tagged with anything else
    /// come from a superseded connection attempt and are dropped.
    generation: Option<u64>,
}

impl<V: View> Session<V> {
    pub fn new(
        wire_format: WireFormat,
        playlist: &PlaylistConfig,
        cmd_tx: mpsc::Sender<String>,
        view: V,
    ) -> Self {
        Self {
            view,
            cache: PlaylistCache::new(playlist.row_height, playlist.viewport_height),
            wire_format,
            cmd_tx,
            playback: PlaybackState::default(),
            track: TrackInfo::default(),
            generation: None,
        }
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback
    }

    pub fn track_info(&self) -> &TrackInfo {
        &self.track
    }

    pub async fn handle_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Opened { generation } => {
                info!("session live (generation {})", generation);
                self.generation = Some(generation);
            }
            ConnectionEvent::Closed { generation } => {
                if self.generation == Some(generation) {
                    info!("session lost, awaiting reconnect");
                    self.generation = None;
                }
            }
            ConnectionEvent::Message { generation, raw } => {
                if self.generation != Some(generation) {
                    debug!("dropping message from stale generation {}", generation);
                    return;
                }
                self.handle_message(ServerMessage::decode(&raw)).await;
            }
        }
    }

    async fn handle_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Hello => debug!("server greeting"),
            ServerMessage::Login { res } => match res {
                gmu_proto::protocol::LoginResult::Success => self.view.set_login_visible(false),
                gmu_proto::protocol::LoginResult::Failure => {
                    warn!("login rejected");
                    self.view.set_login_visible(true);
                }
            },
            ServerMessage::Time { time } => self.view.set_clock(&time),
            ServerMessage::PlaybackState { state } => {
                self.playback = state;
                self.view.set_playback_state(state);
            }
            ServerMessage::TrackInfo {
                artist,
                title,
                album,
            } => {
                self.track = TrackInfo {
                    artist,
                    title,
                    album,
                };
                self.view.set_track_info(&self.track);
            }
            ServerMessage::PlaylistInfo { length } | ServerMessage::PlaylistChange { length } => {
                info!("playlist length {}", length);
                self.cache.reset(length);
                let effects = self.cache.resync();
                self.apply(effects).await;
            }
            ServerMessage::PlaylistItem { position, title } => {
                if position >= self.cache.len() {
                    warn!(
                        "playlist item {} outside playlist of length {}",
                        position,
                        self.cache.len()
                    );
                    return;
                }
                let effects = self.cache.store_item(position, title);
                self.apply(effects).await;
            }
            ServerMessage::Unknown(raw) => info!("unrecognized message: {}", raw),
        }
    }

    // ── User actions ──────────────────────────────────────────────────────────

    pub async fn play(&mut self) {
        self.send(ClientCommand::Play { item: None }).await;
    }

    pub async fn play_item(&mut self, position: usize) {
        self.send(ClientCommand::Play {
            item: Some(position),
        })
        .await;
    }

    pub async fn pause(&mut self) {
        self.send(ClientCommand::Pause).await;
    }

    pub async fn stop(&mut self) {
        self.send(ClientCommand::Stop).await;
    }

    pub async fn next(&mut self) {
        self.send(ClientCommand::Next).await;
    }

    pub async fn prev(&mut self) {
        self.send(ClientCommand::Prev).await;
    }

    pub async fn login(&mut self, password: String) {
        self.send(ClientCommand::Login { password }).await;
    }

    pub async fn scroll_to(&mut self, scroll_top: u32) {
        let effects = self.cache.handle_scroll(scroll_top);
        self.apply(effects).await;
    }

    pub async fn set_viewport(&mut self, viewport_height: u32) {
        let effects = self.cache.set_viewport(viewport_height);
        self.apply(effects).await;
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    async fn apply(&mut self, effects: SyncEffects) {
        for (row, content) in &effects.renders {
            self.view.render_row(*row, content);
        }
        for position in effects.fetches {
            self.send(ClientCommand::PlaylistGetItem { item: position })
                .await;
        }
    }

    async fn send(&mut self, cmd: ClientCommand) {
        let encoded = match cmd.encode(self.wire_format) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("failed to encode command: {}", e);
                return;
            }
        };
        // A closed or full channel means the transport is gone; commands sent
        // while disconnected are dropped, not queued.
        if self.cmd_tx.send(encoded).await.is_err() {
            debug!("command dropped, transport gone");
        }
    }
}
