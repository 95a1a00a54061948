use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Wire format spoken to the server.  Older Gmu builds expect JSON objects
/// with a `cmd` discriminator; later ones switched to bare colon-separated
/// strings.  Which one the canonical server wants is fixed per deployment
/// via the config file, never negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Json,
    Plain,
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed {kind} message: {raw}")]
    Malformed { kind: &'static str, raw: String },
    #[error("json encode failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Playback state as reported by `playback_state`.  On the wire this is the
/// integer 0, 1 or 2; anything else is rejected and the whole message is
/// treated as unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn from_wire(state: u8) -> Option<Self> {
        match state {
            0 => Some(PlaybackState::Stopped),
            1 => Some(PlaybackState::Playing),
            2 => Some(PlaybackState::Paused),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            PlaybackState::Stopped => 0,
            PlaybackState::Playing => 1,
            PlaybackState::Paused => 2,
        }
    }
}

impl Serialize for PlaybackState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.to_wire())
    }
}

impl<'de> Deserialize<'de> for PlaybackState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let state = u8::deserialize(deserializer)?;
        PlaybackState::from_wire(state)
            .ok_or_else(|| de::Error::custom(format!("playback state out of range: {}", state)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginResult {
    Success,
    Failure,
}

/// Current track metadata, overwritten wholesale on every `trackinfo`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackInfo {
    pub artist: String,
    pub title: String,
    pub album: String,
}

/// Messages sent from the player server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Greeting on connect; carries nothing we act on.
    Hello,
    Login {
        res: LoginResult,
    },
    /// Playtime display text, e.g. "01:23".
    Time {
        time: String,
    },
    PlaybackState {
        state: PlaybackState,
    },
    #[serde(rename = "trackinfo")]
    TrackInfo {
        artist: String,
        title: String,
        album: String,
    },
    /// Full playlist announcement; resets the client cache.
    PlaylistInfo {
        length: usize,
    },
    /// Same payload as `playlist_info`, sent when the list changes server-side.
    PlaylistChange {
        length: usize,
    },
    PlaylistItem {
        position: usize,
        title: String,
    },
    /// Anything the codec does not recognize, kept verbatim for the log.
    #[serde(skip)]
    Unknown(String),
}

impl ServerMessage {
    /// Decode one inbound line.  Accepts both wire formats regardless of
    /// what we are configured to send — old servers mix them.  Never fails:
    /// malformed input becomes `Unknown` and is logged upstream.
    pub fn decode(raw: &str) -> Self {
        let raw = raw.trim_end_matches(['\r', '\n']);
        if raw.trim_start().starts_with('{') {
            match serde_json::from_str::<ServerMessage>(raw) {
                Ok(msg) => msg,
                Err(_) => ServerMessage::Unknown(raw.to_string()),
            }
        } else {
            Self::decode_plain(raw).unwrap_or_else(|_| ServerMessage::Unknown(raw.to_string()))
        }
    }

    fn decode_plain(raw: &str) -> Result<Self, WireError> {
        let malformed = |kind| WireError::Malformed {
            kind,
            raw: raw.to_string(),
        };
        let (tag, rest) = match raw.split_once(':') {
            Some((tag, rest)) => (tag, Some(rest)),
            None => (raw, None),
        };
        match (tag, rest) {
            ("hello", None) => Ok(ServerMessage::Hello),
            ("login", Some("success")) => Ok(ServerMessage::Login {
                res: LoginResult::Success,
            }),
            ("login", Some(_)) => Ok(ServerMessage::Login {
                res: LoginResult::Failure,
            }),
            ("time", Some(rest)) => Ok(ServerMessage::Time {
                time: rest.to_string(),
            }),
            ("playback_state", Some(rest)) => {
                let state = rest
                    .parse::<u8>()
                    .ok()
                    .and_then(PlaybackState::from_wire)
                    .ok_or_else(|| malformed("playback_state"))?;
                Ok(ServerMessage::PlaybackState { state })
            }
            // Fixed field count; the last field keeps any embedded colons.
            ("trackinfo", Some(rest)) => {
                let mut fields = rest.splitn(3, ':');
                let artist = fields.next().unwrap_or_default().to_string();
                let title = fields.next().ok_or_else(|| malformed("trackinfo"))?.to_string();
                let album = fields.next().unwrap_or_default().to_string();
                Ok(ServerMessage::TrackInfo {
                    artist,
                    title,
                    album,
                })
            }
            ("playlist_info", Some(rest)) => {
                let length = rest.parse().map_err(|_| malformed("playlist_info"))?;
                Ok(ServerMessage::PlaylistInfo { length })
            }
            ("playlist_change", Some(rest)) => {
                let length = rest.parse().map_err(|_| malformed("playlist_change"))?;
                Ok(ServerMessage::PlaylistChange { length })
            }
            ("playlist_item", Some(rest)) => {
                let (pos, title) = rest.split_once(':').ok_or_else(|| malformed("playlist_item"))?;
                let position = pos.parse().map_err(|_| malformed("playlist_item"))?;
                Ok(ServerMessage::PlaylistItem {
                    position,
                    title: title.to_string(),
                })
            }
            _ => Err(malformed("server message")),
        }
    }
}

/// Messages sent from the client to the player server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Without an item: resume / start playback.  With one: jump to that
    /// playlist position.
    Play {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item: Option<usize>,
    },
    Pause,
    Stop,
    Next,
    Prev,
    Login {
        password: String,
    },
    PlaylistGetItem {
        item: usize,
    },
}

impl ClientCommand {
    /// Encode for the wire in the configured format, without the trailing
    /// newline (the transport adds framing).
    pub fn encode(&self, format: WireFormat) -> Result<String, WireError> {
        match format {
            WireFormat::Json => Ok(serde_json::to_string(self)?),
            WireFormat::Plain => Ok(self.encode_plain()),
        }
    }

    fn encode_plain(&self) -> String {
        match self {
            ClientCommand::Play { item: None } => "play".to_string(),
            ClientCommand::Play { item: Some(item) } => format!("play:{}", item),
            ClientCommand::Pause => "pause".to_string(),
            ClientCommand::Stop => "stop".to_string(),
            ClientCommand::Next => "next".to_string(),
            ClientCommand::Prev => "prev".to_string(),
            ClientCommand::Login { password } => format!("login:{}", password),
            ClientCommand::PlaylistGetItem { item } => format!("playlist_get_item:{}", item),
        }
    }

    /// Decode a command in either format.  Used by test fixtures standing in
    /// for the server.
    pub fn decode(raw: &str) -> Option<Self> {
        let raw = raw.trim_end_matches(['\r', '\n']);
        if raw.trim_start().starts_with('{') {
            return serde_json::from_str(raw).ok();
        }
        let (tag, rest) = match raw.split_once(':') {
            Some((tag, rest)) => (tag, Some(rest)),
            None => (raw, None),
        };
        match (tag, rest) {
            ("play", None) => Some(ClientCommand::Play { item: None }),
            ("play", Some(rest)) => rest
                .parse()
                .ok()
                .map(|item| ClientCommand::Play { item: Some(item) }),
            ("pause", None) => Some(ClientCommand::Pause),
            ("stop", None) => Some(ClientCommand::Stop),
            ("next", None) => Some(ClientCommand::Next),
            ("prev", None) => Some(ClientCommand::Prev),
            ("login", Some(rest)) => Some(ClientCommand::Login {
                password: rest.to_string(),
            }),
            ("playlist_get_item", Some(rest)) => rest
                .parse()
                .ok()
                .map(|item| ClientCommand::PlaylistGetItem { item }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_item_json_round_trip() {
        let msg = ServerMessage::PlaylistItem {
            position: 5,
            title: "Song".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"cmd\":\"playlist_item\""));
        assert_eq!(ServerMessage::decode(&json), msg);
    }

    #[test]
    fn test_decode_bare_hello() {
        assert_eq!(ServerMessage::decode("hello"), ServerMessage::Hello);
    }

    #[test]
    fn test_decode_login_results() {
        assert_eq!(
            ServerMessage::decode(r#"{"cmd":"login","res":"success"}"#),
            ServerMessage::Login {
                res: LoginResult::Success
            }
        );
        assert_eq!(
            ServerMessage::decode("login:denied"),
            ServerMessage::Login {
                res: LoginResult::Failure
            }
        );
    }

    #[test]
    fn test_playback_state_mapping() {
        for (wire, expected) in [
            (0u8, PlaybackState::Stopped),
            (1, PlaybackState::Playing),
            (2, PlaybackState::Paused),
        ] {
            let raw = format!(r#"{{"cmd":"playback_state","state":{}}}"#, wire);
            assert_eq!(
                ServerMessage::decode(&raw),
                ServerMessage::PlaybackState { state: expected }
            );
            assert_eq!(PlaybackState::from_wire(wire), Some(expected));
        }
        assert_eq!(PlaybackState::from_wire(3), None);
    }

    #[test]
    fn test_out_of_range_playback_state_is_unknown() {
        let raw = r#"{"cmd":"playback_state","state":7}"#;
        assert_eq!(
            ServerMessage::decode(raw),
            ServerMessage::Unknown(raw.to_string())
        );
        assert_eq!(
            ServerMessage::decode("playback_state:7"),
            ServerMessage::Unknown("playback_state:7".to_string())
        );
    }

    #[test]
    fn test_unrecognized_kept_verbatim() {
        let raw = r#"{"cmd":"frobnicate","x":1}"#;
        assert_eq!(
            ServerMessage::decode(raw),
            ServerMessage::Unknown(raw.to_string())
        );
        assert_eq!(
            ServerMessage::decode("garbage here"),
            ServerMessage::Unknown("garbage here".to_string())
        );
    }

    #[test]
    fn test_plain_trackinfo_keeps_colons_in_album() {
        assert_eq!(
            ServerMessage::decode("trackinfo:Orbital:Halcyon:In Sides: Remastered"),
            ServerMessage::TrackInfo {
                artist: "Orbital".to_string(),
                title: "Halcyon".to_string(),
                album: "In Sides: Remastered".to_string(),
            }
        );
    }

    #[test]
    fn test_plain_playlist_item_title_keeps_colons() {
        assert_eq!(
            ServerMessage::decode("playlist_item:3:Live: Part 2\n"),
            ServerMessage::PlaylistItem {
                position: 3,
                title: "Live: Part 2".to_string(),
            }
        );
    }

    #[test]
    fn test_command_json_shapes() {
        assert_eq!(
            ClientCommand::Pause.encode(WireFormat::Json).unwrap(),
            r#"{"cmd":"pause"}"#
        );
        assert_eq!(
            ClientCommand::Play { item: None }
                .encode(WireFormat::Json)
                .unwrap(),
            r#"{"cmd":"play"}"#
        );
        assert_eq!(
            ClientCommand::PlaylistGetItem { item: 6 }
                .encode(WireFormat::Json)
                .unwrap(),
            r#"{"cmd":"playlist_get_item","item":6}"#
        );
    }

    #[test]
    fn test_command_plain_shapes() {
        assert_eq!(
            ClientCommand::Play { item: Some(5) }
                .encode(WireFormat::Plain)
                .unwrap(),
            "play:5"
        );
        assert_eq!(ClientCommand::Next.encode(WireFormat::Plain).unwrap(), "next");
        assert_eq!(
            ClientCommand::Login {
                password: "hunter2".to_string()
            }
            .encode(WireFormat::Plain)
            .unwrap(),
            "login:hunter2"
        );
    }

    #[test]
    fn test_command_decode_both_formats() {
        assert_eq!(
            ClientCommand::decode(r#"{"cmd":"playlist_get_item","item":9}"#),
            Some(ClientCommand::PlaylistGetItem { item: 9 })
        );
        assert_eq!(
            ClientCommand::decode("playlist_get_item:9"),
            Some(ClientCommand::PlaylistGetItem { item: 9 })
        );
        assert_eq!(ClientCommand::decode("play"), Some(ClientCommand::Play { item: None }));
        assert_eq!(ClientCommand::decode("dance"), None);
    }
}
