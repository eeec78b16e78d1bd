use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Closed set of event names the server may announce
///
/// `audio_message` is not part of the core server API; it is emitted by
/// GStreamer plugins such as `spectrum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TrackPlaybackPaused,
    TrackPlaybackResumed,
    TrackPlaybackStarted,
    TrackPlaybackEnded,
    PlaybackStateChanged,
    TracklistChanged,
    PlaylistsLoaded,
    PlaylistChanged,
    PlaylistDeleted,
    OptionsChanged,
    VolumeChanged,
    MuteChanged,
    Seeked,
    StreamTitleChanged,
    AudioMessage,
}

impl EventKind {
    /// Every recognized event, in protocol order
    pub const ALL: [EventKind; 15] = [
        EventKind::TrackPlaybackPaused,
        EventKind::TrackPlaybackResumed,
        EventKind::TrackPlaybackStarted,
        EventKind::TrackPlaybackEnded,
        EventKind::PlaybackStateChanged,
        EventKind::TracklistChanged,
        EventKind::PlaylistsLoaded,
        EventKind::PlaylistChanged,
        EventKind::PlaylistDeleted,
        EventKind::OptionsChanged,
        EventKind::VolumeChanged,
        EventKind::MuteChanged,
        EventKind::Seeked,
        EventKind::StreamTitleChanged,
        EventKind::AudioMessage,
    ];

    /// Wire name of the event
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::TrackPlaybackPaused => "track_playback_paused",
            EventKind::TrackPlaybackResumed => "track_playback_resumed",
            EventKind::TrackPlaybackStarted => "track_playback_started",
            EventKind::TrackPlaybackEnded => "track_playback_ended",
            EventKind::PlaybackStateChanged => "playback_state_changed",
            EventKind::TracklistChanged => "tracklist_changed",
            EventKind::PlaylistsLoaded => "playlists_loaded",
            EventKind::PlaylistChanged => "playlist_changed",
            EventKind::PlaylistDeleted => "playlist_deleted",
            EventKind::OptionsChanged => "options_changed",
            EventKind::VolumeChanged => "volume_changed",
            EventKind::MuteChanged => "mute_changed",
            EventKind::Seeked => "seeked",
            EventKind::StreamTitleChanged => "stream_title_changed",
            EventKind::AudioMessage => "audio_message",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| Error::UnknownEventKind(name.to_string()))
    }
}
