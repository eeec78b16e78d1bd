use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::Client;
use crate::error::Result;

use super::params;

/// Player state as reported by `core.playback.get_state`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
        })
    }
}

/// `core.playback.*` methods
pub struct PlaybackController<'a> {
    client: &'a Client,
}

impl<'a> PlaybackController<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Play the tracklist entry `tlid`, or the current/first entry when `None`
    pub async fn play(&self, tlid: Option<u64>) -> Result<()> {
        self.client
            .call_as("core.playback.play", params([("tlid", json!(tlid))]))
            .await
    }

    pub async fn next(&self) -> Result<()> {
        self.client.call_as("core.playback.next", params([])).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.client.call_as("core.playback.previous", params([])).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.client.call_as("core.playback.stop", params([])).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.client.call_as("core.playback.pause", params([])).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.client.call_as("core.playback.resume", params([])).await
    }

    /// Jump to `time_position` milliseconds; `false` if the seek was refused
    pub async fn seek(&self, time_position: u64) -> Result<bool> {
        self.client
            .call_as(
                "core.playback.seek",
                params([("time_position", json!(time_position))]),
            )
            .await
    }

    pub async fn get_state(&self) -> Result<PlaybackState> {
        self.client.call_as("core.playback.get_state", params([])).await
    }

    pub async fn set_state(&self, new_state: PlaybackState) -> Result<()> {
        self.client
            .call_as(
                "core.playback.set_state",
                params([("new_state", json!(new_state))]),
            )
            .await
    }

    pub async fn get_current_tl_track(&self) -> Result<Option<Value>> {
        self.client
            .call_as("core.playback.get_current_tl_track", params([]))
            .await
    }

    pub async fn get_current_track(&self) -> Result<Option<Value>> {
        self.client
            .call_as("core.playback.get_current_track", params([]))
            .await
    }

    pub async fn get_current_tlid(&self) -> Result<Option<u64>> {
        self.client
            .call_as("core.playback.get_current_tlid", params([]))
            .await
    }

    pub async fn get_stream_title(&self) -> Result<Option<String>> {
        self.client
            .call_as("core.playback.get_stream_title", params([]))
            .await
    }

    /// Position in the current track, in milliseconds
    pub async fn get_time_position(&self) -> Result<u64> {
        self.client
            .call_as("core.playback.get_time_position", params([]))
            .await
    }
}
