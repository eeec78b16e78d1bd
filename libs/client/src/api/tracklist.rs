use serde_json::{json, Value};

use crate::client::Client;
use crate::error::Result;

use super::params;

/// `core.tracklist.*` methods
///
/// Tracks and tracklist entries are returned as raw JSON model objects.
pub struct TracklistController<'a> {
    client: &'a Client,
}

impl<'a> TracklistController<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Queue `uris`, at the end unless `at_position` is given
    pub async fn add(&self, uris: &[&str], at_position: Option<u32>) -> Result<Vec<Value>> {
        self.client
            .call_as(
                "core.tracklist.add",
                params([("uris", json!(uris)), ("at_position", json!(at_position))]),
            )
            .await
    }

    /// Remove entries matching `criteria`, e.g. `{"tlid": [3, 4]}`
    pub async fn remove(&self, criteria: Value) -> Result<Vec<Value>> {
        self.client
            .call_as("core.tracklist.remove", params([("criteria", criteria)]))
            .await
    }

    pub async fn clear(&self) -> Result<()> {
        self.client.call_as("core.tracklist.clear", params([])).await
    }

    /// Move entries `start..end` so they begin at `to_position`
    pub async fn move_tracks(&self, start: u32, end: u32, to_position: u32) -> Result<()> {
        self.client
            .call_as(
                "core.tracklist.move",
                params([
                    ("start", json!(start)),
                    ("end", json!(end)),
                    ("to_position", json!(to_position)),
                ]),
            )
            .await
    }

    pub async fn shuffle(&self, start: Option<u32>, end: Option<u32>) -> Result<()> {
        self.client
            .call_as(
                "core.tracklist.shuffle",
                params([("start", json!(start)), ("end", json!(end))]),
            )
            .await
    }

    pub async fn get_tl_tracks(&self) -> Result<Vec<Value>> {
        self.client
            .call_as("core.tracklist.get_tl_tracks", params([]))
            .await
    }

    pub async fn get_tracks(&self) -> Result<Vec<Value>> {
        self.client.call_as("core.tracklist.get_tracks", params([])).await
    }

    pub async fn get_length(&self) -> Result<u32> {
        self.client.call_as("core.tracklist.get_length", params([])).await
    }

    /// Counter bumped on every tracklist change
    pub async fn get_version(&self) -> Result<u64> {
        self.client.call_as("core.tracklist.get_version", params([])).await
    }

    /// Position of entry `tlid`, or of the current entry when `None`
    pub async fn index(&self, tlid: Option<u64>) -> Result<Option<u32>> {
        self.client
            .call_as("core.tracklist.index", params([("tlid", json!(tlid))]))
            .await
    }

    pub async fn slice(&self, start: u32, end: u32) -> Result<Vec<Value>> {
        self.client
            .call_as(
                "core.tracklist.slice",
                params([("start", json!(start)), ("end", json!(end))]),
            )
            .await
    }

    pub async fn filter(&self, criteria: Value) -> Result<Vec<Value>> {
        self.client
            .call_as("core.tracklist.filter", params([("criteria", criteria)]))
            .await
    }

    /// Entry played after the current one ends on its own
    pub async fn get_eot_tlid(&self) -> Result<Option<u64>> {
        self.client
            .call_as("core.tracklist.get_eot_tlid", params([]))
            .await
    }

    pub async fn get_next_tlid(&self) -> Result<Option<u64>> {
        self.client
            .call_as("core.tracklist.get_next_tlid", params([]))
            .await
    }

    pub async fn get_previous_tlid(&self) -> Result<Option<u64>> {
        self.client
            .call_as("core.tracklist.get_previous_tlid", params([]))
            .await
    }

    pub async fn get_consume(&self) -> Result<bool> {
        self.client.call_as("core.tracklist.get_consume", params([])).await
    }

    pub async fn set_consume(&self, value: bool) -> Result<()> {
        self.set_option("core.tracklist.set_consume", value).await
    }

    pub async fn get_random(&self) -> Result<bool> {
        self.client.call_as("core.tracklist.get_random", params([])).await
    }

    pub async fn set_random(&self, value: bool) -> Result<()> {
        self.set_option("core.tracklist.set_random", value).await
    }

    pub async fn get_repeat(&self) -> Result<bool> {
        self.client.call_as("core.tracklist.get_repeat", params([])).await
    }

    pub async fn set_repeat(&self, value: bool) -> Result<()> {
        self.set_option("core.tracklist.set_repeat", value).await
    }

    pub async fn get_single(&self) -> Result<bool> {
        self.client.call_as("core.tracklist.get_single", params([])).await
    }

    pub async fn set_single(&self, value: bool) -> Result<()> {
        self.set_option("core.tracklist.set_single", value).await
    }

    async fn set_option(&self, method: &str, value: bool) -> Result<()> {
        self.client
            .call_as(method, params([("value", json!(value))]))
            .await
    }
}
