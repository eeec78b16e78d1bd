use serde_json::{json, Value};

use crate::client::Client;
use crate::error::Result;

use super::params;

/// `core.playlists.*` methods
pub struct PlaylistsController<'a> {
    client: &'a Client,
}

impl<'a> PlaylistsController<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// URI schemes of backends that provide playlists
    pub async fn get_uri_schemes(&self) -> Result<Vec<String>> {
        self.client
            .call_as("core.playlists.get_uri_schemes", params([]))
            .await
    }

    /// Refs to every available playlist
    pub async fn as_list(&self) -> Result<Vec<Value>> {
        self.client.call_as("core.playlists.as_list", params([])).await
    }

    /// Track refs of the playlist at `uri`, `None` if it does not exist
    pub async fn get_items(&self, uri: &str) -> Result<Option<Vec<Value>>> {
        self.client
            .call_as("core.playlists.get_items", params([("uri", json!(uri))]))
            .await
    }

    pub async fn lookup(&self, uri: &str) -> Result<Option<Value>> {
        self.client
            .call_as("core.playlists.lookup", params([("uri", json!(uri))]))
            .await
    }

    /// Reload playlists, from every backend when `uri_scheme` is `None`
    pub async fn refresh(&self, uri_scheme: Option<&str>) -> Result<()> {
        self.client
            .call_as(
                "core.playlists.refresh",
                params([("uri_scheme", json!(uri_scheme))]),
            )
            .await
    }

    pub async fn create(&self, name: &str, uri_scheme: Option<&str>) -> Result<Option<Value>> {
        self.client
            .call_as(
                "core.playlists.create",
                params([("name", json!(name)), ("uri_scheme", json!(uri_scheme))]),
            )
            .await
    }

    /// Persist `playlist`, returning the stored version
    pub async fn save(&self, playlist: Value) -> Result<Option<Value>> {
        self.client
            .call_as("core.playlists.save", params([("playlist", playlist)]))
            .await
    }

    pub async fn delete(&self, uri: &str) -> Result<bool> {
        self.client
            .call_as("core.playlists.delete", params([("uri", json!(uri))]))
            .await
    }
}
