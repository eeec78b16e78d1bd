use serde_json::{json, Value};

use crate::client::Client;
use crate::error::Result;

use super::params;

/// `core.library.*` methods
pub struct LibraryController<'a> {
    client: &'a Client,
}

impl<'a> LibraryController<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Refs below `uri`, or the backend roots when `None`
    pub async fn browse(&self, uri: Option<&str>) -> Result<Vec<Value>> {
        self.client
            .call_as("core.library.browse", params([("uri", json!(uri))]))
            .await
    }

    /// Search results, one per backend
    ///
    /// `query` maps fields such as `artist` or `any` to lists of values.
    pub async fn search(
        &self,
        query: Value,
        uris: Option<&[&str]>,
        exact: bool,
    ) -> Result<Vec<Value>> {
        self.client
            .call_as(
                "core.library.search",
                params([
                    ("query", query),
                    ("uris", json!(uris)),
                    ("exact", json!(exact)),
                ]),
            )
            .await
    }

    /// Tracks for each of `uris`, keyed by URI
    pub async fn lookup(&self, uris: &[&str]) -> Result<Value> {
        self.client
            .call("core.library.lookup", params([("uris", json!(uris))]))
            .await
    }

    pub async fn refresh(&self, uri: Option<&str>) -> Result<()> {
        self.client
            .call_as("core.library.refresh", params([("uri", json!(uri))]))
            .await
    }

    /// Images for each of `uris`, keyed by URI
    pub async fn get_images(&self, uris: &[&str]) -> Result<Value> {
        self.client
            .call("core.library.get_images", params([("uris", json!(uris))]))
            .await
    }

    /// Distinct values of `field` (e.g. `artist`), optionally filtered by `query`
    pub async fn get_distinct(&self, field: &str, query: Option<Value>) -> Result<Vec<Value>> {
        self.client
            .call_as(
                "core.library.get_distinct",
                params([("field", json!(field)), ("query", json!(query))]),
            )
            .await
    }
}
