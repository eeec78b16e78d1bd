use serde_json::Value;

use crate::client::Client;
use crate::error::Result;

use super::params;

/// `core.history.*` methods
pub struct HistoryController<'a> {
    client: &'a Client,
}

impl<'a> HistoryController<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `[timestamp, ref]` pairs, most recent first
    pub async fn get_history(&self) -> Result<Vec<Value>> {
        self.client.call_as("core.history.get_history", params([])).await
    }

    pub async fn get_length(&self) -> Result<u32> {
        self.client.call_as("core.history.get_length", params([])).await
    }
}
