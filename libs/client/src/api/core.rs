use serde_json::Value;

use crate::client::Client;
use crate::error::Result;

use super::params;

/// `core.*` methods
pub struct CoreController<'a> {
    client: &'a Client,
}

impl<'a> CoreController<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Server version string
    pub async fn get_version(&self) -> Result<String> {
        self.client.call_as("core.get_version", params([])).await
    }

    /// URI schemes handled by the enabled backends
    pub async fn get_uri_schemes(&self) -> Result<Vec<String>> {
        self.client.call_as("core.get_uri_schemes", params([])).await
    }

    /// Machine-readable description of every remote method
    pub async fn describe(&self) -> Result<Value> {
        self.client.call("core.describe", params([])).await
    }
}
