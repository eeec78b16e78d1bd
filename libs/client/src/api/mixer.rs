use serde_json::json;

use crate::client::Client;
use crate::error::Result;

use super::params;

/// `core.mixer.*` methods
pub struct MixerController<'a> {
    client: &'a Client,
}

impl<'a> MixerController<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Volume in percent, `None` if the mixer cannot tell
    pub async fn get_volume(&self) -> Result<Option<u8>> {
        self.client.call_as("core.mixer.get_volume", params([])).await
    }

    /// Returns whether the mixer accepted the change
    pub async fn set_volume(&self, volume: u8) -> Result<bool> {
        self.client
            .call_as("core.mixer.set_volume", params([("volume", json!(volume))]))
            .await
    }

    pub async fn get_mute(&self) -> Result<Option<bool>> {
        self.client.call_as("core.mixer.get_mute", params([])).await
    }

    /// Returns whether the mixer accepted the change
    pub async fn set_mute(&self, mute: bool) -> Result<bool> {
        self.client
            .call_as("core.mixer.set_mute", params([("mute", json!(mute))]))
            .await
    }
}
