//! Typed facades over the Mopidy core API.
//!
//! Each controller only builds the method name and its named parameters;
//! everything goes through [`Client::call`].

use encore_fabric::message::Params;
use serde_json::Value;

use crate::client::Client;

pub mod core;
pub mod history;
pub mod library;
pub mod mixer;
pub mod playback;
pub mod playlists;
pub mod tracklist;

pub use self::core::CoreController;
pub use self::history::HistoryController;
pub use self::library::LibraryController;
pub use self::mixer::MixerController;
pub use self::playback::{PlaybackController, PlaybackState};
pub use self::playlists::PlaylistsController;
pub use self::tracklist::TracklistController;

/// Build a params object, leaving out `null` values so the server applies
/// its own defaults.
fn params<const N: usize>(fields: [(&str, Value); N]) -> Params {
    fields
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

impl Client {
    pub fn core(&self) -> CoreController<'_> {
        CoreController::new(self)
    }

    pub fn playback(&self) -> PlaybackController<'_> {
        PlaybackController::new(self)
    }

    pub fn mixer(&self) -> MixerController<'_> {
        MixerController::new(self)
    }

    pub fn tracklist(&self) -> TracklistController<'_> {
        TracklistController::new(self)
    }

    pub fn playlists(&self) -> PlaylistsController<'_> {
        PlaylistsController::new(self)
    }

    pub fn library(&self) -> LibraryController<'_> {
        LibraryController::new(self)
    }

    pub fn history(&self) -> HistoryController<'_> {
        HistoryController::new(self)
    }
}
