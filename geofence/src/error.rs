use thiserror::Error;

use map_model::ElementID;

#[derive(Debug, Error)]
pub enum GeofenceError {
    /// Resolution needs a loaded map and a georeference.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An element a geofence affects isn't in the current map anymore, probably because the map
    /// was replaced. Only that element is skipped.
    #[error("inconsistent map: {0} no longer exists")]
    InconsistentMap(ElementID),

    #[error("couldn't transform geofence points into the map frame: {0:#}")]
    Transform(anyhow::Error),

    #[error("couldn't decode the base map: {0:#}")]
    MapDecode(anyhow::Error),
}
