use std::path::PathBuf;

use thiserror::Error;

/// Failures while bringing assets (panorama images, marker icons, tour files)
/// into the viewer. All of these are recoverable: the renderer keeps its
/// placeholder texture and the shell reports the error in the status bar.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to parse tour file {path}: {source}")]
    TourParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid tour: {0}")]
    TourInvalid(String),
}
