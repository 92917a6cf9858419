//! Product image download and normalization.

pub mod download;
pub mod normalize;

pub use download::{HttpImageFetcher, ImageFetcher};
pub use normalize::{normalize, normalize_blocking, CANVAS_SIZE};

use thiserror::Error;

/// Failure while acquiring or normalizing one image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("request failed: {0}")]
    Transport(#[from] wreq::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("image worker failed: {0}")]
    Worker(String),
}
