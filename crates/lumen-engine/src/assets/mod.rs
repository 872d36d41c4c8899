//! Deferred texture sources.
//!
//! A source hands out a receiver per request; the session polls it between
//! frames, so completions never run during a draw.

mod file;
mod manual;

use std::sync::mpsc;

use crate::backend::Image;

pub use file::FileAssetSource;
pub use manual::ManualAssetSource;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load asset `{id}`: {message}")]
pub struct AssetError {
    pub id: String,
    pub message: String,
}

impl AssetError {
    pub fn new(id: &str, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            message: message.into(),
        }
    }
}

pub type AssetResult = Result<Image, AssetError>;

/// Produces decoded RGBA8 images by id.
///
/// The returned receiver yields at most one result. A source may also never
/// answer; the caller keeps its placeholder in that case.
pub trait AssetSource {
    fn request(&self, id: &str) -> mpsc::Receiver<AssetResult>;
}
