pub mod flickr;
pub mod oauth;

pub use flickr::FlickrUploader;

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// OAuth 1.0a credential set for the photo service.
///
/// Consumer key/secret identify the registered application, the token
/// pair authorizes the target account.
#[derive(Clone)]
pub struct UploadCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub oauth_token: String,
    pub oauth_token_secret: String,
}

impl fmt::Debug for UploadCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("oauth_token", &self.oauth_token)
            .field("oauth_token_secret", &"<redacted>")
            .finish()
    }
}

/// Remote identifier the photo service assigns to an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoId(pub String);

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("photo service rejected the upload (code {code}): {message}")]
    Rejected { code: u32, message: String },

    #[error("unrecognized photo service response: {0}")]
    MalformedResponse(String),
}

/// Transport that pushes a local file to the remote photo service.
///
/// Implementations hold their own credentials; the listener core only
/// sees this seam.
#[async_trait]
pub trait UploadSink: Send + Sync {
    /// Upload the file at `path`, returning the remote photo id.
    /// `title` is optional display metadata.
    async fn upload(&self, path: &Path, title: Option<&str>) -> Result<PhotoId, UploadError>;
}
