use std::fs;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::message::Attachment;
use crate::services::upload::{PhotoId, UploadError, UploadSink};

/// Completion callback invoked once per attempted upload.
pub type UploadCallback = Arc<dyn Fn(Result<PhotoId, UploadError>) + Send + Sync>;

/// The dispatch stage: takes annotated attachments, uploads the ones
/// that qualify, and performs the post-upload side effects.
pub struct Dispatcher {
    sink: Arc<dyn UploadSink>,
    cleanup: bool,
    on_upload: Option<UploadCallback>,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn UploadSink>, cleanup: bool, on_upload: Option<UploadCallback>) -> Self {
        Self {
            sink,
            cleanup,
            on_upload,
        }
    }

    /// Handle one attachment. Only image attachments whose flag was
    /// settled to true during message evaluation are uploaded; anything
    /// else is a no-op.
    ///
    /// Upload failures are reported once through the callback and
    /// otherwise swallowed, so one bad upload never stops the listener.
    pub async fn handle(&self, attachment: &Attachment) {
        if !attachment.should_upload || !attachment.content_type.contains("image") {
            debug!(
                "Skipping attachment {} ({})",
                attachment.filename, attachment.content_type
            );
            return;
        }

        info!("Uploading {}", attachment.path.display());
        let result = self
            .sink
            .upload(&attachment.path, Some(&attachment.filename))
            .await;

        match &result {
            Ok(photo_id) => {
                info!(
                    "Done uploading {} (photo id {})",
                    attachment.path.display(),
                    photo_id
                );
                if self.cleanup {
                    match fs::remove_file(&attachment.path) {
                        Ok(()) => info!("Deleted {}", attachment.path.display()),
                        Err(e) => warn!("Failed to delete {}: {}", attachment.path.display(), e),
                    }
                }
            }
            Err(e) => error!("Upload of {} failed: {}", attachment.path.display(), e),
        }

        if let Some(callback) = &self.on_upload {
            callback(result);
        }
    }
}
