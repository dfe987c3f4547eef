use std::path::PathBuf;

/// A MIME part materialized to local storage.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Where the part was written on the local filesystem.
    pub path: PathBuf,
    /// Original filename from the MIME headers.
    pub filename: String,
    pub content_type: String,
    /// Settled during message evaluation, read when the attachment is
    /// dispatched. Defaults to false.
    pub should_upload: bool,
}

impl Attachment {
    pub fn new(path: PathBuf, filename: String, content_type: String) -> Self {
        Self {
            path,
            filename,
            content_type,
            should_upload: false,
        }
    }
}

/// One arrived mail, parsed and with its attachments on disk.
#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    /// Sender addresses in header order. Filtering only looks at the first.
    pub from: Vec<String>,
    pub subject: String,
    pub attachments: Vec<Attachment>,
}

/// Events delivered serially to the listener loop.
///
/// `Connected`, `Disconnected` and `Message` come from the mailbox
/// watcher. `Attachment` events are emitted by the listener itself,
/// after the evaluate pass has settled every `should_upload` flag, so
/// an attachment event can never carry an undecided flag.
#[derive(Debug)]
pub enum MailEvent {
    Connected,
    Disconnected,
    Message(IncomingMessage),
    Attachment(Attachment),
}
