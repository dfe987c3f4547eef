use anyhow::{Context, Result};
use async_channel::{Receiver, Sender};
use std::fs;
use std::sync::Arc;
use tracing::{error, info};

use super::config::ListenerConfig;
use super::dispatch::Dispatcher;
use super::message::MailEvent;
use super::watcher::MailboxWatcher;
use crate::services::upload::{FlickrUploader, UploadSink};

/// The watch-and-dispatch loop. Consumes watcher events serially:
/// lifecycle events are log-only, `Message` runs the evaluate pass and
/// re-emits each annotated attachment, `Attachment` runs the dispatch
/// operation to completion.
pub struct MailListener {
    config: ListenerConfig,
    dispatcher: Dispatcher,
    events: Receiver<MailEvent>,
    sender: Sender<MailEvent>,
}

impl MailListener {
    /// Build a listener that uploads to Flickr with the configured
    /// credentials.
    pub fn new(config: ListenerConfig) -> Self {
        let sink = Arc::new(FlickrUploader::new(config.flickr.clone()));
        Self::with_sink(config, sink)
    }

    /// Build a listener with a caller-provided upload transport.
    pub fn with_sink(config: ListenerConfig, sink: Arc<dyn UploadSink>) -> Self {
        let (sender, events) = async_channel::unbounded();
        let dispatcher = Dispatcher::new(sink, config.cleanup, config.on_upload.clone());
        Self {
            config,
            dispatcher,
            events,
            sender,
        }
    }

    /// Watch the mailbox until the process is stopped. All outcomes
    /// surface through the configured callback; individual failures
    /// never end the loop.
    pub async fn run(self) -> Result<()> {
        fs::create_dir_all(&self.config.attachment_dir)
            .context("Failed to create attachment directory")?;

        let watcher = MailboxWatcher::new(
            self.config.imap.clone(),
            self.config.poll_interval,
            self.config.attachment_dir.clone(),
            self.sender.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = watcher.run().await {
                error!("Mailbox watcher stopped: {}", e);
            }
        });

        while let Ok(event) = self.events.recv().await {
            self.handle_event(event).await?;
        }
        Ok(())
    }

    /// Process one event to completion.
    pub async fn handle_event(&self, event: MailEvent) -> Result<()> {
        match event {
            MailEvent::Connected => info!("imap connected"),
            MailEvent::Disconnected => info!("imap disconnected"),
            MailEvent::Message(mut message) => {
                self.config.filter.evaluate(&mut message);
                // Every flag is settled before its attachment event
                // exists, so dispatch never sees an undecided one.
                for attachment in message.attachments {
                    self.sender
                        .send(MailEvent::Attachment(attachment))
                        .await
                        .context("Listener event channel closed")?;
                }
            }
            MailEvent::Attachment(attachment) => self.dispatcher.handle(&attachment).await,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mailbox::config::ImapConfig;
    use crate::services::mailbox::filter::FilterSettings;
    use crate::services::mailbox::message::{Attachment, IncomingMessage};
    use crate::services::upload::{PhotoId, UploadCredentials, UploadError};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    struct NullSink;

    #[async_trait]
    impl UploadSink for NullSink {
        async fn upload(&self, _path: &Path, _title: Option<&str>) -> Result<PhotoId, UploadError> {
            Ok(PhotoId("0".to_string()))
        }
    }

    fn test_config(filter: FilterSettings) -> ListenerConfig {
        ListenerConfig {
            imap: ImapConfig {
                host: "imap.example.com".to_string(),
                port: 993,
                username: "user".to_string(),
                password: "pass".to_string(),
                mailbox: "INBOX".to_string(),
            },
            flickr: UploadCredentials {
                consumer_key: "ck".to_string(),
                consumer_secret: "cs".to_string(),
                oauth_token: "ot".to_string(),
                oauth_token_secret: "os".to_string(),
            },
            filter,
            cleanup: false,
            poll_interval: 60,
            attachment_dir: PathBuf::from("attachments"),
            on_upload: None,
        }
    }

    #[tokio::test]
    async fn test_message_event_requeues_attachments_with_settled_flags() {
        let filter = FilterSettings {
            subjects: Some(vec!["upload".to_string()]),
            ..Default::default()
        };
        let listener = MailListener::with_sink(test_config(filter), Arc::new(NullSink));

        let message = IncomingMessage {
            from: vec!["a@x.com".to_string()],
            subject: "please Upload this".to_string(),
            attachments: vec![
                Attachment::new(
                    PathBuf::from("/tmp/one.jpg"),
                    "one.jpg".to_string(),
                    "image/jpeg".to_string(),
                ),
                Attachment::new(
                    PathBuf::from("/tmp/two.png"),
                    "two.png".to_string(),
                    "image/png".to_string(),
                ),
            ],
        };
        listener
            .handle_event(MailEvent::Message(message))
            .await
            .unwrap();

        let mut seen = 0;
        while let Ok(event) = listener.events.try_recv() {
            match event {
                MailEvent::Attachment(attachment) => {
                    assert!(attachment.should_upload);
                    seen += 1;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn test_lifecycle_events_emit_nothing() {
        let listener = MailListener::with_sink(test_config(FilterSettings::default()), Arc::new(NullSink));

        listener.handle_event(MailEvent::Connected).await.unwrap();
        listener.handle_event(MailEvent::Disconnected).await.unwrap();

        assert!(listener.events.try_recv().is_err());
    }
}
