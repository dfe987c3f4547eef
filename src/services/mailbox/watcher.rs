use anyhow::{Context, Result};
use async_channel::Sender;
use chrono::Local;
use mail_parser::MessageParser;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use super::config::ImapConfig;
use super::imap_service::ImapService;
use super::message::{Attachment, IncomingMessage, MailEvent};
use super::parser::{MailParser, MimePart};
use crate::infrastructure::imap::ImapClient;

/// Polls the mailbox for unseen messages and feeds the listener's
/// event channel. Lifecycle events bracket every poll; `Message`
/// events carry the parsed mail with its attachments already
/// materialized to disk.
pub struct MailboxWatcher {
    imap: ImapConfig,
    poll_interval: u64,
    attachment_dir: PathBuf,
    events: Sender<MailEvent>,
}

impl MailboxWatcher {
    pub fn new(
        imap: ImapConfig,
        poll_interval: u64,
        attachment_dir: PathBuf,
        events: Sender<MailEvent>,
    ) -> Self {
        Self {
            imap,
            poll_interval,
            attachment_dir,
            events,
        }
    }

    pub async fn run(self) -> Result<()> {
        info!(
            "Watching {} on {}:{} every {}s",
            self.imap.mailbox, self.imap.host, self.imap.port, self.poll_interval
        );

        let mut interval = tokio::time::interval(Duration::from_secs(self.poll_interval));
        loop {
            interval.tick().await;

            if let Err(e) = self.poll_once().await {
                error!("Mailbox poll failed: {}", e);
            }
        }
    }

    async fn poll_once(&self) -> Result<()> {
        let mut client = ImapClient::new(
            self.imap.host.clone(),
            self.imap.port,
            self.imap.username.clone(),
            self.imap.password.clone(),
        );
        client.connect().await?;
        self.emit(MailEvent::Connected).await?;

        let result = self.drain_mailbox(&mut client).await;

        client.logout().await?;
        self.emit(MailEvent::Disconnected).await?;
        result
    }

    async fn drain_mailbox(&self, client: &mut ImapClient) -> Result<()> {
        client.select_mailbox(&self.imap.mailbox).await?;

        let uids = client.search_unseen().await?;
        if uids.is_empty() {
            info!("No new unread mail");
            return Ok(());
        }
        info!("Found {} unread mail(s)", uids.len());

        for uid in uids {
            if let Err(e) = self.fetch_and_emit(uid, client).await {
                error!("Failed to process mail UID {}: {}", uid, e);
            }
        }
        Ok(())
    }

    async fn fetch_and_emit(&self, uid: u32, client: &mut ImapClient) -> Result<()> {
        let raw = client
            .fetch_message(uid)
            .await?
            .ok_or_else(|| anyhow::anyhow!("No data returned for mail UID {}", uid))?;

        let parsed = MessageParser::default()
            .parse(&raw)
            .context("Failed to parse mail")?;
        let message = self.build_message(&parsed)?;

        info!(
            "Mail arrived from {:?}, subject {:?}, {} attachment(s)",
            message.from.first(),
            message.subject,
            message.attachments.len()
        );

        client.mark_seen(uid).await?;
        self.emit(MailEvent::Message(message)).await?;
        Ok(())
    }

    fn build_message(&self, parsed: &mail_parser::Message<'_>) -> Result<IncomingMessage> {
        let mut attachments = Vec::new();
        for part in MailParser::attachment_parts(parsed) {
            attachments.push(self.materialize(part)?);
        }

        Ok(IncomingMessage {
            from: MailParser::sender_addresses(parsed),
            subject: MailParser::subject(parsed),
            attachments,
        })
    }

    /// Write one MIME part to the attachment directory under a unique
    /// name, keeping the original filename visible in it.
    fn materialize(&self, part: MimePart) -> Result<Attachment> {
        let unique = format!(
            "{}-{}_{}",
            Local::now().format("%Y%m%d-%H%M%S"),
            Uuid::new_v4().simple(),
            part.filename
        );
        let path = self.attachment_dir.join(unique);

        fs::write(&path, &part.data).context("Failed to write attachment to file")?;
        info!("Attachment saved to {:?}", path);

        Ok(Attachment::new(path, part.filename, part.content_type))
    }

    async fn emit(&self, event: MailEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .context("Listener event channel closed")
    }
}
