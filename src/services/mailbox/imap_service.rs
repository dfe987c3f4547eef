use anyhow::Result;
use async_imap::types::Mailbox;
use async_trait::async_trait;

/// The mailbox transport the watcher polls through.
#[async_trait]
pub trait ImapService: Send + Sync {
    async fn connect(&mut self) -> Result<()>;
    async fn logout(&mut self) -> Result<()>;
    async fn select_mailbox(&mut self, mailbox: &str) -> Result<Mailbox>;
    async fn search_unseen(&mut self) -> Result<Vec<u32>>;
    /// Fetch the raw RFC822 body of one message, if the server returns one.
    async fn fetch_message(&mut self, uid: u32) -> Result<Option<Vec<u8>>>;
    async fn mark_seen(&mut self, uid: u32) -> Result<()>;
}
