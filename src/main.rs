mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use mailpix::infrastructure::logging::init_logging;
use mailpix::services::mailbox::{ListenerConfig, MailListener};
use mailpix::services::upload::FlickrUploader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("mailpix")?;

    let cli = Cli::parse();
    let mut config = ListenerConfig::from_env()?;
    if let Some(mailbox) = cli.mailbox {
        config.imap.mailbox = mailbox;
    }
    if let Some(poll_interval) = cli.poll_interval {
        config.poll_interval = poll_interval;
    }
    if cli.cleanup {
        config.cleanup = true;
    }

    info!("Starting mailpix");
    info!("IMAP server: {}:{}", config.imap.host, config.imap.port);
    info!("Watching mailbox: {}", config.imap.mailbox);
    info!("Poll interval: {} seconds", config.poll_interval);
    info!("Attachment directory: {:?}", config.attachment_dir);

    if !cli.no_verify {
        let uploader = FlickrUploader::new(config.flickr.clone());
        let username = uploader.verify_credentials().await?;
        info!("Authenticated to photo service as {}", username);
    }

    let listener = MailListener::new(config);
    listener.run().await
}
